//! # In-Memory Store
//!
//! Process-local tables behind one async `RwLock`. Reads share the lock, every write takes it
//! exclusively, so a review write and the rating rebuild it triggers are never observed apart.
use std::collections::BTreeMap;

use async_trait::async_trait;
use catalog::{
    Book, BookPage, BookQuery, BookReview, BookWithReviews, Entity, GenreCount, NewBook,
    NewReview, NewUser, RatingSummary, Review, ReviewUpdate, ReviewWithUser, User, UserUpdate,
    query, reviews::sort_newest_first,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    sample::Sample,
    store::{Store, StoreError},
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<u32, User>,
    books: BTreeMap<u32, Book>,
    reviews: BTreeMap<u32, Review>,
    last_user_id: u32,
    last_book_id: u32,
    last_review_id: u32,
}

fn next_id(last: &mut u32) -> u32 {
    *last += 1;
    *last
}

impl Tables {
    fn user(&self, id: u32) -> Result<&User, StoreError> {
        self.users.get(&id).ok_or(StoreError::NotFound(Entity::User))
    }

    fn book(&self, id: u32) -> Result<&Book, StoreError> {
        self.books.get(&id).ok_or(StoreError::NotFound(Entity::Book))
    }

    fn review(&self, id: u32) -> Result<&Review, StoreError> {
        self.reviews
            .get(&id)
            .ok_or(StoreError::NotFound(Entity::Review))
    }

    fn identity_taken(&self, username: &str, email: &str, except: Option<u32>) -> bool {
        self.users.values().any(|user| {
            Some(user.id) != except && (user.username == username || user.email == email)
        })
    }

    fn refresh_rating(&mut self, book_id: u32) {
        let summary = RatingSummary::from_ratings(
            self.reviews
                .values()
                .filter(|review| review.book_id == book_id)
                .map(|review| review.rating),
        );

        if let Some(book) = self.books.get_mut(&book_id) {
            debug!(
                book_id,
                average = summary.average_rating,
                total = summary.total_reviews,
                "Rating refreshed"
            );
            book.apply_rating(summary);
        }
    }

    fn joined<'a, I>(&self, reviews: I) -> Vec<ReviewWithUser>
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let mut reviews: Vec<Review> = reviews.into_iter().cloned().collect();
        sort_newest_first(&mut reviews);

        reviews
            .into_iter()
            .map(|review| {
                let user = self.users.get(&review.user_id);
                let book = self.books.get(&review.book_id);
                ReviewWithUser::join(review, user, book)
            })
            .collect()
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn with_sample(sample: Sample) -> Self {
        let mut tables = Tables::default();

        for user in sample.users {
            tables.last_user_id = tables.last_user_id.max(user.id);
            tables.users.insert(user.id, user);
        }
        for book in sample.books {
            tables.last_book_id = tables.last_book_id.max(book.id);
            tables.books.insert(book.id, book);
        }
        for review in sample.reviews {
            tables.last_review_id = tables.last_review_id.max(review.id);
            tables.reviews.insert(review.id, review);
        }

        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_user(&self, id: u32) -> Result<User, StoreError> {
        self.tables.read().await.user(id).cloned()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.identity_taken(&user.username, &user.email, None) {
            return Err(StoreError::Duplicate);
        }

        let user = user.into_user(next_id(&mut tables.last_user_id), Utc::now());
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_user(&self, id: u32, update: UserUpdate) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        let mut user = tables.user(id)?.clone();
        update.apply(&mut user);

        if tables.identity_taken(&user.username, &user.email, Some(id)) {
            return Err(StoreError::Duplicate);
        }

        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn get_book(&self, id: u32) -> Result<Book, StoreError> {
        self.tables.read().await.book(id).cloned()
    }

    async fn book_with_reviews(&self, id: u32) -> Result<BookWithReviews, StoreError> {
        let tables = self.tables.read().await;
        let book = tables.book(id)?.clone();

        let reviews = tables
            .joined(tables.reviews.values().filter(|review| review.book_id == id))
            .into_iter()
            .map(|joined| BookReview {
                review: joined.review,
                user: joined.user,
            })
            .collect();

        Ok(BookWithReviews { book, reviews })
    }

    async fn list_books(&self, query: &BookQuery) -> Result<BookPage, StoreError> {
        Ok(query::list_books(
            self.tables.read().await.books.values(),
            query,
        ))
    }

    async fn featured_books(&self) -> Result<Vec<Book>, StoreError> {
        Ok(query::featured_books(self.tables.read().await.books.values()))
    }

    async fn create_book(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut tables = self.tables.write().await;

        let book = book.into_book(next_id(&mut tables.last_book_id), Utc::now());
        tables.books.insert(book.id, book.clone());

        Ok(book)
    }

    async fn genres(&self) -> Result<Vec<GenreCount>, StoreError> {
        Ok(query::genre_counts(self.tables.read().await.books.values()))
    }

    async fn get_review(&self, id: u32) -> Result<Review, StoreError> {
        self.tables.read().await.review(id).cloned()
    }

    async fn reviews_for_book(&self, book_id: u32) -> Result<Vec<ReviewWithUser>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables.joined(
            tables
                .reviews
                .values()
                .filter(|review| review.book_id == book_id),
        ))
    }

    async fn reviews_by_user(&self, user_id: u32) -> Result<Vec<ReviewWithUser>, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables.joined(
            tables
                .reviews
                .values()
                .filter(|review| review.user_id == user_id),
        ))
    }

    async fn recent_reviews(&self, limit: usize) -> Result<Vec<ReviewWithUser>, StoreError> {
        let tables = self.tables.read().await;

        let mut recent = tables.joined(tables.reviews.values());
        recent.truncate(limit);

        Ok(recent)
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;

        tables.book(review.book_id)?;
        tables.user(review.user_id)?;

        let review = review.into_review(next_id(&mut tables.last_review_id), Utc::now());
        tables.reviews.insert(review.id, review.clone());
        tables.refresh_rating(review.book_id);

        Ok(review)
    }

    async fn update_review(&self, id: u32, update: ReviewUpdate) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;

        let mut review = tables.review(id)?.clone();
        let previous_book = review.book_id;
        update.apply(&mut review);

        tables.book(review.book_id)?;
        tables.user(review.user_id)?;

        tables.reviews.insert(id, review.clone());
        tables.refresh_rating(review.book_id);
        if previous_book != review.book_id {
            tables.refresh_rating(previous_book);
        }

        Ok(review)
    }

    async fn delete_review(&self, id: u32) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let review = tables
            .reviews
            .remove(&id)
            .ok_or(StoreError::NotFound(Entity::Review))?;
        tables.refresh_rating(review.book_id);

        Ok(())
    }

    async fn like_review(&self, id: u32) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;

        let review = tables
            .reviews
            .get_mut(&id)
            .ok_or(StoreError::NotFound(Entity::Review))?;
        review.likes += 1;

        Ok(review.clone())
    }
}
