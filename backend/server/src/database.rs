//! # Redis
//!
//! Persistent backend for the catalog.
//!
//! ## Layout
//!
//! - `users`, `books`, `reviews`: Redis hash per record kind, id to JSON record
//! - `sequences`: one counter per record kind, `HINCRBY` hands out the next id
//! - `usernames`, `emails`: identity to user id, used for uniqueness checks
//! - `book_reviews:{id}`, `user_reviews:{id}`: sets of review ids per book and per author
//! - `review_likes`: review id to **likes** int, bumped with atomic `HINCRBY`
//!
//! The `likes` value inside a stored review JSON is never read back, `review_likes` is the only
//! source for it.
//!
//! ## Writes
//!
//! - Mutations take an in-process mutex, then apply their record changes in one `MULTI` pipeline
//! - Review writes rebuild the touched books' aggregates from their `book_reviews` set and queue
//!   them into the same `MULTI`, so readers never see a review without its aggregate
//! - Catalog listings load the `books` hash with `HVALS` and filter in process
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use catalog::{
    Book, BookPage, BookQuery, BookReview, BookWithReviews, Entity, GenreCount, NewBook,
    NewReview, NewUser, RatingSummary, Review, ReviewUpdate, ReviewWithUser, User, UserUpdate,
    query, reviews::sort_newest_first,
};
use chrono::Utc;
use redis::{
    AsyncCommands, Client, Pipeline, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::debug;

use crate::store::{Store, StoreError};

pub const USERS: &str = "users";
pub const BOOKS: &str = "books";
pub const REVIEWS: &str = "reviews";
pub const SEQUENCES: &str = "sequences";
pub const USERNAMES: &str = "usernames";
pub const EMAILS: &str = "emails";
pub const REVIEW_LIKES: &str = "review_likes";

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;

    client.get_connection_manager_with_config(config).await
}

pub fn book_reviews_key(book_id: u32) -> String {
    format!("book_reviews:{book_id}")
}

pub fn user_reviews_key(user_id: u32) -> String {
    format!("user_reviews:{user_id}")
}

/// Whether an identity index entry belongs to someone other than `except`.
fn claimed_by_other(owner: Option<u32>, except: Option<u32>) -> bool {
    owner.is_some_and(|owner| Some(owner) != except)
}

fn decode_all<T: DeserializeOwned>(raw: Vec<Option<String>>) -> Result<Vec<T>, StoreError> {
    raw.into_iter()
        .flatten()
        .map(|json| serde_json::from_str(&json).map_err(StoreError::from))
        .collect()
}

async fn fetch<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    key: &str,
    id: u32,
    entity: Entity,
) -> Result<T, StoreError> {
    let raw: Option<String> = conn.hget(key, id).await?;
    let raw = raw.ok_or(StoreError::NotFound(entity))?;

    Ok(serde_json::from_str(&raw)?)
}

/// Records for `ids` in the same order, skipping ids with no record.
async fn fetch_many<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    key: &str,
    ids: &[u32],
) -> Result<Vec<T>, StoreError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let raw: Vec<Option<String>> = redis::cmd("HMGET")
        .arg(key)
        .arg(ids)
        .query_async(conn)
        .await?;

    decode_all(raw)
}

async fn fetch_all<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    let raw: Vec<String> = conn.hvals(key).await?;

    decode_all(raw.into_iter().map(Some).collect())
}

async fn exists(
    conn: &mut ConnectionManager,
    key: &str,
    id: u32,
    entity: Entity,
) -> Result<(), StoreError> {
    let found: bool = conn.hexists(key, id).await?;

    if found {
        Ok(())
    } else {
        Err(StoreError::NotFound(entity))
    }
}

fn encode<T: Serialize>(record: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(record)?)
}

async fn next_id(conn: &mut ConnectionManager, kind: &str) -> Result<u32, StoreError> {
    Ok(conn.hincr(SEQUENCES, kind, 1).await?)
}

async fn with_likes(
    conn: &mut ConnectionManager,
    mut reviews: Vec<Review>,
) -> Result<Vec<Review>, StoreError> {
    if reviews.is_empty() {
        return Ok(reviews);
    }

    let ids: Vec<u32> = reviews.iter().map(|review| review.id).collect();
    let likes: Vec<Option<u32>> = redis::cmd("HMGET")
        .arg(REVIEW_LIKES)
        .arg(&ids)
        .query_async(conn)
        .await?;

    for (review, likes) in reviews.iter_mut().zip(likes) {
        review.likes = likes.unwrap_or(0);
    }

    Ok(reviews)
}

async fn review(conn: &mut ConnectionManager, id: u32) -> Result<Review, StoreError> {
    let review = fetch(conn, REVIEWS, id, Entity::Review).await?;
    let mut reviews = with_likes(conn, vec![review]).await?;

    reviews.pop().ok_or(StoreError::NotFound(Entity::Review))
}

/// Reviews indexed under `set_key`, without like counts.
async fn indexed_reviews(
    conn: &mut ConnectionManager,
    set_key: &str,
) -> Result<Vec<Review>, StoreError> {
    let ids: Vec<u32> = conn.smembers(set_key).await?;

    fetch_many(conn, REVIEWS, &ids).await
}

/// Attaches author and book summaries, keeping the order of `reviews`.
async fn join(
    conn: &mut ConnectionManager,
    reviews: Vec<Review>,
) -> Result<Vec<ReviewWithUser>, StoreError> {
    let mut user_ids: Vec<u32> = reviews.iter().map(|review| review.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let mut book_ids: Vec<u32> = reviews.iter().map(|review| review.book_id).collect();
    book_ids.sort_unstable();
    book_ids.dedup();

    let users: HashMap<u32, User> = fetch_many::<User>(conn, USERS, &user_ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let books: HashMap<u32, Book> = fetch_many::<Book>(conn, BOOKS, &book_ids)
        .await?
        .into_iter()
        .map(|book| (book.id, book))
        .collect();

    Ok(reviews
        .into_iter()
        .map(|review| {
            let user = users.get(&review.user_id);
            let book = books.get(&review.book_id);
            ReviewWithUser::join(review, user, book)
        })
        .collect())
}

async fn listing(
    conn: &mut ConnectionManager,
    set_key: &str,
) -> Result<Vec<ReviewWithUser>, StoreError> {
    let mut reviews = indexed_reviews(conn, set_key).await?;
    sort_newest_first(&mut reviews);
    let reviews = with_likes(conn, reviews).await?;

    join(conn, reviews).await
}

/// Aggregate of `stored` once review `id` is replaced by `replacement`, or dropped for `None`.
fn summary_after(stored: &[Review], id: u32, replacement: Option<&Review>) -> RatingSummary {
    RatingSummary::from_ratings(
        stored
            .iter()
            .filter(|review| review.id != id)
            .chain(replacement)
            .map(|review| review.rating),
    )
}

/// `book_id` with the aggregate it will have after the pending write to review `id`.
/// `None` when the book record is gone.
async fn rerated_book(
    conn: &mut ConnectionManager,
    book_id: u32,
    id: u32,
    replacement: Option<&Review>,
) -> Result<Option<Book>, StoreError> {
    let stored = indexed_reviews(conn, &book_reviews_key(book_id)).await?;
    let summary = summary_after(&stored, id, replacement);

    let mut book: Book = match fetch(conn, BOOKS, book_id, Entity::Book).await {
        Ok(book) => book,
        Err(StoreError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    book.apply_rating(summary);

    debug!(
        book_id,
        average = summary.average_rating,
        total = summary.total_reviews,
        "Rating rebuilt"
    );

    Ok(Some(book))
}

/// Queues the rebuilt books into the write's `MULTI` so records and aggregates land together.
fn stage_books<I>(pipe: &mut Pipeline, books: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = Option<Book>>,
{
    for book in books.into_iter().flatten() {
        pipe.hset(BOOKS, book.id, encode(&book)?).ignore();
    }

    Ok(())
}

async fn identity_taken(
    conn: &mut ConnectionManager,
    username: &str,
    email: &str,
    except: Option<u32>,
) -> Result<bool, StoreError> {
    let username_owner: Option<u32> = conn.hget(USERNAMES, username).await?;
    let email_owner: Option<u32> = conn.hget(EMAILS, email).await?;

    Ok(claimed_by_other(username_owner, except) || claimed_by_other(email_owner, except))
}

pub struct RedisStore {
    connection: ConnectionManager,
    writes: Mutex<()>,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            writes: Mutex::new(()),
        }
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl Store for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get_user(&self, id: u32) -> Result<User, StoreError> {
        fetch(&mut self.conn(), USERS, id, Entity::User).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        if identity_taken(&mut conn, &user.username, &user.email, None).await? {
            return Err(StoreError::Duplicate);
        }

        let user = user.into_user(next_id(&mut conn, USERS).await?, Utc::now());

        let () = redis::pipe()
            .atomic()
            .hset(USERS, user.id, encode(&user)?)
            .ignore()
            .hset(USERNAMES, &user.username, user.id)
            .ignore()
            .hset(EMAILS, &user.email, user.id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, id: u32, update: UserUpdate) -> Result<User, StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        let previous: User = fetch(&mut conn, USERS, id, Entity::User).await?;
        let mut user = previous.clone();
        update.apply(&mut user);

        if identity_taken(&mut conn, &user.username, &user.email, Some(id)).await? {
            return Err(StoreError::Duplicate);
        }

        let mut pipe = redis::pipe();
        pipe.atomic().hset(USERS, id, encode(&user)?).ignore();
        if previous.username != user.username {
            pipe.hdel(USERNAMES, &previous.username)
                .ignore()
                .hset(USERNAMES, &user.username, id)
                .ignore();
        }
        if previous.email != user.email {
            pipe.hdel(EMAILS, &previous.email)
                .ignore()
                .hset(EMAILS, &user.email, id)
                .ignore();
        }
        let () = pipe.query_async(&mut conn).await?;

        Ok(user)
    }

    async fn get_book(&self, id: u32) -> Result<Book, StoreError> {
        fetch(&mut self.conn(), BOOKS, id, Entity::Book).await
    }

    async fn book_with_reviews(&self, id: u32) -> Result<BookWithReviews, StoreError> {
        let mut conn = self.conn();

        let book = fetch(&mut conn, BOOKS, id, Entity::Book).await?;
        let reviews = listing(&mut conn, &book_reviews_key(id))
            .await?
            .into_iter()
            .map(|joined| BookReview {
                review: joined.review,
                user: joined.user,
            })
            .collect();

        Ok(BookWithReviews { book, reviews })
    }

    async fn list_books(&self, query: &BookQuery) -> Result<BookPage, StoreError> {
        let books: Vec<Book> = fetch_all(&mut self.conn(), BOOKS).await?;

        Ok(query::list_books(&books, query))
    }

    async fn featured_books(&self) -> Result<Vec<Book>, StoreError> {
        let books: Vec<Book> = fetch_all(&mut self.conn(), BOOKS).await?;

        Ok(query::featured_books(&books))
    }

    async fn create_book(&self, book: NewBook) -> Result<Book, StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        let book = book.into_book(next_id(&mut conn, BOOKS).await?, Utc::now());
        let () = conn.hset(BOOKS, book.id, encode(&book)?).await?;

        Ok(book)
    }

    async fn genres(&self) -> Result<Vec<GenreCount>, StoreError> {
        let books: Vec<Book> = fetch_all(&mut self.conn(), BOOKS).await?;

        Ok(query::genre_counts(&books))
    }

    async fn get_review(&self, id: u32) -> Result<Review, StoreError> {
        review(&mut self.conn(), id).await
    }

    async fn reviews_for_book(&self, book_id: u32) -> Result<Vec<ReviewWithUser>, StoreError> {
        listing(&mut self.conn(), &book_reviews_key(book_id)).await
    }

    async fn reviews_by_user(&self, user_id: u32) -> Result<Vec<ReviewWithUser>, StoreError> {
        listing(&mut self.conn(), &user_reviews_key(user_id)).await
    }

    async fn recent_reviews(&self, limit: usize) -> Result<Vec<ReviewWithUser>, StoreError> {
        let mut conn = self.conn();

        let mut reviews: Vec<Review> = fetch_all(&mut conn, REVIEWS).await?;
        sort_newest_first(&mut reviews);
        reviews.truncate(limit);
        let reviews = with_likes(&mut conn, reviews).await?;

        join(&mut conn, reviews).await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        exists(&mut conn, BOOKS, review.book_id, Entity::Book).await?;
        exists(&mut conn, USERS, review.user_id, Entity::User).await?;

        let review = review.into_review(next_id(&mut conn, REVIEWS).await?, Utc::now());
        let book = rerated_book(&mut conn, review.book_id, review.id, Some(&review)).await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .hset(REVIEWS, review.id, encode(&review)?)
            .ignore()
            .sadd(book_reviews_key(review.book_id), review.id)
            .ignore()
            .sadd(user_reviews_key(review.user_id), review.id)
            .ignore();
        stage_books(&mut pipe, [book])?;
        let () = pipe.query_async(&mut conn).await?;

        Ok(review)
    }

    async fn update_review(&self, id: u32, update: ReviewUpdate) -> Result<Review, StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        let previous = review(&mut conn, id).await?;
        let mut updated = previous.clone();
        update.apply(&mut updated);

        exists(&mut conn, BOOKS, updated.book_id, Entity::Book).await?;
        exists(&mut conn, USERS, updated.user_id, Entity::User).await?;

        let moved = previous.book_id != updated.book_id;
        let target = rerated_book(&mut conn, updated.book_id, id, Some(&updated)).await?;
        let source = if moved {
            rerated_book(&mut conn, previous.book_id, id, None).await?
        } else {
            None
        };

        let mut pipe = redis::pipe();
        pipe.atomic().hset(REVIEWS, id, encode(&updated)?).ignore();
        if moved {
            pipe.srem(book_reviews_key(previous.book_id), id)
                .ignore()
                .sadd(book_reviews_key(updated.book_id), id)
                .ignore();
        }
        if previous.user_id != updated.user_id {
            pipe.srem(user_reviews_key(previous.user_id), id)
                .ignore()
                .sadd(user_reviews_key(updated.user_id), id)
                .ignore();
        }
        stage_books(&mut pipe, [target, source])?;
        let () = pipe.query_async(&mut conn).await?;

        Ok(updated)
    }

    async fn delete_review(&self, id: u32) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        let review: Review = fetch(&mut conn, REVIEWS, id, Entity::Review).await?;
        let book = rerated_book(&mut conn, review.book_id, id, None).await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .hdel(REVIEWS, id)
            .ignore()
            .hdel(REVIEW_LIKES, id)
            .ignore()
            .srem(book_reviews_key(review.book_id), id)
            .ignore()
            .srem(user_reviews_key(review.user_id), id)
            .ignore();
        stage_books(&mut pipe, [book])?;
        let () = pipe.query_async(&mut conn).await?;

        Ok(())
    }

    async fn like_review(&self, id: u32) -> Result<Review, StoreError> {
        let _guard = self.writes.lock().await;
        let mut conn = self.conn();

        let mut review: Review = fetch(&mut conn, REVIEWS, id, Entity::Review).await?;
        review.likes = conn.hincr(REVIEW_LIKES, id, 1).await?;

        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_keys() {
        assert_eq!(book_reviews_key(7), "book_reviews:7");
        assert_eq!(user_reviews_key(12), "user_reviews:12");
    }

    #[test]
    fn test_claimed_by_other() {
        assert!(!claimed_by_other(None, None));
        assert!(claimed_by_other(Some(3), None));
        assert!(claimed_by_other(Some(3), Some(4)));
        assert!(!claimed_by_other(Some(3), Some(3)));
    }

    #[test]
    fn test_decode_skips_missing_records() {
        let raw = vec![
            Some(r#"{"id": 2, "title": "Dune"}"#.to_string()),
            None,
            Some(r#"{"id": 5, "title": "Emma"}"#.to_string()),
        ];

        let decoded: Vec<catalog::BookSummary> = decode_all(raw).unwrap();

        let ids: Vec<u32> = decoded.iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_decode_rejects_corrupt_records() {
        let raw = vec![Some("not json".to_string())];

        let decoded: Result<Vec<catalog::BookSummary>, _> = decode_all(raw);

        assert!(matches!(decoded, Err(StoreError::Codec(_))));
    }

    fn stored_review(id: u32, rating: u8) -> Review {
        Review {
            id,
            book_id: 1,
            user_id: 1,
            rating,
            content: String::new(),
            likes: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_after_pending_write() {
        let stored = vec![stored_review(1, 5), stored_review(2, 4)];

        let created = summary_after(&stored, 3, Some(&stored_review(3, 3)));
        assert_eq!((created.average_rating, created.total_reviews), (4.0, 3));

        let edited = summary_after(&stored, 2, Some(&stored_review(2, 1)));
        assert_eq!((edited.average_rating, edited.total_reviews), (3.0, 2));

        let removed = summary_after(&stored, 1, None);
        assert_eq!((removed.average_rating, removed.total_reviews), (4.0, 1));

        assert_eq!(summary_after(&[], 1, None), RatingSummary::EMPTY);
    }

    mod live {
        //! Runs against the Redis at `REDIS_URL`: `cargo test -- --ignored`.
        //! Every test creates its own records, so a shared database is fine.
        use std::{
            env,
            sync::{
                Arc,
                atomic::{AtomicU32, Ordering},
            },
        };

        use super::*;

        static NEXT_NAME: AtomicU32 = AtomicU32::new(0);

        async fn live_store() -> Option<RedisStore> {
            let url = env::var("REDIS_URL").ok()?;
            let connection = init_redis(&url).await.expect("connect to REDIS_URL");

            Some(RedisStore::new(connection))
        }

        fn unique(prefix: &str) -> String {
            format!(
                "{prefix}_{}_{}",
                Utc::now().timestamp_micros(),
                NEXT_NAME.fetch_add(1, Ordering::Relaxed)
            )
        }

        fn new_book(title: &str) -> NewBook {
            NewBook {
                title: title.to_string(),
                author: "Ursula K. Le Guin".to_string(),
                description: "An anarchist physicist crosses worlds.".to_string(),
                genre: "Science Fiction".to_string(),
                publish_date: "1974".to_string(),
                pages: 387,
                isbn: None,
                cover_url: None,
            }
        }

        fn new_user() -> NewUser {
            let username = unique("reader");
            NewUser {
                email: format!("{username}@example.com"),
                name: username.clone(),
                username,
                bio: None,
                avatar: None,
            }
        }

        fn new_review(book_id: u32, user_id: u32, rating: i64) -> NewReview {
            NewReview {
                book_id,
                user_id,
                rating,
                content: "Worth reading.".to_string(),
            }
        }

        async fn seeded(store: &RedisStore) -> (Book, User) {
            let book = store.create_book(new_book("The Dispossessed")).await.unwrap();
            let user = store.create_user(new_user()).await.unwrap();
            (book, user)
        }

        async fn indexed(store: &RedisStore, key: String) -> Vec<u32> {
            let mut ids: Vec<u32> = store.conn().smembers(key).await.unwrap();
            ids.sort_unstable();
            ids
        }

        async fn aggregate(store: &RedisStore, book_id: u32) -> (f64, u32) {
            let book = store.get_book(book_id).await.unwrap();
            (book.average_rating, book.total_reviews)
        }

        #[tokio::test]
        #[ignore]
        async fn test_rating_follows_review_writes() {
            let Some(store) = live_store().await else {
                return;
            };
            let (book, user) = seeded(&store).await;
            let other = store.create_user(new_user()).await.unwrap();

            let first = store.create_review(new_review(book.id, user.id, 5)).await.unwrap();
            let second = store.create_review(new_review(book.id, other.id, 4)).await.unwrap();
            assert_eq!(aggregate(&store, book.id).await, (4.5, 2));
            assert_eq!(
                indexed(&store, book_reviews_key(book.id)).await,
                vec![first.id, second.id]
            );

            let update = ReviewUpdate {
                rating: Some(2),
                ..Default::default()
            };
            store.update_review(second.id, update).await.unwrap();
            assert_eq!(aggregate(&store, book.id).await, (3.5, 2));

            store.delete_review(first.id).await.unwrap();
            assert_eq!(aggregate(&store, book.id).await, (2.0, 1));

            store.delete_review(second.id).await.unwrap();
            assert_eq!(aggregate(&store, book.id).await, (0.0, 0));
        }

        #[tokio::test]
        #[ignore]
        async fn test_moving_review_updates_indexes() {
            let Some(store) = live_store().await else {
                return;
            };
            let (book, user) = seeded(&store).await;
            let other_book = store
                .create_book(new_book("The Left Hand of Darkness"))
                .await
                .unwrap();
            let other_user = store.create_user(new_user()).await.unwrap();
            let review = store.create_review(new_review(book.id, user.id, 3)).await.unwrap();

            let update = ReviewUpdate {
                book_id: Some(other_book.id),
                user_id: Some(other_user.id),
                ..Default::default()
            };
            store.update_review(review.id, update).await.unwrap();

            assert_eq!(aggregate(&store, book.id).await, (0.0, 0));
            assert_eq!(aggregate(&store, other_book.id).await, (3.0, 1));
            assert!(indexed(&store, book_reviews_key(book.id)).await.is_empty());
            assert_eq!(
                indexed(&store, book_reviews_key(other_book.id)).await,
                vec![review.id]
            );
            assert!(indexed(&store, user_reviews_key(user.id)).await.is_empty());

            let by_user = store.reviews_by_user(other_user.id).await.unwrap();
            assert_eq!(by_user.len(), 1);
            assert_eq!(by_user[0].book.title, "The Left Hand of Darkness");
        }

        #[tokio::test]
        #[ignore]
        async fn test_review_requires_existing_references() {
            let Some(store) = live_store().await else {
                return;
            };
            let (book, user) = seeded(&store).await;

            let missing_book = store.create_review(new_review(0, user.id, 4)).await;
            assert!(matches!(missing_book, Err(StoreError::NotFound(Entity::Book))));

            let missing_user = store.create_review(new_review(book.id, 0, 4)).await;
            assert!(matches!(missing_user, Err(StoreError::NotFound(Entity::User))));

            assert_eq!(aggregate(&store, book.id).await, (0.0, 0));
        }

        #[tokio::test]
        #[ignore]
        async fn test_concurrent_likes_are_all_counted() {
            let Some(store) = live_store().await else {
                return;
            };
            let (book, user) = seeded(&store).await;
            let review = store.create_review(new_review(book.id, user.id, 5)).await.unwrap();
            let store = Arc::new(store);
            let id = review.id;

            let handles: Vec<_> = (0..20)
                .map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move { store.like_review(id).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            assert_eq!(store.get_review(id).await.unwrap().likes, 20);
            let listed = store.reviews_for_book(book.id).await.unwrap();
            assert_eq!(listed[0].review.likes, 20);
        }

        #[tokio::test]
        #[ignore]
        async fn test_delete_cleans_up() {
            let Some(store) = live_store().await else {
                return;
            };
            let (book, user) = seeded(&store).await;
            let review = store.create_review(new_review(book.id, user.id, 4)).await.unwrap();
            store.like_review(review.id).await.unwrap();

            store.delete_review(review.id).await.unwrap();

            assert!(matches!(
                store.get_review(review.id).await,
                Err(StoreError::NotFound(Entity::Review))
            ));
            assert!(matches!(
                store.like_review(review.id).await,
                Err(StoreError::NotFound(Entity::Review))
            ));
            assert!(indexed(&store, book_reviews_key(book.id)).await.is_empty());
            assert!(indexed(&store, user_reviews_key(user.id)).await.is_empty());
            let liked: bool = store.conn().hexists(REVIEW_LIKES, review.id).await.unwrap();
            assert!(!liked);
            assert!(matches!(
                store.delete_review(review.id).await,
                Err(StoreError::NotFound(Entity::Review))
            ));
        }

        #[tokio::test]
        #[ignore]
        async fn test_rename_moves_identity_indexes() {
            let Some(store) = live_store().await else {
                return;
            };
            let user = store.create_user(new_user()).await.unwrap();

            let mut clash = new_user();
            clash.email = user.email.clone();
            assert!(matches!(
                store.create_user(clash).await,
                Err(StoreError::Duplicate)
            ));

            let renamed = unique("renamed");
            let update = UserUpdate {
                username: Some(renamed.clone()),
                email: Some(format!("{renamed}@example.com")),
                bio: Some(Some("Writer".to_string())),
                ..Default::default()
            };
            let updated = store.update_user(user.id, update).await.unwrap();
            assert_eq!(updated.bio.as_deref(), Some("Writer"));
            assert_eq!(store.get_user(user.id).await.unwrap().username, renamed);

            // the old identity is free again, the new one is taken
            let mut reuse = new_user();
            reuse.username = user.username.clone();
            reuse.email = user.email.clone();
            store.create_user(reuse).await.unwrap();

            let mut taken = new_user();
            taken.username = renamed;
            assert!(matches!(
                store.create_user(taken).await,
                Err(StoreError::Duplicate)
            ));
        }
    }
}
