//! # Storage
//!
//! One async interface over the book catalog, implemented by [`crate::memory::MemoryStore`] and
//! [`crate::database::RedisStore`].
//!
//! ## Contract
//! - Ids are assigned per record kind starting at 1 and never reused
//! - Every review insert, update and delete rebuilds the rating aggregate of each book it
//!   touched before the call returns
//! - Review writes that point at a missing book or user fail with [`StoreError::NotFound`]
//! - Usernames and emails are unique across users
use async_trait::async_trait;
use catalog::{
    Book, BookPage, BookQuery, BookWithReviews, Entity, GenreCount, NewBook, NewReview, NewUser,
    Review, ReviewUpdate, ReviewWithUser, User, UserUpdate,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Username or email already exists")]
    Duplicate,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt record: {0}")]
    Codec(#[from] serde_json::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn get_user(&self, id: u32) -> Result<User, StoreError>;
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update_user(&self, id: u32, update: UserUpdate) -> Result<User, StoreError>;

    async fn get_book(&self, id: u32) -> Result<Book, StoreError>;
    async fn book_with_reviews(&self, id: u32) -> Result<BookWithReviews, StoreError>;
    async fn list_books(&self, query: &BookQuery) -> Result<BookPage, StoreError>;
    async fn featured_books(&self) -> Result<Vec<Book>, StoreError>;
    async fn create_book(&self, book: NewBook) -> Result<Book, StoreError>;
    async fn genres(&self) -> Result<Vec<GenreCount>, StoreError>;

    async fn get_review(&self, id: u32) -> Result<Review, StoreError>;
    async fn reviews_for_book(&self, book_id: u32) -> Result<Vec<ReviewWithUser>, StoreError>;
    async fn reviews_by_user(&self, user_id: u32) -> Result<Vec<ReviewWithUser>, StoreError>;
    async fn recent_reviews(&self, limit: usize) -> Result<Vec<ReviewWithUser>, StoreError>;
    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError>;
    async fn update_review(&self, id: u32, update: ReviewUpdate) -> Result<Review, StoreError>;
    async fn delete_review(&self, id: u32) -> Result<(), StoreError>;
    async fn like_review(&self, id: u32) -> Result<Review, StoreError>;
}
