//! # Catalog
//!
//! Records shared by every storage backend plus the pure logic that runs over them.
//!
//! ## Records
//! - [`users::User`]: reader profile, unique **username** and **email**
//! - [`books::Book`]: catalog entry carrying its own rating aggregate
//! - [`reviews::Review`]: one reader's 1-5 rating of a book, plus a like counter
//!
//! ## Aggregates
//! A book's `averageRating` and `totalReviews` are derived data. They are rebuilt from the
//! book's full review set with [`rating::RatingSummary::from_ratings`] after every review write,
//! never adjusted incrementally.
//!
//! ## Catalog Queries
//! Listing, featured picks and genre facets live in [`query`]. They work on plain iterators of
//! records so the in-memory and Redis backends share one implementation.
use std::fmt;

pub mod books;
pub mod query;
pub mod rating;
pub mod reviews;
pub mod users;

pub use books::{Book, BookReview, BookSummary, BookWithReviews, NewBook};
pub use query::{BookPage, BookQuery, GenreCount};
pub use rating::RatingSummary;
pub use reviews::{NewReview, Review, ReviewUpdate, ReviewWithUser};
pub use users::{NewUser, User, UserSummary, UserUpdate};

pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Kind of record, used when reporting missing or invalid data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Book,
    Review,
    User,
}

impl Entity {
    pub fn label(self) -> &'static str {
        match self {
            Entity::Book => "book",
            Entity::Review => "review",
            Entity::User => "user",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Book => "Book",
            Entity::Review => "Review",
            Entity::User => "User",
        };

        f.write_str(name)
    }
}

/// Field-level checks run on incoming payloads after they decode.
///
/// Decoding already enforces required fields and their types; empty strings are accepted.
pub trait Validate {
    /// Every problem found, empty when the payload is acceptable.
    fn problems(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Lets a payload distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
