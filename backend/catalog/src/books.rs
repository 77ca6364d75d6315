use serde::{Deserialize, Serialize};

use crate::{RatingSummary, Review, Timestamp, UserSummary, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: String,
    pub publish_date: String,
    pub pages: u32,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub average_rating: f64,
    pub total_reviews: u32,
    pub created_at: Timestamp,
}

impl Book {
    pub fn apply_rating(&mut self, summary: RatingSummary) {
        self.average_rating = summary.average_rating;
        self.total_reviews = summary.total_reviews;
    }

    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: u32,
    pub title: String,
}

impl BookSummary {
    pub fn unknown() -> Self {
        Self {
            id: 0,
            title: "Unknown Book".to_string(),
        }
    }
}

/// Catalog submission. Rating fields are not accepted; new books start unrated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: String,
    pub publish_date: String,
    pub pages: u32,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl NewBook {
    pub fn into_book(self, id: u32, created_at: Timestamp) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            description: self.description,
            genre: self.genre,
            publish_date: self.publish_date,
            pages: self.pages,
            isbn: self.isbn,
            cover_url: self.cover_url,
            average_rating: RatingSummary::EMPTY.average_rating,
            total_reviews: RatingSummary::EMPTY.total_reviews,
            created_at,
        }
    }
}

impl Validate for NewBook {}

/// Review as shown on a book page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookReview {
    #[serde(flatten)]
    pub review: Review,
    pub user: UserSummary,
}

/// Book detail page: the book and its reviews, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookWithReviews {
    #[serde(flatten)]
    pub book: Book,
    pub reviews: Vec<BookReview>,
}
