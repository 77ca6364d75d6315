use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{Book, BookSummary, Timestamp, User, UserSummary, Validate};

pub const RATING_RANGE: RangeInclusive<i64> = 1..=5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u32,
    pub book_id: u32,
    pub user_id: u32,
    pub rating: u8,
    pub content: String,
    pub likes: u32,
    pub created_at: Timestamp,
}

/// Review listing entry with its author and book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewWithUser {
    #[serde(flatten)]
    pub review: Review,
    pub user: UserSummary,
    pub book: BookSummary,
}

impl ReviewWithUser {
    pub fn join(review: Review, user: Option<&User>, book: Option<&Book>) -> Self {
        Self {
            review,
            user: user.map_or_else(UserSummary::unknown, User::summary),
            book: book.map_or_else(BookSummary::unknown, Book::summary),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub book_id: u32,
    pub user_id: u32,
    pub rating: i64,
    pub content: String,
}

impl NewReview {
    /// Callers must have checked [`Validate::problems`] first.
    pub fn into_review(self, id: u32, created_at: Timestamp) -> Review {
        Review {
            id,
            book_id: self.book_id,
            user_id: self.user_id,
            rating: clamp_rating(self.rating),
            content: self.content,
            likes: 0,
            created_at,
        }
    }
}

impl Validate for NewReview {
    fn problems(&self) -> Vec<String> {
        rating_problems(Some(self.rating))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub book_id: Option<u32>,
    pub user_id: Option<u32>,
    pub rating: Option<i64>,
    pub content: Option<String>,
}

impl ReviewUpdate {
    pub fn apply(self, review: &mut Review) {
        if let Some(book_id) = self.book_id {
            review.book_id = book_id;
        }
        if let Some(user_id) = self.user_id {
            review.user_id = user_id;
        }
        if let Some(rating) = self.rating {
            review.rating = clamp_rating(rating);
        }
        if let Some(content) = self.content {
            review.content = content;
        }
    }
}

impl Validate for ReviewUpdate {
    fn problems(&self) -> Vec<String> {
        rating_problems(self.rating)
    }
}

fn rating_problems(rating: Option<i64>) -> Vec<String> {
    match rating {
        Some(rating) if !RATING_RANGE.contains(&rating) => vec![format!(
            "rating must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )],
        _ => Vec::new(),
    }
}

fn clamp_rating(rating: i64) -> u8 {
    rating.clamp(*RATING_RANGE.start(), *RATING_RANGE.end()) as u8
}

/// Newest first; the later id wins a timestamp tie.
pub fn sort_newest_first(reviews: &mut [Review]) {
    reviews.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
