use std::str::FromStr;

use axum::body::Bytes;
use catalog::{
    BookQuery, Entity, Validate,
    query::{DEFAULT_LIMIT, DEFAULT_PAGE, clamp_limit},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::AppError;

pub const DEFAULT_REVIEW_LIMIT: u32 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct BooksParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsParams {
    pub book_id: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<String>,
}

/// Which review listing a `/api/reviews` request asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum ReviewFilter {
    Book(u32),
    User(u32),
    Recent(usize),
}

/// Decodes a JSON body and runs its field checks.
pub fn decode_body<T>(body: &Bytes, entity: Entity) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_slice(body).map_err(|e| AppError::InvalidPayload {
        entity,
        errors: vec![e.to_string()],
    })?;

    let errors = payload.problems();
    if !errors.is_empty() {
        return Err(AppError::InvalidPayload { entity, errors });
    }

    Ok(payload)
}

pub fn parse_id(raw: &str) -> Result<u32, AppError> {
    raw.trim().parse().map_err(|_| AppError::InvalidId)
}

fn present(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.is_empty())
}

/// Positive integer parameter; `default` when absent or empty.
fn positive<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
{
    match present(raw) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(AppError::InvalidParameter(name)),
        },
    }
}

pub fn book_query(params: BooksParams) -> Result<BookQuery, AppError> {
    Ok(BookQuery {
        search: present(params.search),
        genre: present(params.genre),
        page: positive("page", params.page, DEFAULT_PAGE)?,
        limit: clamp_limit(positive("limit", params.limit, DEFAULT_LIMIT)?),
    })
}

pub fn review_filter(params: ReviewsParams) -> Result<ReviewFilter, AppError> {
    if let Some(book_id) = present(params.book_id) {
        return parse_id(&book_id).map(ReviewFilter::Book);
    }
    if let Some(user_id) = present(params.user_id) {
        return parse_id(&user_id).map(ReviewFilter::User);
    }

    let limit = clamp_limit(positive("limit", params.limit, DEFAULT_REVIEW_LIMIT)?);

    Ok(ReviewFilter::Recent(limit as usize))
}
