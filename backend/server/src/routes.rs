use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use catalog::{
    Book, BookPage, BookWithReviews, Entity, GenreCount, NewBook, NewReview, NewUser, Review,
    ReviewUpdate, ReviewWithUser, User, UserUpdate,
};
use serde_json::{Value, json};
use tracing::info;

use crate::{
    error::AppError,
    state::AppState,
    utils::{
        BooksParams, ReviewFilter, ReviewsParams, book_query, decode_body, parse_id, review_filter,
    },
};

type Shared = State<Arc<AppState>>;

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn books_handler(
    State(state): Shared,
    params: Result<Query<BooksParams>, QueryRejection>,
) -> Result<Json<BookPage>, AppError> {
    let Query(params) = params?;
    let query = book_query(params)?;

    let page = state
        .store
        .list_books(&query)
        .await
        .map_err(AppError::store("fetch books"))?;

    Ok(Json(page))
}

pub async fn featured_books_handler(State(state): Shared) -> Result<Json<Vec<Book>>, AppError> {
    let books = state
        .store
        .featured_books()
        .await
        .map_err(AppError::store("fetch featured books"))?;

    Ok(Json(books))
}

pub async fn book_handler(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<BookWithReviews>, AppError> {
    let book = state
        .store
        .book_with_reviews(parse_id(&id)?)
        .await
        .map_err(AppError::store("fetch book"))?;

    Ok(Json(book))
}

pub async fn create_book_handler(
    State(state): Shared,
    body: Bytes,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book: NewBook = decode_body(&body, Entity::Book)?;

    let book = state
        .store
        .create_book(book)
        .await
        .map_err(AppError::store("create book"))?;
    info!(book_id = book.id, "Book created");

    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn reviews_handler(
    State(state): Shared,
    params: Result<Query<ReviewsParams>, QueryRejection>,
) -> Result<Json<Vec<ReviewWithUser>>, AppError> {
    let Query(params) = params?;
    let reviews = match review_filter(params)? {
        ReviewFilter::Book(book_id) => state.store.reviews_for_book(book_id).await,
        ReviewFilter::User(user_id) => state.store.reviews_by_user(user_id).await,
        ReviewFilter::Recent(limit) => state.store.recent_reviews(limit).await,
    }
    .map_err(AppError::store("fetch reviews"))?;

    Ok(Json(reviews))
}

pub async fn create_review_handler(
    State(state): Shared,
    body: Bytes,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review: NewReview = decode_body(&body, Entity::Review)?;

    let review = state
        .store
        .create_review(review)
        .await
        .map_err(AppError::store("create review"))?;
    info!(
        review_id = review.id,
        book_id = review.book_id,
        "Review created"
    );

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update_review_handler(
    State(state): Shared,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Review>, AppError> {
    let id = parse_id(&id)?;
    let update: ReviewUpdate = decode_body(&body, Entity::Review)?;

    let review = state
        .store
        .update_review(id, update)
        .await
        .map_err(AppError::store("update review"))?;

    Ok(Json(review))
}

pub async fn delete_review_handler(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;

    state
        .store
        .delete_review(id)
        .await
        .map_err(AppError::store("delete review"))?;
    info!(review_id = id, "Review deleted");

    Ok(Json(json!({ "message": "Review deleted successfully" })))
}

pub async fn like_review_handler(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .store
        .like_review(parse_id(&id)?)
        .await
        .map_err(AppError::store("like review"))?;

    Ok(Json(review))
}

pub async fn user_handler(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .get_user(parse_id(&id)?)
        .await
        .map_err(AppError::store("fetch user"))?;

    Ok(Json(user))
}

pub async fn update_user_handler(
    State(state): Shared,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id)?;
    let update: UserUpdate = decode_body(&body, Entity::User)?;

    let user = state
        .store
        .update_user(id, update)
        .await
        .map_err(AppError::store("update user"))?;

    Ok(Json(user))
}

pub async fn create_user_handler(
    State(state): Shared,
    body: Bytes,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user: NewUser = decode_body(&body, Entity::User)?;

    let user = state
        .store
        .create_user(user)
        .await
        .map_err(AppError::store("create user"))?;
    info!(user_id = user.id, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn genres_handler(State(state): Shared) -> Result<Json<Vec<GenreCount>>, AppError> {
    let genres = state
        .store
        .genres()
        .await
        .map_err(AppError::store("fetch genres"))?;

    Ok(Json(genres))
}
