use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::{Catalog, CreateBook};
use crate::auth;
use crate::error::ApiError;
use crate::handler::AppState;

const TOP_RATED_LIMIT: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub content: Option<String>,
    pub rating: Option<i32>,
}

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBookRequest>,
) -> Result<Response, ApiError> {
    auth::authenticate(&state, &headers).await?;

    let (Some(title), Some(author), Some(published_date)) = (
        non_empty(payload.title),
        non_empty(payload.author),
        non_empty(payload.published_date),
    ) else {
        return Err(ApiError::Validation("All fields are required".to_string()));
    };

    let catalog = Catalog::new(state.db.connection());
    let book = catalog
        .create_book(CreateBook {
            title,
            author,
            published_date,
        })
        .await?;

    tracing::info!(book_id = book.id, "added book");
    Ok(created(book))
}

pub async fn list_books(State(state): State<AppState>) -> Result<Response, ApiError> {
    let catalog = Catalog::new(state.db.connection());
    let books = catalog.list_books().await?;
    Ok(success(books))
}

pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let query = match params.q {
        Some(q) if !q.is_empty() => q,
        _ => return Err(ApiError::Validation("Search query is required".to_string())),
    };

    let catalog = Catalog::new(state.db.connection());
    let books = catalog.search_books(&query).await?;
    Ok(success(books))
}

pub async fn top_rated(State(state): State<AppState>) -> Result<Response, ApiError> {
    let catalog = Catalog::new(state.db.connection());
    let ranked = catalog.top_rated(TOP_RATED_LIMIT).await?;
    Ok(success(ranked))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Response, ApiError> {
    let user = auth::authenticate(&state, &headers).await?;
    let catalog = Catalog::new(state.db.connection());

    // the book lookup comes first: an unknown id is 404 even when the
    // payload is also invalid
    if catalog.get_book(book_id).await?.is_none() {
        return Err(ApiError::NotFound("Book not found".to_string()));
    }

    let (Some(content), Some(rating)) = (
        non_empty(payload.content),
        payload.rating.filter(|r| (1..=5).contains(r)),
    ) else {
        return Err(ApiError::Validation(
            "Content and a rating between 1-5 are required".to_string(),
        ));
    };

    match catalog
        .create_review(book_id, user.id, &content, rating)
        .await?
    {
        Some(review) => {
            tracing::info!(book_id, review_id = review.id, "added review");
            Ok(created(review))
        }
        None => Err(ApiError::NotFound("Book not found".to_string())),
    }
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> Result<Response, ApiError> {
    let catalog = Catalog::new(state.db.connection());

    if catalog.get_book(book_id).await?.is_none() {
        return Err(ApiError::NotFound("Book not found".to_string()));
    }

    let reviews = catalog.list_reviews(book_id).await?;
    Ok(success(reviews))
}
