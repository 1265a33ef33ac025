use axum::{
    Router,
    routing::{get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(handler::list_books))
        .route("/books", post(handler::create_book))
        .route("/books/search", get(handler::search_books))
        .route("/books/top-rated", get(handler::top_rated))
        .route("/books/:id/reviews", get(handler::list_reviews))
        .route("/books/:id/reviews", post(handler::create_review))
}
