use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Reader Router Module
///
/// Catalog reads for students and librarians. Only active books are visible.
pub fn reader_routes() -> Router<AppState> {
    Router::new()
        // GET /api/book
        .route("/api/book", get(handlers::get_books))
        // GET /api/book/{id}
        .route("/api/book/{id}", get(handlers::get_book))
}
