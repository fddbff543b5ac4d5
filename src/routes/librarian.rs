use crate::{AppState, handlers, upload::MAX_UPLOAD_BODY_BYTES};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, patch, post},
};

/// Librarian Router Module
///
/// Catalog management. Every handler here reads the `AuthUser` the librarian
/// gate stored in the request extensions.
pub fn librarian_routes() -> Router<AppState> {
    Router::new()
        // POST /api/book/add
        // Multipart form with the cover image in `bookImage`.
        .route("/api/book/add", post(handlers::add_book))
        // PATCH /api/book/update/{id}
        // Full replacement, including a new image. The old image is deleted.
        .route("/api/book/update/{id}", patch(handlers::update_book))
        // DELETE /api/book/delete/{id}
        .route("/api/book/delete/{id}", delete(handlers::delete_book))
        // PATCH /api/book/status/{id}
        // JSON `{ "status": bool }`. Hidden books stay in the database.
        .route("/api/book/status/{id}", patch(handlers::change_book_status))
        // The default 2 MB cap would reject legitimate images before the
        // 10 MB per-file check runs.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
}
