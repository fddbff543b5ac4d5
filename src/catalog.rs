//! Book catalog operations.
//!
//! Image files are owned by the records that reference them. Replacing or deleting
//! a record releases its old file only after the database write succeeded; a failed
//! removal is logged and leaves an orphaned file, never an orphaned record.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFields, BookResponse, NewBook},
    repository::Repository,
    storage::ImageStore,
    validation,
};

const BOOK_NOT_FOUND: &str = "Book not exists!";

fn not_found() -> AppError {
    AppError::NotFound(BOOK_NOT_FOUND.to_string())
}

/// Parses a path id. Anything that is not a UUID cannot name a book.
pub fn parse_book_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found())
}

/// Normalizes and validates the form fields of an add/update request.
///
/// `image` is the stored reference of the uploaded file, if any.
pub fn prepare_book(fields: &BookFields, image: Option<&str>) -> AppResult<NewBook> {
    let book_name = validation::normalize(&fields.book_name);
    let author = validation::normalize(&fields.author);
    let genre = validation::normalize(&fields.genre);
    let release_date = fields.release_date.trim();
    let image = image.unwrap_or_default();

    validation::require_non_empty(&[book_name.as_str(), &author, &genre, release_date, image])?;
    validation::require_sanitized(&[book_name.as_str(), &author, &genre, release_date])?;

    let release_date = validation::parse_release_date(release_date).ok_or_else(|| {
        AppError::Validation("Invalid release date format (i.e. YYYY/MM/DD)".to_string())
    })?;

    Ok(NewBook {
        book_name,
        author,
        genre,
        release_date,
        book_image: image.to_string(),
    })
}

/// Adds a book. The normalized (name, author) pair must not exist yet.
pub async fn add_book(repo: &dyn Repository, fields: &BookFields, image: Option<&str>) -> AppResult<Book> {
    let book = prepare_book(fields, image)?;

    if repo
        .find_book_by_name_and_author(&book.book_name, &book.author)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("This book already exists!".to_string()));
    }

    let created = repo.create_book(book).await?;
    tracing::info!(book_id = %created.id, "book created");
    Ok(created)
}

/// Replaces every field and the image of an existing book, then releases the old image.
pub async fn update_book(
    repo: &dyn Repository,
    images: &dyn ImageStore,
    id: Uuid,
    fields: &BookFields,
    image: Option<&str>,
) -> AppResult<Book> {
    let book = prepare_book(fields, image)?;

    let existing = repo.find_book(id).await?.ok_or_else(not_found)?;
    let updated = repo.update_book(id, book).await?.ok_or_else(not_found)?;

    if existing.book_image != updated.book_image {
        release_image(images, &existing.book_image).await;
    }

    tracing::info!(book_id = %id, "book updated");
    Ok(updated)
}

/// Deletes a book and its image.
pub async fn delete_book(repo: &dyn Repository, images: &dyn ImageStore, id: Uuid) -> AppResult<Uuid> {
    let existing = repo.find_book(id).await?.ok_or_else(not_found)?;

    if !repo.delete_book(id).await? {
        return Err(not_found());
    }
    release_image(images, &existing.book_image).await;

    tracing::info!(book_id = %id, "book deleted");
    Ok(id)
}

/// Sets the active flag. `status` must be a JSON boolean.
pub async fn change_status(repo: &dyn Repository, id: Uuid, status: &serde_json::Value) -> AppResult<Uuid> {
    let active = status.as_bool().ok_or_else(|| {
        AppError::Validation("Status should be boolean (i.e true or false)!".to_string())
    })?;

    let book = repo.set_book_active(id, active).await?.ok_or_else(not_found)?;
    tracing::info!(book_id = %book.id, active, "book status changed");
    Ok(book.id)
}

pub async fn list_active_books(repo: &dyn Repository) -> AppResult<Vec<BookResponse>> {
    let books = repo.list_active_books().await?;
    Ok(books.into_iter().map(BookResponse::from).collect())
}

/// Fetches a book visible to readers. Inactive books look absent.
pub async fn get_book(repo: &dyn Repository, id: Uuid) -> AppResult<BookResponse> {
    repo.find_active_book(id)
        .await?
        .map(BookResponse::from)
        .ok_or_else(not_found)
}

/// Removes an image whose owner no longer references it. Failures are only logged.
pub async fn release_image(images: &dyn ImageStore, reference: &str) {
    if let Err(e) = images.remove(reference).await {
        tracing::warn!(image = %reference, error = %e, "could not remove image file");
    }
}
