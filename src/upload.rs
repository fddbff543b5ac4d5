//! Multipart parsing for the book add/update forms.

use axum::{body::Bytes, extract::Multipart};

use crate::{
    error::{AppError, AppResult},
    models::BookFields,
    storage::ImageStore,
};

/// Largest accepted image, in bytes (10 MB).
pub const MAX_IMAGE_BYTES: usize = 10_000_000;

/// Request body cap for upload routes: the image plus room for the text fields.
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_IMAGE_BYTES + 64 * 1024;

pub const IMAGE_FIELD: &str = "bookImage";

/// Maps an accepted image MIME type to the extension it is stored with.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpeg"),
        "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// An image accepted from the form but not yet written anywhere.
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub extension: &'static str,
    pub bytes: Bytes,
}

/// BookForm
///
/// The add/update form after parsing. `image` holds the stored reference when a
/// file was sent; the caller owns that file and must remove it if the request
/// fails afterwards.
#[derive(Debug, Clone, Default)]
pub struct BookForm {
    pub fields: BookFields,
    pub image: Option<String>,
}

/// Reads every part of the form, rejecting bad images, then stores the image.
///
/// Nothing is written until the whole body has been read, so a form that fails
/// half way through leaves no file behind.
pub async fn read_book_form(mut multipart: Multipart, store: &dyn ImageStore) -> AppResult<BookForm> {
    let mut fields = BookFields::default();
    let mut pending: Option<PendingImage> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() || name == IMAGE_FIELD {
            if name != IMAGE_FIELD || pending.is_some() {
                return Err(AppError::Validation("Unexpected field".to_string()));
            }

            let extension = field
                .content_type()
                .and_then(extension_for)
                .ok_or(AppError::InvalidImageType)?;

            let mut buf = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if buf.len() + chunk.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::FileTooLarge);
                }
                buf.extend_from_slice(&chunk);
            }

            pending = Some(PendingImage {
                extension,
                bytes: Bytes::from(buf),
            });
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "bookName" => fields.book_name = value,
            "author" => fields.author = value,
            "genre" => fields.genre = value,
            "releaseDate" => fields.release_date = value,
            other => tracing::debug!(field = %other, "ignoring unknown form field"),
        }
    }

    let image = match pending {
        Some(img) if !img.bytes.is_empty() => Some(store.save(img.extension, img.bytes).await?),
        _ => None,
    };

    Ok(BookForm { fields, image })
}
