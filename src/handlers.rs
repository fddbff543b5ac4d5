use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState, accounts,
    auth::AuthUser,
    catalog,
    error::{AppError, AppResult, ErrorEnvelope},
    models::{
        BookCreatedResponse, BookDeletedResponse, BookId, BookResponse, BookUpdatedResponse,
        BookUploadForm, LoginRequest, LoginResponse, SignupRequest, SignupResponse, StatusChangedResponse,
        StatusRequest,
    },
    storage::ImageStore,
    upload::{self, BookForm},
};

/// discard_upload_on_error
///
/// The file stored while parsing a form belongs to the request until a record
/// references it. When the request fails, the file is removed before the error
/// is returned.
async fn discard_upload_on_error<T>(images: &dyn ImageStore, form: &BookForm, result: AppResult<T>) -> AppResult<T> {
    if result.is_err() {
        if let Some(reference) = &form.image {
            catalog::release_image(images, reference).await;
        }
    }
    result
}

// --- Accounts ---

/// signup
///
/// [Public Route] Registers a librarian or student account.
#[utoipa::path(
    post,
    path = "/api/user/signup",
    tag = "User",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully!", body = SignupResponse),
        (status = 422, description = "Invalid input or user already exists", body = ErrorEnvelope)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let Json(req) = payload?;
    let profile = accounts::signup(state.repo.as_ref(), req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully!".to_string(),
            data: profile,
        }),
    ))
}

/// signin
///
/// [Public Route] Exchanges credentials for a one-hour bearer token.
#[utoipa::path(
    post,
    path = "/api/user/signin",
    tag = "User",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User login successfully", body = LoginResponse),
        (status = 404, description = "User Not Found!", body = ErrorEnvelope),
        (status = 422, description = "Wrong User credentials!", body = ErrorEnvelope)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    let response = accounts::login(state.repo.as_ref(), &state.config, req).await?;
    Ok(Json(response))
}

// --- Catalog: librarian ---

/// add_book
///
/// [Librarian Route] Creates a book from a multipart form carrying its cover image.
#[utoipa::path(
    post,
    path = "/api/book/add",
    tag = "Librarian",
    request_body(content = BookUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book created successfully!", body = BookCreatedResponse),
        (status = 400, description = "File too large", body = ErrorEnvelope),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 422, description = "Invalid inputs or duplicate book", body = ErrorEnvelope)
    ),
    security(("librarian_token" = []))
)]
pub async fn add_book(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<BookCreatedResponse>)> {
    let form = upload::read_book_form(multipart, state.storage.as_ref()).await?;

    let result = catalog::add_book(state.repo.as_ref(), &form.fields, form.image.as_deref()).await;
    let book = discard_upload_on_error(state.storage.as_ref(), &form, result).await?;

    tracing::info!(book_id = %book.id, librarian = %user.id, "book added");
    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: "Book created successfully!".to_string(),
            id: book.id,
        }),
    ))
}

/// update_book
///
/// [Librarian Route] Replaces every field and the cover image of a book.
#[utoipa::path(
    patch,
    path = "/api/book/update/{id}",
    tag = "Librarian",
    params(("id" = String, Path, description = "Book id")),
    request_body(content = BookUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book updated successfully!", body = BookUpdatedResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Book not exists!", body = ErrorEnvelope),
        (status = 422, description = "Invalid inputs", body = ErrorEnvelope)
    ),
    security(("librarian_token" = []))
)]
pub async fn update_book(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<BookUpdatedResponse>)> {
    let form = upload::read_book_form(multipart, state.storage.as_ref()).await?;

    let result = async {
        let id = catalog::parse_book_id(&id)?;
        catalog::update_book(
            state.repo.as_ref(),
            state.storage.as_ref(),
            id,
            &form.fields,
            form.image.as_deref(),
        )
        .await
    }
    .await;
    let book = discard_upload_on_error(state.storage.as_ref(), &form, result).await?;

    tracing::info!(book_id = %book.id, librarian = %user.id, "book replaced");
    Ok((
        StatusCode::CREATED,
        Json(BookUpdatedResponse {
            message: "Book updated successfully!".to_string(),
            data: book.into(),
        }),
    ))
}

/// delete_book
///
/// [Librarian Route] Removes a book and its cover image.
#[utoipa::path(
    delete,
    path = "/api/book/delete/{id}",
    tag = "Librarian",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted successfully!", body = BookDeletedResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Book not exists!", body = ErrorEnvelope)
    ),
    security(("librarian_token" = []))
)]
pub async fn delete_book(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookDeletedResponse>> {
    let id = catalog::parse_book_id(&id)?;
    let id = catalog::delete_book(state.repo.as_ref(), state.storage.as_ref(), id).await?;

    tracing::info!(book_id = %id, librarian = %user.id, "book removed");
    Ok(Json(BookDeletedResponse {
        message: "Book deleted successfully!".to_string(),
        id,
    }))
}

/// change_book_status
///
/// [Librarian Route] Shows or hides a book from readers without deleting it.
#[utoipa::path(
    patch,
    path = "/api/book/status/{id}",
    tag = "Librarian",
    params(("id" = String, Path, description = "Book id")),
    request_body = StatusRequest,
    responses(
        (status = 201, description = "Book status updated successfully!", body = StatusChangedResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Book not exists!", body = ErrorEnvelope),
        (status = 422, description = "Status should be boolean", body = ErrorEnvelope)
    ),
    security(("librarian_token" = []))
)]
pub async fn change_book_status(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<StatusChangedResponse>)> {
    let Json(req) = payload?;
    let id = catalog::parse_book_id(&id)?;
    let id = catalog::change_status(state.repo.as_ref(), id, &req.status).await?;

    tracing::info!(book_id = %id, librarian = %user.id, "book status toggled");

    Ok((
        StatusCode::CREATED,
        Json(StatusChangedResponse {
            message: "Book status updated successfully!".to_string(),
            data: BookId { id },
        }),
    ))
}

// --- Catalog: readers ---

/// get_books
///
/// [Reader Route] Lists every active book.
#[utoipa::path(
    get,
    path = "/api/book",
    tag = "Student",
    responses(
        (status = 200, description = "Active books", body = [BookResponse]),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope)
    ),
    security(("student_token" = []), ("librarian_token" = []))
)]
pub async fn get_books(State(state): State<AppState>) -> AppResult<Json<Vec<BookResponse>>> {
    Ok(Json(catalog::list_active_books(state.repo.as_ref()).await?))
}

/// get_book
///
/// [Reader Route] Fetches one active book.
#[utoipa::path(
    get,
    path = "/api/book/{id}",
    tag = "Student",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelope),
        (status = 404, description = "Book not exists!", body = ErrorEnvelope)
    ),
    security(("student_token" = []), ("librarian_token" = []))
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<BookResponse>> {
    let id = catalog::parse_book_id(&id)?;
    Ok(Json(catalog::get_book(state.repo.as_ref(), id).await?))
}

/// Fallback for every unmatched route.
pub async fn route_not_found() -> AppError {
    AppError::NotFound("Could not find this route.".to_string())
}
