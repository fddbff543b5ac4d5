use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity ---

/// Role
///
/// The two account kinds. Librarians manage the catalog; students only read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Librarian,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Librarian => "librarian",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "librarian" => Ok(Role::Librarian),
            "student" => Ok(Role::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User
///
/// A row of the `users` table. Never serialized: the hash must not leave the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Input to `Repository::create_user`, already validated and hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// UserProfile
///
/// The public face of a user returned after signup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// SignupRequest
///
/// Missing fields deserialize as empty strings so they fail validation with the
/// same message as blank ones. The role may be sent as `role` or `userType`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "userType")]
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub data: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub role: Role,
}

// --- Catalog ---

/// Book
///
/// A row of the `books` table. `book_image` is the path relative to the public
/// directory, always `images/<file>`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub book_name: String,
    pub author: String,
    pub genre: String,
    pub release_date: NaiveDate,
    pub book_image: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Normalized, validated book fields ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub book_name: String,
    pub author: String,
    pub genre: String,
    pub release_date: NaiveDate,
    pub book_image: String,
}

/// BookResponse
///
/// Projection returned by every read endpoint. The active flag stays internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub book_name: String,
    pub author: String,
    pub genre: String,
    #[schema(value_type = String, format = Date)]
    pub release_date: NaiveDate,
    pub book_image: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            book_name: book.book_name,
            author: book.author,
            genre: book.genre,
            release_date: book.release_date,
            book_image: book.book_image,
        }
    }
}

/// Raw text fields of the add/update multipart form, as received.
#[derive(Debug, Clone, Default)]
pub struct BookFields {
    pub book_name: String,
    pub author: String,
    pub genre: String,
    pub release_date: String,
}

/// StatusRequest
///
/// Body of the status toggle. Kept as raw JSON so a non-boolean `status` can be
/// rejected with a validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct StatusRequest {
    #[serde(default)]
    #[schema(value_type = bool)]
    pub status: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookCreatedResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookUpdatedResponse {
    pub message: String,
    pub data: BookResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDeletedResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookId {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChangedResponse {
    pub message: String,
    pub data: BookId,
}

/// Multipart form shape of the add/update endpoints, for documentation only.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
#[schema(rename_all = "camelCase")]
pub struct BookUploadForm {
    book_name: String,
    author: String,
    genre: String,
    #[schema(format = Date)]
    release_date: String,
    #[schema(value_type = String, format = Binary)]
    book_image: Vec<u8>,
}
