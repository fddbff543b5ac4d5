use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, NewBook, NewUser, User},
};

/// Reported when an insert hits the unique email constraint.
pub const USER_EXISTS: &str = "User already exists!";

fn user_exists() -> AppError {
    AppError::Conflict(USER_EXISTS.to_string())
}

/// Repository
///
/// Persistence contract for accounts and the catalog. Handlers and services only
/// see this trait, shared as `Arc<dyn Repository>`, so tests can swap in
/// `InMemoryRepository` for `PostgresRepository`.
///
/// Single-record writes return `Ok(None)` / `Ok(false)` when the id does not exist.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    // Fails with a conflict when the email is already registered.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    // --- Books ---
    async fn find_book(&self, id: Uuid) -> AppResult<Option<Book>>;
    // Only returns the book when it is active.
    async fn find_active_book(&self, id: Uuid) -> AppResult<Option<Book>>;
    // Exact match on the normalized (name, author) pair.
    async fn find_book_by_name_and_author(&self, book_name: &str, author: &str) -> AppResult<Option<Book>>;
    async fn list_active_books(&self) -> AppResult<Vec<Book>>;
    async fn create_book(&self, book: NewBook) -> AppResult<Book>;
    // Replaces every field except `active`.
    async fn update_book(&self, id: Uuid, book: NewBook) -> AppResult<Option<Book>>;
    async fn delete_book(&self, id: Uuid) -> AppResult<bool>;
    async fn set_book_active(&self, id: Uuid, active: bool) -> AppResult<Option<Book>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const BOOK_COLUMNS: &str =
    "id, book_name, author, genre, release_date, book_image, active, created_at";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, role
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // A concurrent signup won the race past the email lookup.
            sqlx::Error::Database(db) if db.is_unique_violation() => user_exists(),
            other => AppError::Database(other),
        })?;
        Ok(created)
    }

    async fn find_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_active_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1 AND active = true"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find_book_by_name_and_author(&self, book_name: &str, author: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE book_name = $1 AND author = $2 LIMIT 1"
        ))
        .bind(book_name)
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn list_active_books(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE active = true ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (id, book_name, author, genre, release_date, book_image, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, true, NOW())
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&book.book_name)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.release_date)
        .bind(&book.book_image)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_book(&self, id: Uuid, book: NewBook) -> AppResult<Option<Book>> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET book_name = $2, author = $3, genre = $4, release_date = $5, book_image = $6
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&book.book_name)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.release_date)
        .bind(&book.book_image)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_book_active(&self, id: Uuid, active: bool) -> AppResult<Option<Book>> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET active = $2 WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }
}

/// InMemoryRepository
///
/// `Repository` kept in process memory. Used by the test suite and for running
/// the API without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<Vec<User>>,
    books: RwLock<Vec<Book>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(user_exists());
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id).cloned())
    }

    async fn find_active_book(&self, id: Uuid) -> AppResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == id && b.active).cloned())
    }

    async fn find_book_by_name_and_author(&self, book_name: &str, author: &str) -> AppResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .find(|b| b.book_name == book_name && b.author == author)
            .cloned())
    }

    async fn list_active_books(&self) -> AppResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().filter(|b| b.active).cloned().collect())
    }

    async fn create_book(&self, book: NewBook) -> AppResult<Book> {
        let created = Book {
            id: Uuid::new_v4(),
            book_name: book.book_name,
            author: book.author,
            genre: book.genre,
            release_date: book.release_date,
            book_image: book.book_image,
            active: true,
            created_at: Utc::now(),
        };
        self.books.write().await.push(created.clone());
        Ok(created)
    }

    async fn update_book(&self, id: Uuid, book: NewBook) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(existing) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        existing.book_name = book.book_name;
        existing.author = book.author;
        existing.genre = book.genre;
        existing.release_date = book.release_date;
        existing.book_image = book.book_image;
        Ok(Some(existing.clone()))
    }

    async fn delete_book(&self, id: Uuid) -> AppResult<bool> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() < before)
    }

    async fn set_book_active(&self, id: Uuid, active: bool) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(existing) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        existing.active = active;
        Ok(Some(existing.clone()))
    }
}
