//! Shared helper functions for Rocket route handlers.

use rocket::fs::TempFile;
use rocket_db_pools::sqlx::{self, PgPool};
use uuid::Uuid;

use crate::error::ApiError;
use crate::media::ImageUpload;
use crate::models::{BookWithAuthor, User};

/// Read an optional multipart file part into an upload payload.
///
/// A missing or empty part means "no image"; a part without a content type is
/// rejected before any bytes are read. The part is staged through a scratch
/// file because Rocket may hold small uploads in memory only.
pub async fn read_image(file: Option<&mut TempFile<'_>>) -> Result<Option<ImageUpload>, ApiError> {
    let Some(file) = file else {
        return Ok(None);
    };
    if file.len() == 0 {
        return Ok(None);
    }

    let content_type = file
        .content_type()
        .map(|ct| ct.to_string())
        .ok_or_else(|| ApiError::BadRequest("uploaded file has no content type".into()))?;

    let scratch_dir = std::env::temp_dir().join("bookstore-uploads");
    tokio::fs::create_dir_all(&scratch_dir).await?;
    let scratch_path = scratch_dir.join(Uuid::new_v4().to_string());

    file.copy_to(&scratch_path).await?;
    let bytes = tokio::fs::read(&scratch_path).await?;
    let _ = tokio::fs::remove_file(&scratch_path).await;

    Ok(Some(ImageUpload {
        bytes,
        content_type,
    }))
}

const BOOK_WITH_AUTHOR_COLUMNS: &str = r#"
    b.id, b.title, b.description, b.genre, b.pages, b.published_at, b.isbn,
    b.cover_image_url, b.cover_image_public_id, b.created_at, b.author_id,
    u.firstname AS author_firstname, u.lastname AS author_lastname,
    u.email AS author_email, u.phone_number AS author_phone_number,
    u.address AS author_address, u.bio AS author_bio,
    u.image_url AS author_image_url, u.gender AS author_gender,
    u.created_at AS author_created_at
"#;

/// SELECT column list shared by every query that returns a book joined with
/// its author.
pub fn book_with_author_columns() -> &'static str {
    BOOK_WITH_AUTHOR_COLUMNS
}

/// Fetch a book with its author, or [`ApiError::NotFound`].
pub async fn fetch_book_with_author(
    pool: &PgPool,
    book_id: Uuid,
) -> Result<BookWithAuthor, ApiError> {
    let query = format!(
        "SELECT {} FROM books b JOIN users u ON b.author_id = u.id WHERE b.id = $1",
        BOOK_WITH_AUTHOR_COLUMNS
    );

    sqlx::query_as::<_, BookWithAuthor>(&query)
        .bind(book_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".into()))
}

/// Re-resolve the ambient caller's backing record by email.
///
/// Self-service operations use this; a record that vanished between token
/// validation and the lookup is a 404, not a server error.
pub async fn fetch_user_by_email(pool: &PgPool, email: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, firstname, lastname, email, phone_number, address, bio,
               password_hash, image_url, profile_image_public_id, gender, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found!".into()))
}
