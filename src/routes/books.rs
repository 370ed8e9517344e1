//! Book CRUD endpoints.
//!
//! Listing, search, and lookup are public. Creation requires an
//! authenticated caller, who becomes the book's immutable author; update and
//! delete additionally pass the ownership check against that author.

use rocket::State;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{FromForm, delete, get, post, put};
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;
use uuid::Uuid;

use crate::auth::ownership::{self, ResourceOwner};
use crate::auth::{AuthState, AuthUser};
use crate::error::ApiError;
use crate::media::{ImageKind, MediaClient};
use crate::models::{BookDto, BookWithAuthor, PaginatedResponse};
use crate::routes::helpers::{book_with_author_columns, fetch_book_with_author, read_image};
use crate::routes::params::{BookListParams, BookSearchParams, DateParam};

/// List all books with pagination and whitelisted sorting.
#[openapi(tag = "Books")]
#[get("/books?<params..>")]
pub async fn list_books(
    pool: &State<PgPool>,
    params: Option<BookListParams>,
) -> Result<Json<PaginatedResponse<BookDto>>, ApiError> {
    let params = params.unwrap_or_default();

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
        .fetch_one(pool.inner())
        .await?;

    let query = format!(
        "SELECT {} FROM books b JOIN users u ON b.author_id = u.id \
         ORDER BY b.{} {} LIMIT $1 OFFSET $2",
        book_with_author_columns(),
        params.sort_column(),
        params.sort_order()
    );
    let rows = sqlx::query_as::<_, BookWithAuthor>(&query)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool.inner())
        .await?;

    let books: Vec<BookDto> = rows.into_iter().map(BookDto::from).collect();
    Ok(Json(PaginatedResponse::new(
        books,
        params.page(),
        params.size(),
        total.0,
    )))
}

/// Keyword search across title, genre, and author names.
#[openapi(tag = "Books")]
#[get("/books/search?<params..>")]
pub async fn search_books(
    pool: &State<PgPool>,
    params: BookSearchParams,
) -> Result<Json<PaginatedResponse<BookDto>>, ApiError> {
    let pattern = params.like_pattern();
    log::info!("searching books with keyword: '{}'", params.keyword.trim());

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM books b
        JOIN users u ON b.author_id = u.id
        WHERE b.title ILIKE $1 OR b.genre ILIKE $1
           OR u.firstname ILIKE $1 OR u.lastname ILIKE $1
        "#,
    )
    .bind(&pattern)
    .fetch_one(pool.inner())
    .await?;

    let query = format!(
        "SELECT {} FROM books b JOIN users u ON b.author_id = u.id \
         WHERE b.title ILIKE $1 OR b.genre ILIKE $1 \
            OR u.firstname ILIKE $1 OR u.lastname ILIKE $1 \
         ORDER BY b.{} {} LIMIT $2 OFFSET $3",
        book_with_author_columns(),
        params.sort_column(),
        params.sort_order()
    );
    let rows = sqlx::query_as::<_, BookWithAuthor>(&query)
        .bind(&pattern)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool.inner())
        .await?;

    let books: Vec<BookDto> = rows.into_iter().map(BookDto::from).collect();
    Ok(Json(PaginatedResponse::new(
        books,
        params.page(),
        params.size(),
        total.0,
    )))
}

/// List the books written by one author.
#[openapi(tag = "Books")]
#[get("/books/author/<author_id>?<params..>")]
pub async fn books_by_author(
    pool: &State<PgPool>,
    author_id: Uuid,
    params: Option<BookListParams>,
) -> Result<Json<PaginatedResponse<BookDto>>, ApiError> {
    let params = params.unwrap_or_default();

    let author: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(author_id)
        .fetch_optional(pool.inner())
        .await?;
    if author.is_none() {
        return Err(ApiError::NotFound("Author not found".into()));
    }

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool.inner())
        .await?;

    let query = format!(
        "SELECT {} FROM books b JOIN users u ON b.author_id = u.id \
         WHERE b.author_id = $1 ORDER BY b.{} {} LIMIT $2 OFFSET $3",
        book_with_author_columns(),
        params.sort_column(),
        params.sort_order()
    );
    let rows = sqlx::query_as::<_, BookWithAuthor>(&query)
        .bind(author_id)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool.inner())
        .await?;

    let books: Vec<BookDto> = rows.into_iter().map(BookDto::from).collect();
    Ok(Json(PaginatedResponse::new(
        books,
        params.page(),
        params.size(),
        total.0,
    )))
}

/// Fetch a single book by id.
#[openapi(tag = "Books")]
#[get("/books/<book_id>")]
pub async fn get_book(
    pool: &State<PgPool>,
    book_id: Uuid,
) -> Result<Json<BookDto>, ApiError> {
    let book = fetch_book_with_author(pool.inner(), book_id).await?;
    Ok(Json(BookDto::from(book)))
}

/// Multipart creation form; the cover image is optional.
#[derive(FromForm)]
pub struct CreateBookRequest<'r> {
    #[field(validate = len(1..=300))]
    pub title: String,
    pub description: Option<String>,
    #[field(validate = len(1..=100))]
    pub genre: String,
    #[field(validate = range(1..))]
    pub pages: i32,
    pub published_at: DateParam,
    #[field(validate = len(1..=32))]
    pub isbn: String,
    pub cover_image: Option<TempFile<'r>>,
}

/// Create a book owned by the caller.
#[post("/books", data = "<form>")]
pub async fn create_book(
    user: AuthUser,
    pool: &State<PgPool>,
    media: &State<MediaClient>,
    form: Form<CreateBookRequest<'_>>,
) -> Result<status::Created<Json<BookDto>>, ApiError> {
    log::info!("creating book '{}' for author: {}", form.title, user.email);

    let mut request = form.into_inner();
    let cover = read_image(request.cover_image.as_mut()).await?;
    let uploaded = match cover {
        Some(image) => Some(media.upload(image, ImageKind::BookCover).await?),
        None => None,
    };
    let (cover_url, cover_public_id) = match uploaded {
        Some(img) => (Some(img.url), Some(img.public_id)),
        None => (None, None),
    };

    let book_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO books
            (title, description, genre, pages, published_at, isbn,
             cover_image_url, cover_image_public_id, author_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(request.title.trim())
    .bind(request.description.as_deref().map(str::trim))
    .bind(request.genre.trim())
    .bind(request.pages)
    .bind(request.published_at.0)
    .bind(request.isbn.trim())
    .bind(&cover_url)
    .bind(&cover_public_id)
    .bind(user.id)
    .fetch_one(pool.inner())
    .await?;

    log::info!("book created with id: {}", book_id);

    let book = fetch_book_with_author(pool.inner(), book_id).await?;
    let location = format!("/bookstore/books/{book_id}");
    Ok(status::Created::new(location).body(Json(BookDto::from(book))))
}

/// Multipart update form; unset fields keep their current values.
#[derive(FromForm)]
pub struct UpdateBookRequest<'r> {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub pages: Option<i32>,
    pub published_at: Option<DateParam>,
    pub isbn: Option<String>,
    pub cover_image: Option<TempFile<'r>>,
}

/// Update a book. Only its author may do this.
#[put("/books/<book_id>", data = "<form>")]
pub async fn update_book(
    user: AuthUser,
    state: &State<AuthState>,
    pool: &State<PgPool>,
    media: &State<MediaClient>,
    book_id: Uuid,
    form: Form<UpdateBookRequest<'_>>,
) -> Result<Json<BookDto>, ApiError> {
    let book = fetch_book_with_author(pool.inner(), book_id).await?;

    ownership::assert_owner(
        ResourceOwner {
            id: book.author_id,
            email: &book.author_email,
        },
        &user,
        state.config.ownership_mode,
        "You are not allowed to update this book!",
    )?;

    let mut request = form.into_inner();
    let cover = read_image(request.cover_image.as_mut()).await?;
    let uploaded = match cover {
        Some(image) => Some(media.upload(image, ImageKind::BookCover).await?),
        None => None,
    };
    let (cover_url, cover_public_id) = match uploaded {
        Some(img) => (Some(img.url), Some(img.public_id)),
        None => (None, None),
    };

    let title = request.title.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let genre = request
        .genre
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let pages = request.pages.filter(|p| *p > 0);
    let published_at = request.published_at.map(|d| d.0);
    let isbn = request.isbn.as_deref().map(str::trim).filter(|s| !s.is_empty());

    sqlx::query(
        r#"
        UPDATE books SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            genre = COALESCE($4, genre),
            pages = COALESCE($5, pages),
            published_at = COALESCE($6, published_at),
            isbn = COALESCE($7, isbn),
            cover_image_url = COALESCE($8, cover_image_url),
            cover_image_public_id = COALESCE($9, cover_image_public_id)
        WHERE id = $1
        "#,
    )
    .bind(book_id)
    .bind(title)
    .bind(description)
    .bind(genre)
    .bind(pages)
    .bind(published_at)
    .bind(isbn)
    .bind(&cover_url)
    .bind(&cover_public_id)
    .execute(pool.inner())
    .await?;

    log::info!("book updated: {}", book_id);

    let updated = fetch_book_with_author(pool.inner(), book_id).await?;
    Ok(Json(BookDto::from(updated)))
}

/// Delete a book. Only its author may do this; cover-image cleanup on the
/// storage side is best-effort and never blocks the delete.
#[delete("/books/<book_id>")]
pub async fn delete_book(
    user: AuthUser,
    state: &State<AuthState>,
    pool: &State<PgPool>,
    media: &State<MediaClient>,
    book_id: Uuid,
) -> Result<Status, ApiError> {
    let book = fetch_book_with_author(pool.inner(), book_id).await?;

    ownership::assert_owner(
        ResourceOwner {
            id: book.author_id,
            email: &book.author_email,
        },
        &user,
        state.config.ownership_mode,
        "You are not allowed to delete this book!",
    )?;

    if let Some(public_id) = &book.cover_image_public_id {
        if let Err(err) = media.delete(public_id).await {
            log::warn!("failed to delete cover image {}: {}", public_id, err);
        }
    }

    sqlx::query("DELETE FROM books WHERE id = $1")
        .bind(book_id)
        .execute(pool.inner())
        .await?;

    log::info!("book deleted: {}", book_id);
    Ok(Status::NoContent)
}
