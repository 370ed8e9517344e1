//! Author (user) profile endpoints.
//!
//! Listing, search, and lookup are public. Update and delete are
//! self-service: they always act on the ambient caller, never on a
//! caller-supplied target, so no separate ownership comparison is needed.

use rocket::State;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{FromForm, delete, get, put};
use rocket_db_pools::sqlx::{self, PgPool};
use rocket_okapi::openapi;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::media::{ImageKind, MediaClient};
use crate::models::{Gender, PaginatedResponse, User, UserDto};
use crate::routes::helpers::{fetch_user_by_email, read_image};
use crate::routes::params::{AuthorListParams, AuthorSearchParams};

const USER_COLUMNS: &str = "id, firstname, lastname, email, phone_number, address, bio, \
                            password_hash, image_url, profile_image_public_id, gender, created_at";

/// List all authors with pagination and whitelisted sorting.
#[openapi(tag = "Authors")]
#[get("/authors?<params..>")]
pub async fn list_authors(
    pool: &State<PgPool>,
    params: Option<AuthorListParams>,
) -> Result<Json<PaginatedResponse<UserDto>>, ApiError> {
    let params = params.unwrap_or_default();

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool.inner())
        .await?;

    let query = format!(
        "SELECT {} FROM users ORDER BY {} {} LIMIT $1 OFFSET $2",
        USER_COLUMNS,
        params.sort_column(),
        params.sort_order()
    );
    let rows = sqlx::query_as::<_, User>(&query)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool.inner())
        .await?;

    let authors: Vec<UserDto> = rows.into_iter().map(UserDto::from).collect();
    Ok(Json(PaginatedResponse::new(
        authors,
        params.page(),
        params.size(),
        total.0,
    )))
}

/// Keyword search across firstname, lastname, and email.
#[openapi(tag = "Authors")]
#[get("/authors/search?<params..>")]
pub async fn search_authors(
    pool: &State<PgPool>,
    params: AuthorSearchParams,
) -> Result<Json<PaginatedResponse<UserDto>>, ApiError> {
    let pattern = params.like_pattern();
    log::info!("searching authors with keyword: '{}'", params.keyword.trim());

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users \
         WHERE firstname ILIKE $1 OR lastname ILIKE $1 OR email ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(pool.inner())
    .await?;

    let query = format!(
        "SELECT {} FROM users \
         WHERE firstname ILIKE $1 OR lastname ILIKE $1 OR email ILIKE $1 \
         ORDER BY {} {} LIMIT $2 OFFSET $3",
        USER_COLUMNS,
        params.sort_column(),
        params.sort_order()
    );
    let rows = sqlx::query_as::<_, User>(&query)
        .bind(&pattern)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(pool.inner())
        .await?;

    let authors: Vec<UserDto> = rows.into_iter().map(UserDto::from).collect();
    Ok(Json(PaginatedResponse::new(
        authors,
        params.page(),
        params.size(),
        total.0,
    )))
}

/// Fetch a single author by id.
#[openapi(tag = "Authors")]
#[get("/authors/<author_id>")]
pub async fn get_author(
    pool: &State<PgPool>,
    author_id: Uuid,
) -> Result<Json<UserDto>, ApiError> {
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    let user = sqlx::query_as::<_, User>(&query)
        .bind(author_id)
        .fetch_optional(pool.inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found!".into()))?;

    Ok(Json(UserDto::from(user)))
}

/// Multipart profile update form; unset fields keep their current values.
#[derive(FromForm)]
pub struct UpdateUserRequest<'r> {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<Gender>,
    pub profile_image: Option<TempFile<'r>>,
}

/// Update the caller's own profile.
#[put("/authors/update", data = "<form>")]
pub async fn update_profile(
    user: AuthUser,
    pool: &State<PgPool>,
    media: &State<MediaClient>,
    form: Form<UpdateUserRequest<'_>>,
) -> Result<Json<UserDto>, ApiError> {
    log::info!("updating profile for: {}", user.email);

    // Re-resolve the backing record; the account may have vanished since the
    // token was validated.
    let current = fetch_user_by_email(pool.inner(), &user.email).await?;

    let mut request = form.into_inner();
    let image = read_image(request.profile_image.as_mut()).await?;
    let uploaded = match image {
        Some(image) => Some(media.upload(image, ImageKind::UserImage).await?),
        None => None,
    };
    let (image_url, public_id) = match uploaded {
        Some(img) => (Some(img.url), Some(img.public_id)),
        None => (None, None),
    };

    let firstname = request
        .firstname
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let lastname = request
        .lastname
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let phone_number = request
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let address = request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let bio = request.bio.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let query = format!(
        r#"
        UPDATE users SET
            firstname = COALESCE($2, firstname),
            lastname = COALESCE($3, lastname),
            phone_number = COALESCE($4, phone_number),
            address = COALESCE($5, address),
            bio = COALESCE($6, bio),
            gender = COALESCE($7, gender),
            image_url = COALESCE($8, image_url),
            profile_image_public_id = COALESCE($9, profile_image_public_id)
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    );
    let updated = sqlx::query_as::<_, User>(&query)
        .bind(current.id)
        .bind(firstname)
        .bind(lastname)
        .bind(phone_number)
        .bind(address)
        .bind(bio)
        .bind(request.gender)
        .bind(&image_url)
        .bind(&public_id)
        .fetch_one(pool.inner())
        .await?;

    log::info!("profile updated for: {}", updated.email);
    Ok(Json(UserDto::from(updated)))
}

/// Delete the caller's own account. Profile-image cleanup on the storage side
/// is best-effort; the account delete proceeds regardless, and the author's
/// books go with it.
#[delete("/authors/delete")]
pub async fn delete_account(
    user: AuthUser,
    pool: &State<PgPool>,
    media: &State<MediaClient>,
) -> Result<Status, ApiError> {
    log::info!("deleting account for: {}", user.email);

    let current = fetch_user_by_email(pool.inner(), &user.email).await?;

    if let Some(public_id) = &current.profile_image_public_id {
        if let Err(err) = media.delete(public_id).await {
            log::warn!("failed to delete profile image {}: {}", public_id, err);
        }
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(current.id)
        .execute(pool.inner())
        .await?;

    log::info!("account deleted for: {}", user.email);
    Ok(Status::NoContent)
}
