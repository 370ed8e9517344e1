//! Signup and credential verification, kept separate from token minting:
//! handlers ask this module *who* the caller is and mint tokens themselves.

use rocket_db_pools::sqlx::{self, PgPool};

use crate::auth::{AuthError, AuthResult, AuthState};
use crate::error::ApiError;
use crate::media::{ImageKind, ImageUpload, MediaClient};
use crate::models::{Gender, User, UserDto};

/// Registration payload after multipart parsing.
#[derive(Debug)]
pub struct NewAuthor {
    pub firstname: String,
    pub lastname: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub bio: Option<String>,
    pub password: String,
    pub gender: Option<Gender>,
    pub profile_image: Option<ImageUpload>,
}

/// Create a user account.
///
/// Email uniqueness is not checked up front; the store's unique constraint
/// reports a conflict after the fact, and [`ApiError::from`] turns it into a
/// 409. An image upload failure aborts the signup.
pub async fn signup(
    pool: &PgPool,
    state: &AuthState,
    media: &MediaClient,
    new_author: NewAuthor,
) -> Result<UserDto, ApiError> {
    log::info!("signing up author with email: {}", new_author.email);

    let password_hash = state
        .password_service
        .hash_password(&new_author.password)
        .map_err(ApiError::from)?;

    let uploaded = match new_author.profile_image {
        Some(image) => Some(media.upload(image, ImageKind::UserImage).await?),
        None => None,
    };
    let (image_url, public_id) = match uploaded {
        Some(img) => (Some(img.url), Some(img.public_id)),
        None => (None, None),
    };

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users
            (firstname, lastname, email, phone_number, address, bio,
             password_hash, image_url, profile_image_public_id, gender)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, firstname, lastname, email, phone_number, address, bio,
                  password_hash, image_url, profile_image_public_id, gender, created_at
        "#,
    )
    .bind(new_author.firstname.trim())
    .bind(new_author.lastname.as_deref().map(str::trim))
    .bind(new_author.email.trim())
    .bind(new_author.phone_number.trim())
    .bind(new_author.address.trim())
    .bind(new_author.bio.as_deref().map(str::trim))
    .bind(&password_hash)
    .bind(&image_url)
    .bind(&public_id)
    .bind(new_author.gender)
    .fetch_one(pool)
    .await
    .map_err(ApiError::from)?;

    log::info!("author created with id: {}", user.id);
    Ok(UserDto::from(user))
}

/// Verify credentials and return the matching user record.
///
/// Unknown email and wrong password both collapse into
/// [`AuthError::InvalidCredentials`]; callers cannot tell which part failed.
pub async fn authenticate(
    pool: &PgPool,
    state: &AuthState,
    email: &str,
    password: &str,
) -> AuthResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, firstname, lastname, email, phone_number, address, bio,
               password_hash, image_url, profile_image_public_id, gender, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let user = user.ok_or(AuthError::InvalidCredentials)?;

    if !state
        .password_service
        .verify_password(password, &user.password_hash)
    {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}
