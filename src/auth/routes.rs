use chrono::{DateTime, Utc};
use rocket::State;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{FromForm, post};
use rocket_db_pools::sqlx::PgPool;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::service::{self, NewAuthor};
use crate::auth::AuthState;
use crate::error::ApiError;
use crate::media::MediaClient;
use crate::models::{Gender, UserDto};
use crate::routes::helpers::read_image;

/// Multipart registration form. The profile image rides along as an optional
/// file part and is forwarded to the image storage service.
#[derive(FromForm)]
pub struct RegisterRequest<'r> {
    #[field(validate = len(1..=100))]
    pub firstname: String,
    pub lastname: Option<String>,
    #[field(validate = contains('@'))]
    pub email: String,
    #[field(validate = len(9..=16))]
    pub phone_number: String,
    #[field(validate = len(1..=200))]
    pub address: String,
    pub bio: Option<String>,
    #[field(validate = len(6..))]
    pub password: String,
    pub gender: Option<Gender>,
    pub profile_image: Option<TempFile<'r>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub email: String,
    pub user: UserDto,
}

/// Register a new author account. Duplicate emails surface as 409 from the
/// store's unique constraint rather than a pre-flight check.
#[post("/auth/signup", data = "<form>")]
pub async fn signup(
    state: &State<AuthState>,
    pool: &State<PgPool>,
    media: &State<MediaClient>,
    form: Form<RegisterRequest<'_>>,
) -> Result<status::Created<Json<UserDto>>, ApiError> {
    let mut request = form.into_inner();
    let profile_image = read_image(request.profile_image.as_mut()).await?;

    let new_author = NewAuthor {
        firstname: request.firstname,
        lastname: request.lastname,
        email: request.email,
        phone_number: request.phone_number,
        address: request.address,
        bio: request.bio,
        password: request.password,
        gender: request.gender,
        profile_image,
    };

    let user = service::signup(pool, state, media, new_author).await?;
    let location = format!("/bookstore/authors/{}", user.id);
    Ok(status::Created::new(location).body(Json(user)))
}

/// Exchange credentials for a bearer token. Token minting stays here in the
/// handler; the service only verifies who the caller is.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    pool: &State<PgPool>,
    payload: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim();
    let password = payload.password.trim();

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    }

    let user = service::authenticate(pool, state, email, password).await?;
    let signed = state.jwt_service.issue(&user.email)?;

    log::info!("login succeeded for: {}", user.email);

    Ok(Json(LoginResponse {
        token: signed.token,
        expires_at: signed.expires_at,
        email: user.email.clone(),
        user: user.into(),
    }))
}
