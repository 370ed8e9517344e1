use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_db_pools::sqlx::{self, Row};
use rocket_okapi::request::OpenApiFromRequest;
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, AuthState};

/// Caller identity resolved from the bearer token for the current request.
///
/// Used as a request guard on endpoints that require authentication: requests
/// without a usable identity are rejected before the handler runs.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Optional caller identity for endpoints that are also open to anonymous
/// requests. A missing `Authorization` header is not an error; a token that
/// fails verification still is.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct MaybeUser(pub Option<AuthUser>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_caller(request).await {
            Ok(Some(user)) => Outcome::Success(user),
            Ok(None) => Outcome::Error((Status::Unauthorized, AuthError::AccessDenied)),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MaybeUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match resolve_caller(request).await {
            Ok(user) => Outcome::Success(MaybeUser(user)),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

/// Single-pass identity resolution for an inbound request.
///
/// `Ok(None)` means the request proceeds anonymously: either no bearer token
/// was presented, or the token verified but no longer matches the resolved
/// record's email. `Err` means the pipeline must stop: the token failed
/// verification, or its subject has no backing user record.
async fn resolve_caller(request: &Request<'_>) -> AuthResult<Option<AuthUser>> {
    let header = request.headers().get_one("Authorization");
    let Some(token) = header.and_then(bearer_token) else {
        return Ok(None);
    };

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let subject = auth_state.jwt_service.extract_subject(token)?;

    let pool = request
        .guard::<&State<sqlx::PgPool>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("database pool missing from state".into()))?;

    let row = sqlx::query("SELECT id, email FROM users WHERE email = $1")
        .bind(&subject)
        .fetch_optional(pool.inner())
        .await?;

    let row = row.ok_or_else(|| AuthError::NotFound("User not found!".into()))?;
    let id: Uuid = row.try_get("id")?;
    let email: String = row.try_get("email")?;

    // Subject mismatch after an otherwise valid extraction degrades the
    // request to anonymous rather than rejecting it.
    if auth_state.jwt_service.validate(token, &email) {
        Ok(Some(AuthUser { id, email }))
    } else {
        Ok(None)
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bearer_prefix() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token(""), None);
    }
}
