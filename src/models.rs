use chrono::{DateTime, NaiveDate, Utc};
use rocket::form::{self, FromFormField, ValueField};
use rocket_db_pools::sqlx::FromRow;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Entities =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl<'r> FromFormField<'r> for Gender {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        match field.value.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(form::Error::validation(format!(
                "invalid gender '{other}'; expected 'male' or 'female'"
            ))
            .into()),
        }
    }
}

/// A user row. The password hash never leaves this struct: every outbound
/// representation goes through [`UserDto`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub bio: Option<String>,
    pub password_hash: String,
    pub image_url: Option<String>,
    pub profile_image_public_id: Option<String>,
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
}

/// A book row joined with its author, as produced by the list queries.
#[derive(Debug, Clone, FromRow)]
pub struct BookWithAuthor {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub genre: String,
    pub pages: i32,
    pub published_at: NaiveDate,
    pub isbn: String,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_firstname: String,
    pub author_lastname: Option<String>,
    pub author_email: String,
    pub author_phone_number: String,
    pub author_address: String,
    pub author_bio: Option<String>,
    pub author_image_url: Option<String>,
    pub author_gender: Option<Gender>,
    pub author_created_at: DateTime<Utc>,
}

// ===== Outbound representations =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            phone_number: user.phone_number,
            address: user.address,
            bio: user.bio,
            image_url: user.image_url,
            gender: user.gender,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub genre: String,
    pub pages: i32,
    pub published_at: NaiveDate,
    pub isbn: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: UserDto,
}

impl From<BookWithAuthor> for BookDto {
    fn from(row: BookWithAuthor) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            genre: row.genre,
            pages: row.pages,
            published_at: row.published_at,
            isbn: row.isbn,
            cover_image_url: row.cover_image_url,
            created_at: row.created_at,
            author: UserDto {
                id: row.author_id,
                firstname: row.author_firstname,
                lastname: row.author_lastname,
                email: row.author_email,
                phone_number: row.author_phone_number,
                address: row.author_address,
                bio: row.author_bio,
                image_url: row.author_image_url,
                gender: row.author_gender,
                created_at: row.author_created_at,
            },
        }
    }
}

/// Standard page envelope for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub empty: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        let empty = content.is_empty();
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            empty,
        }
    }
}
