//! Query parameter helpers shared by multiple API route handlers.
//!
//! These structs and enums provide strongly-typed parsing for URL query
//! strings while exposing the metadata needed for OpenAPI generation via
//! `rocket_okapi`. Sort keys are whitelisted enums mapped to SQL columns, so
//! no user-supplied string ever reaches an ORDER BY clause.

use chrono::NaiveDate;
use rocket::form::{self, FromFormField, ValueField};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    1
}

const fn default_page_size() -> i64 {
    10
}

const MAX_PAGE_SIZE: i64 = 100;

fn default_sort_order() -> SortOrder {
    SortOrder::Asc
}

fn default_book_sort_field() -> BookSortField {
    BookSortField::Title
}

fn default_author_sort_field() -> AuthorSortField {
    AuthorSortField::Firstname
}

/// Wrapper for parsing ISO-8601 dates from form or query values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DateParam(pub NaiveDate);

impl<'r> FromFormField<'r> for DateParam {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        let trimmed = field.value.trim();
        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => Ok(DateParam(date)),
            Err(_) => Err(form::Error::validation(format!(
                "invalid date '{}', expected YYYY-MM-DD",
                field.value
            )))?,
        }
    }
}

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Asc
    }
}

impl SortOrder {
    /// Render the sort order as a SQL keyword.
    pub fn sql_keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl<'r> FromFormField<'r> for SortOrder {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        match field.value.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(form::Error::validation(format!(
                "invalid sort order '{other}'; expected 'asc' or 'desc'"
            ))
            .into()),
        }
    }
}

/// Sort keys accepted by the book listing and search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BookSortField {
    Title,
    Genre,
    Pages,
    PublishedAt,
    CreatedAt,
}

impl Default for BookSortField {
    fn default() -> Self {
        BookSortField::Title
    }
}

impl BookSortField {
    /// Name of the column used when ordering query results.
    pub fn sql_column(self) -> &'static str {
        match self {
            BookSortField::Title => "title",
            BookSortField::Genre => "genre",
            BookSortField::Pages => "pages",
            BookSortField::PublishedAt => "published_at",
            BookSortField::CreatedAt => "created_at",
        }
    }
}

impl<'r> FromFormField<'r> for BookSortField {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        match field.value {
            "title" => Ok(BookSortField::Title),
            "genre" => Ok(BookSortField::Genre),
            "pages" => Ok(BookSortField::Pages),
            "publishedAt" => Ok(BookSortField::PublishedAt),
            "createdAt" => Ok(BookSortField::CreatedAt),
            other => {
                Err(form::Error::validation(format!("invalid book sort key '{other}'")).into())
            }
        }
    }
}

/// Sort keys accepted by the author listing and search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum AuthorSortField {
    Firstname,
    Lastname,
    Email,
    CreatedAt,
}

impl Default for AuthorSortField {
    fn default() -> Self {
        AuthorSortField::Firstname
    }
}

impl AuthorSortField {
    /// Name of the column used when ordering query results.
    pub fn sql_column(self) -> &'static str {
        match self {
            AuthorSortField::Firstname => "firstname",
            AuthorSortField::Lastname => "lastname",
            AuthorSortField::Email => "email",
            AuthorSortField::CreatedAt => "created_at",
        }
    }
}

impl<'r> FromFormField<'r> for AuthorSortField {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        match field.value {
            "firstname" => Ok(AuthorSortField::Firstname),
            "lastname" => Ok(AuthorSortField::Lastname),
            "email" => Ok(AuthorSortField::Email),
            "createdAt" => Ok(AuthorSortField::CreatedAt),
            other => {
                Err(form::Error::validation(format!("invalid author sort key '{other}'")).into())
            }
        }
    }
}

/// Pagination and sorting for book listings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct BookListParams {
    /// One-based page index (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page (clamped between 1 and 100, default 10).
    #[field(default = 10)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    /// Sort column (defaults to `title`).
    #[field(name = "sort", default = BookSortField::Title)]
    #[serde(default = "default_book_sort_field")]
    pub sort: BookSortField,
    /// Sort direction (defaults to `asc`).
    #[field(default = SortOrder::Asc)]
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
}

impl Default for BookListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
            sort: default_book_sort_field(),
            order: default_sort_order(),
        }
    }
}

impl BookListParams {
    /// Normalized 1-based page index.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Normalized page size capped at [`MAX_PAGE_SIZE`].
    pub fn size(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    /// SQL column used for ordering.
    pub fn sort_column(&self) -> &'static str {
        self.sort.sql_column()
    }

    /// SQL keyword representing the sort direction.
    pub fn sort_order(&self) -> &'static str {
        self.order.sql_keyword()
    }
}

/// Keyword search over books, with the same paging contract as listings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchParams {
    /// Free-text term matched against title, genre, and author names.
    pub keyword: String,
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    #[field(default = 10)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    #[field(name = "sort", default = BookSortField::Title)]
    #[serde(default = "default_book_sort_field")]
    pub sort: BookSortField,
    #[field(default = SortOrder::Asc)]
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
}

impl BookSearchParams {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn size(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    pub fn sort_column(&self) -> &'static str {
        self.sort.sql_column()
    }

    pub fn sort_order(&self) -> &'static str {
        self.order.sql_keyword()
    }

    /// Trimmed keyword turned into a SQL LIKE pattern.
    pub fn like_pattern(&self) -> String {
        format!("%{}%", self.keyword.trim())
    }
}

/// Pagination and sorting for author listings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct AuthorListParams {
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    #[field(default = 10)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    #[field(name = "sort", default = AuthorSortField::Firstname)]
    #[serde(default = "default_author_sort_field")]
    pub sort: AuthorSortField,
    #[field(default = SortOrder::Asc)]
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
}

impl Default for AuthorListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
            sort: default_author_sort_field(),
            order: default_sort_order(),
        }
    }
}

impl AuthorListParams {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn size(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    pub fn sort_column(&self) -> &'static str {
        self.sort.sql_column()
    }

    pub fn sort_order(&self) -> &'static str {
        self.order.sql_keyword()
    }
}

/// Keyword search over authors.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSearchParams {
    /// Free-text term matched against firstname, lastname, and email.
    pub keyword: String,
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    #[field(default = 10)]
    #[serde(default = "default_page_size")]
    pub size: i64,
    #[field(name = "sort", default = AuthorSortField::Firstname)]
    #[serde(default = "default_author_sort_field")]
    pub sort: AuthorSortField,
    #[field(default = SortOrder::Asc)]
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
}

impl AuthorSearchParams {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn size(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    pub fn sort_column(&self) -> &'static str {
        self.sort.sql_column()
    }

    pub fn sort_order(&self) -> &'static str {
        self.order.sql_keyword()
    }

    pub fn like_pattern(&self) -> String {
        format!("%{}%", self.keyword.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::form::Form;

    #[test]
    fn parses_book_list_query() {
        let parsed: BookListParams = Form::parse("page=2&size=5&sort=publishedAt&order=desc").unwrap();
        assert_eq!(parsed.page(), 2);
        assert_eq!(parsed.size(), 5);
        assert_eq!(parsed.sort_column(), "published_at");
        assert_eq!(parsed.sort_order(), "DESC");

        let defaults: BookListParams = Form::parse("").unwrap();
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.size(), 10);
        assert_eq!(defaults.sort_column(), "title");
        assert_eq!(defaults.sort_order(), "ASC");
    }

    #[test]
    fn clamps_page_and_size() {
        let parsed: BookListParams = Form::parse("page=0&size=5000").unwrap();
        assert_eq!(parsed.page(), 1);
        assert_eq!(parsed.size(), 100);
        assert_eq!(parsed.offset(), 0);
    }

    #[test]
    fn rejects_unknown_sort_keys() {
        assert!(Form::<BookListParams>::parse("sort=passwordHash").is_err());
        assert!(Form::<AuthorListParams>::parse("sort=password_hash").is_err());
    }

    #[test]
    fn search_requires_a_keyword() {
        assert!(Form::<BookSearchParams>::parse("").is_err());

        let parsed: BookSearchParams = Form::parse("keyword=rust").unwrap();
        assert_eq!(parsed.like_pattern(), "%rust%");
    }

    #[test]
    fn parses_dates() {
        let parsed = DateParam::from_value(ValueField::from_value("2024-02-29")).unwrap();
        assert_eq!(parsed.0, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        assert!(DateParam::from_value(ValueField::from_value("29/02/2024")).is_err());
    }
}
