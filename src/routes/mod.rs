//! HTTP route handlers grouped by resource domain.
//!
//! Each submodule corresponds to a logical area of the API (books, authors,
//! health) and exposes typed Rocket handlers. JSON handlers carry
//! `#[openapi]` annotations so `rocket_okapi` can derive an OpenAPI
//! document; multipart upload handlers are mounted without them.

pub mod authors;
pub mod books;
pub mod health;
pub(crate) mod helpers;
pub mod params;
