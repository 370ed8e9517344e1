#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod request_logger;
pub mod routes;

use crate::auth::AuthState;
use crate::db::BookstoreDb;
use crate::media::{MediaClient, MediaConfig};
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Patch,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(BookstoreDb::init())
        .attach(cors)
        // Run database migrations on startup
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            match BookstoreDb::fetch(&rocket) {
                Some(database) => {
                    let pool = (**database).clone();
                    match db::run_migrations(&pool).await {
                        Ok(_) => {
                            log::info!("database migrations successful");
                            Ok(rocket)
                        }
                        Err(e) => {
                            log::error!("database migrations failed: {}", e);
                            Err(rocket)
                        }
                    }
                }
                None => {
                    log::error!("database pool not available for migrations");
                    Err(rocket)
                }
            }
        }))
        // Clone and manage the pool so request guards and handlers can take
        // `&State<PgPool>` without going through the `Connection` guard.
        .attach(AdHoc::try_on_ignite("Manage DB Pool", |rocket| async move {
            match BookstoreDb::fetch(&rocket) {
                Some(database) => {
                    let pool = (**database).clone();
                    Ok(rocket.manage(pool))
                }
                None => Err(rocket),
            }
        }))
        // A missing or malformed signing secret aborts launch here.
        .attach(AdHoc::try_on_ignite("Auth State", |rocket| async move {
            match AuthState::from_env() {
                Ok(state) => Ok(rocket.manage(state)),
                Err(err) => {
                    log::error!("auth configuration invalid: {}", err);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite(
            "Image Storage Client",
            |rocket| async move {
                match MediaClient::new(MediaConfig::from_env()) {
                    Ok(client) => Ok(rocket.manage(client)),
                    Err(err) => {
                        log::error!("failed to initialize image storage client: {}", err);
                        Err(rocket)
                    }
                }
            },
        ))
        .mount(
            "/bookstore",
            openapi_get_routes![
                // Health routes
                routes::health::health_check,
                // Auth routes
                auth::routes::login,
                // Book routes
                routes::books::list_books,
                routes::books::search_books,
                routes::books::books_by_author,
                routes::books::get_book,
                // Author routes
                routes::authors::list_authors,
                routes::authors::search_authors,
                routes::authors::get_author,
            ],
        )
        // Multipart and bare-status handlers are outside the OpenAPI document.
        .mount(
            "/bookstore",
            routes![
                auth::routes::signup,
                routes::books::create_book,
                routes::books::update_book,
                routes::books::delete_book,
                routes::authors::update_profile,
                routes::authors::delete_account,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../../bookstore/openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new(
                        "Bookstore API",
                        "../../../bookstore/openapi.json",
                    )],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::{self, PgPool};
    use uuid::Uuid;

    use crate::auth::AuthState;
    use crate::media::{MediaClient, MediaConfig};

    pub use database::{TestDatabase, TestDatabaseError};

    /// Convenience helpers for seeding users and books in tests.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        /// Create a fixture helper bound to the provided pool.
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a user row, returning the new user id.
        pub async fn insert_user(
            &self,
            email: &str,
            firstname: &str,
            password_hash: &str,
        ) -> Result<Uuid, sqlx::Error> {
            sqlx::query_scalar(
                r#"
                INSERT INTO users (firstname, email, phone_number, address, password_hash)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(firstname)
            .bind(email)
            .bind("+256700000000")
            .bind("Kampala")
            .bind(password_hash)
            .fetch_one(self.pool)
            .await
        }

        /// Insert a book row owned by `author_id`, returning the book id.
        pub async fn insert_book(
            &self,
            author_id: Uuid,
            title: &str,
            genre: &str,
        ) -> Result<Uuid, sqlx::Error> {
            sqlx::query_scalar(
                r#"
                INSERT INTO books (title, genre, pages, published_at, isbn, author_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(title)
            .bind(genre)
            .bind(200)
            .bind(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
            .bind("978-0000000000")
            .bind(author_id)
            .fetch_one(self.pool)
            .await
        }
    }

    pub mod database {
        use rocket_db_pools::sqlx::postgres::PgPoolOptions;
        use rocket_db_pools::sqlx::{self, PgPool};
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;

        static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Ephemeral database factory for integration tests: a disposable
        /// Postgres container with migrations applied.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Provision a fresh database in a disposable Postgres container.
            ///
            /// Errors with [`TestDatabaseError::Container`] when no container
            /// runtime is reachable; tests treat that as a skip.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    container: Some(container),
                })
            }

            /// Connection pool for use in tests and Rocket state.
            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            /// Convenience method returning a clone of the pooled handle.
            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and discard the container.
            pub async fn close(mut self) {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration
    /// tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        pg_pool: Option<PgPool>,
        auth_state: Option<AuthState>,
        media_client: Option<MediaClient>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging off.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                pg_pool: None,
                auth_state: None,
                media_client: None,
            }
        }

        /// Mount routes under `/bookstore`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/bookstore".to_string(), routes));
            self
        }

        /// Manage a `PgPool` for tests that exercise database-backed routes.
        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        /// Manage auth state so identity guards and auth routes resolve.
        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        /// Manage an image storage client (pointed at an unreachable default
        /// unless overridden; routes only touch it when an image is sent).
        pub fn manage_media_client(mut self, client: MediaClient) -> Self {
            self.media_client = Some(client);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }
            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }
            if let Some(client) = self.media_client {
                rocket = rocket.manage(client);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }

    /// A media client pointed at a closed local port; good enough for flows
    /// that never attach an image.
    pub fn unreachable_media_client() -> MediaClient {
        MediaClient::new(MediaConfig {
            base_url: "http://127.0.0.1:1/media".into(),
        })
        .expect("media client")
    }
}
