use rocket_db_pools::{Database, sqlx};

#[derive(Database)]
#[database("bookstore_db")]
pub struct BookstoreDb(sqlx::PgPool);

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply pending schema migrations. Runs from an ignition fairing so a broken
/// schema aborts launch instead of failing on the first query.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
