use rocket_db_pools::{sqlx, Database};

/// Primary PostgreSQL pool, configured under `databases.ticket_db` in the Rocket figment.
#[derive(Database)]
#[database("ticket_db")]
pub struct TicketDb(sqlx::PgPool);

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Applies pending schema migrations for `users` and `revoked_tokens`.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
