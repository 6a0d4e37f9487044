use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates a PostgreSQL connection pool for the named store.
/// The pipeline is sequential, so a couple of connections is plenty.
pub async fn create_pool(store: &str, database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to PostgreSQL ({store} store)...");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established ({store} store)");
    Ok(pool)
}
