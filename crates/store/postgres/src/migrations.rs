use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Create the notes table and its expiration index if they do not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let notes_table = config.notes_table();
    let expiry_index = config.expiry_index();

    let create_notes = format!(
        "CREATE TABLE IF NOT EXISTS {notes_table} (
            id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
            content BYTEA NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            expires_at_time_zone TEXT NOT NULL,
            key_hash BYTEA NOT NULL
        )"
    );

    let create_index =
        format!("CREATE INDEX IF NOT EXISTS {expiry_index} ON {notes_table} (expires_at)");

    sqlx::query(&create_notes).execute(pool).await?;
    sqlx::query(&create_index).execute(pool).await?;

    tracing::debug!(table = %notes_table, "notes table ready");
    Ok(())
}
