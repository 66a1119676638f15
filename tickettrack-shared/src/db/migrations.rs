/// Schema migrations
///
/// Migrations live in `migrations/` at the workspace root and are embedded at
/// compile time with `sqlx::migrate!`. They are applied on API startup when
/// the PostgreSQL backend is selected.
///
/// # Example
///
/// ```no_run
/// use tickettrack_shared::db::migrations::{ensure_database_exists, run_migrations};
/// use sqlx::PgPool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = std::env::var("DATABASE_URL")?;
/// ensure_database_exists(&url).await?;
///
/// let pool = PgPool::connect(&url).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applied-migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied_migrations: usize,
    pub latest_version: Option<i64>,
}

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("../migrations").run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database migrations up to date");
    Ok(())
}

/// Reads the sqlx bookkeeping table
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("No migrations applied yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: usize::try_from(count).unwrap_or_default(),
        latest_version,
    })
}

/// Creates the database named in `database_url` if it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    const INITIAL_SCHEMA: &str =
        include_str!("../../../migrations/20250101000001_initial_schema.sql");

    #[test]
    fn test_schema_defines_reported_constraints() {
        // Names the memory store reports in `StoreError::Conflict`
        for name in [
            "users_email_key",
            "board_invitations_pending_email_key",
            "tickets_board_id_ticket_number_key",
        ] {
            assert!(INITIAL_SCHEMA.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_schema_enum_checks_match_models() {
        assert!(INITIAL_SCHEMA
            .contains("CHECK (status IN ('in process', 'ready', 'completed'))"));
        assert!(INITIAL_SCHEMA
            .contains("CHECK (priority IN ('low', 'medium', 'high', 'urgent'))"));
        assert!(INITIAL_SCHEMA
            .contains("CHECK (status IN ('pending', 'accepted', 'declined'))"));
        assert_eq!(INITIAL_SCHEMA.matches("seq BIGSERIAL").count(), 3);
    }
}
