//! Persistence layer for the Reelvault media manager.
//!
//! Provides SQLite connection pooling (via `r2d2`), the relational schema
//! for the movie library, entity store functions, and the sequential
//! migration engine that upgrades on-disk databases written by earlier
//! releases.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: a media manager runs on a single machine
//!   next to its library; no external database process wanted.
//! - **Version rows, not a version counter**: the `DbVersion` table keeps
//!   one row per version ever applied; the current version is
//!   `MAX(version)`. Rows are only added, so the recorded version can
//!   never move backwards.
//! - **Introspection over probing**: schema state is read from
//!   `sqlite_master`/`pragma_table_info`, never inferred from a failing
//!   query.
//! - **One transaction per migration step**: data transformations and
//!   version stamps commit together, so an interrupted upgrade resumes
//!   cleanly at the next start.

use std::path::{Path, PathBuf};

mod error;
mod migrations;
mod pool;
mod schema;

pub mod history;
pub mod movies;
pub mod qualities;
pub mod queue;

pub use error::StoreError;
pub use migrations::{current_version, upgrade, MigrationError, LATEST_VERSION};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use qualities::seed_defaults;
pub use schema::{column_exists, create_all, table_exists};

/// Database file name, resolved against the process working directory.
pub const DB_FILE_NAME: &str = "data.db";

/// Default database location: [`DB_FILE_NAME`] in the current working
/// directory.
pub fn default_db_path() -> std::io::Result<PathBuf> {
    Ok(std::env::current_dir()?.join(DB_FILE_NAME))
}

/// Errors that can occur during database initialization.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The connection pool could not be created.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// No connection could be acquired from the pool.
    #[error("failed to acquire a database connection: {0}")]
    Acquire(#[from] r2d2::Error),

    /// Schema setup failed.
    #[error("schema setup failed: {0}")]
    Schema(#[from] rusqlite::Error),

    /// Seeding the default quality templates failed.
    #[error("failed to seed default qualities: {0}")]
    Seed(#[from] StoreError),

    /// A migration step failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Opens (or creates) the database and brings it fully up to date.
///
/// Called once at startup, before anything else touches storage. If no
/// database file exists yet this is a fresh install: the schema is
/// materialized, reference data is seeded, and every version through
/// [`LATEST_VERSION`] is stamped as applied, since a fresh install has no
/// migration history to replay. If the file exists, any missing tables are
/// created (non-destructively) and [`upgrade`] applies whatever migration
/// steps the database is missing.
///
/// Returns the connection pool for the host application to keep.
///
/// # Errors
///
/// Fails only if the underlying storage is unreachable or a migration step
/// fails; see [`InitError`].
pub fn initialize(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, InitError> {
    // The file's existence is the sole signal distinguishing a fresh
    // install from an upgrade.
    let fresh = db_path == ":memory:" || !Path::new(db_path).exists();

    tracing::info!(path = db_path, fresh, "initializing database");

    let db_pool = create_pool(db_path, settings)?;
    let conn = db_pool.get()?;

    schema::create_all(&conn)?;
    qualities::seed_defaults(&conn)?;

    if fresh {
        migrations::stamp_through(&conn, LATEST_VERSION)?;
    } else {
        migrations::upgrade(&conn)?;
    }

    Ok(db_pool)
}
