//! Sequential schema migration engine.
//!
//! The schema history is a short, fixed ladder of version numbers. Applied
//! versions are tracked as rows in the `DbVersion` table, one row per
//! version ever applied, with the current version being `MAX(version)`.
//! Each migration step runs exactly once: inside a single transaction, its
//! data transformations commit atomically with its version stamps, so a
//! crash mid-step leaves the database cleanly at the previous version.
//!
//! Schema state is always detected through catalog introspection
//! (`sqlite_master`, `pragma_table_info`), never by attempting a query and
//! interpreting the error. The sub-steps of a version carry their own
//! introspection guards so that databases left half-migrated by earlier
//! releases (which had no transaction) still resume safely.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::schema;
use reelvault_types::MovieStatus;

/// Highest schema version this build knows about.
pub const LATEST_VERSION: i64 = 2;

/// A single versioned migration step.
///
/// `apply` takes a database that satisfies version `version - 1` to
/// `version`. It runs inside the transaction `upgrade` opens for it.
struct Migration {
    version: i64,
    apply: fn(&Connection) -> Result<(), rusqlite::Error>,
}

/// All migration steps in version order. New steps are appended here.
///
/// Version 1 is the initial schema and has no step: `schema::create_all`
/// materializes it.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    apply: migrate_to_v2,
}];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A statement within a migration step failed.
    #[error("migration to version {version} failed: {source}")]
    StepFailed {
        /// The version the failing step was migrating to.
        version: i64,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to read or record migration state.
    #[error("failed to access migration state: {0}")]
    StateAccess(#[from] rusqlite::Error),
}

/// Brings an existing database up to [`LATEST_VERSION`].
///
/// Reads the highest recorded version; if it already equals the latest,
/// this is a no-op. Otherwise every step whose version row is absent runs,
/// in order, each in its own transaction. Returns the number of steps
/// applied.
///
/// Safe to call repeatedly: a second run on the same database applies
/// nothing and changes nothing.
///
/// # Errors
///
/// Returns `MigrationError` if a step fails or migration state cannot be
/// read. An error aborts the run at the step that failed; already-committed
/// steps stay applied.
pub fn upgrade(conn: &Connection) -> Result<usize, MigrationError> {
    // Bootstrap for databases too old to carry the version table at all.
    conn.execute_batch("CREATE TABLE IF NOT EXISTS DbVersion (version INTEGER PRIMARY KEY);")?;

    let current = current_version(conn)?;
    if current >= LATEST_VERSION {
        tracing::debug!(version = current, "database schema is up to date");
        return Ok(0);
    }

    let mut applied = 0;

    for step in MIGRATIONS {
        if version_applied(conn, step.version)? {
            tracing::debug!(version = step.version, "migration already applied, skipping");
            continue;
        }

        tracing::info!(version = step.version, "upgrading database");

        let tx = conn.unchecked_transaction()?;

        (step.apply)(&tx).map_err(|e| MigrationError::StepFailed {
            version: step.version,
            source: e,
        })?;

        // Stamp the step's own version and back-fill any missing
        // predecessors: a stamped version implies all earlier versions are
        // stamped. (Version 1 was historically never stamped on upgraded
        // installs.)
        stamp_through(&tx, step.version).map_err(|e| MigrationError::StepFailed {
            version: step.version,
            source: e,
        })?;

        tx.commit().map_err(|e| MigrationError::StepFailed {
            version: step.version,
            source: e,
        })?;

        applied += 1;
    }

    Ok(applied)
}

/// Returns the highest recorded schema version, or 0 for none.
pub fn current_version(conn: &Connection) -> Result<i64, MigrationError> {
    let max: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM DbVersion", [], |row| row.get(0))?;
    Ok(max.unwrap_or(0))
}

/// Returns whether a `DbVersion` row exists for exactly this version.
fn version_applied(conn: &Connection, version: i64) -> Result<bool, MigrationError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM DbVersion WHERE version = ?1)",
        [version],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Ensures a `DbVersion` row exists for every version from 1 through
/// `version`. Rows are only ever added, never updated or deleted.
pub fn stamp_through(conn: &Connection, version: i64) -> Result<(), rusqlite::Error> {
    for nr in 1..=version {
        conn.execute("INSERT OR IGNORE INTO DbVersion (version) VALUES (?1)", [nr])?;
    }
    Ok(())
}

/// Version 2: queue-based download tracking.
///
/// Replaces the old feed/history design with `MovieQueue`, renames
/// `RenameHistory.movieId` to `movieQueue`, and synthesizes a queue entry
/// for every existing movie.
fn migrate_to_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Superseded by MovieQueue and RenameHistory.
    for table in ["Feed", "History"] {
        if schema::table_exists(conn, table)? {
            conn.execute_batch(&format!("DROP TABLE {table}"))?;
            tracing::info!(table, "dropped obsolete table");
        } else {
            tracing::debug!(table, "obsolete table not present");
        }
    }

    rebuild_rename_history(conn)?;
    backfill_movie_queues(conn)?;

    Ok(())
}

/// Renames `RenameHistory.movieId` to `movieQueue` via a full table
/// rebuild, the portable SQLite way to change a column.
///
/// After the rebuild the `movieQueue` column still holds *movie* ids; the
/// backfill pass repoints them at real queue rows.
fn rebuild_rename_history(conn: &Connection) -> Result<(), rusqlite::Error> {
    if !schema::table_exists(conn, "RenameHistory")? {
        // Nothing to rebuild; create_all materializes the current layout.
        tracing::debug!("RenameHistory not present, skipping rebuild");
        return Ok(());
    }
    if schema::column_exists(conn, "RenameHistory", "movieQueue")? {
        tracing::debug!("RenameHistory.movieQueue already present");
        return Ok(());
    }

    conn.execute_batch(
        r#"
        CREATE TABLE RenameHistoryBackup (id INTEGER, movieId INTEGER, old TEXT, new TEXT);
        INSERT INTO RenameHistoryBackup SELECT id, movieId, old, new FROM RenameHistory;
        DROP TABLE RenameHistory;
        CREATE TABLE RenameHistory (
            id INTEGER PRIMARY KEY,
            movieQueue INTEGER REFERENCES MovieQueue(id),
            old TEXT,
            new TEXT
        );
        INSERT INTO RenameHistory SELECT id, movieId, old, new FROM RenameHistoryBackup;
        DROP TABLE RenameHistoryBackup;
        "#,
    )?;

    tracing::info!("added movieQueue column to RenameHistory");
    Ok(())
}

/// Synthesizes one `MovieQueue` entry per movie and repoints each movie's
/// rename history at it.
///
/// A movie that already has any queue entry is treated as fully processed
/// and skipped, which is what makes re-running this step safe.
fn backfill_movie_queues(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Snapshot the first history row per referenced movie id before any
    // queue ids are handed out, so a freshly assigned queue id can never be
    // mistaken for a movie id.
    let mut histories: HashMap<i64, (i64, String)> = HashMap::new();
    {
        let mut stmt = conn.prepare("SELECT id, movieQueue, old FROM RenameHistory ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (id, movie_ref, old) = row?;
            if let (Some(movie_ref), Some(old)) = (movie_ref, old) {
                histories.entry(movie_ref).or_insert((id, old));
            }
        }
    }

    let movies: Vec<(i64, Option<String>, Option<String>, Option<String>)> = {
        let mut stmt = conn.prepare("SELECT id, name, quality, status FROM Movie ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<Result<_, _>>()?
    };

    for (movie_id, name, quality, status) in movies {
        let has_queue: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM MovieQueue WHERE movieId = ?1)",
            [movie_id],
            |row| row.get(0),
        )?;
        if has_queue {
            tracing::debug!(movie = movie_id, "queue entry already present");
            continue;
        }

        tracing::info!(
            movie = movie_id,
            name = name.as_deref().unwrap_or(""),
            "creating queue entry"
        );

        let status = status.as_deref().unwrap_or("");
        conn.execute(
            r#"INSERT INTO MovieQueue
                   (movieId, qualityType, "order", active, completed, waitFor, markComplete)
               VALUES (?1, ?2, 1, ?3, ?4, 0, 1)"#,
            params![
                movie_id,
                quality,
                status != MovieStatus::Deleted.as_str(),
                status != MovieStatus::Want.as_str(),
            ],
        )?;
        let queue_id = conn.last_insert_rowid();

        if let Some((history_id, old)) = histories.get(&movie_id) {
            conn.execute(
                "UPDATE RenameHistory SET movieQueue = ?1 WHERE id = ?2",
                params![queue_id, history_id],
            )?;
            if let Some(dir) = parent_dir_name(old) {
                conn.execute(
                    "UPDATE MovieQueue SET name = ?1 WHERE id = ?2",
                    params![dir, queue_id],
                )?;
            }
        }
    }

    Ok(())
}

/// Name of the directory a file path lives in: `/films/Inception/x.mkv`
/// yields `Inception`.
fn parent_dir_name(path: &str) -> Option<String> {
    Path::new(path)
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
}
