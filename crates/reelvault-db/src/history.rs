//! Rename history: an audit trail of file moves per queue entry.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A recorded file rename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameEntry {
    /// Internal database ID.
    pub id: i64,
    /// Queue entry the rename belongs to.
    pub movie_queue: i64,
    /// Path before the rename.
    pub old: String,
    /// Path after the rename.
    pub new: String,
}

/// Records a rename performed for a queue entry.
pub fn record_rename(
    conn: &Connection,
    movie_queue: i64,
    old: &str,
    new: &str,
) -> Result<RenameEntry, StoreError> {
    conn.execute(
        "INSERT INTO RenameHistory (movieQueue, old, new) VALUES (?1, ?2, ?3)",
        params![movie_queue, old, new],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(queue = movie_queue, old, new, "recorded rename");
    Ok(RenameEntry {
        id,
        movie_queue,
        old: old.to_string(),
        new: new.to_string(),
    })
}

/// Lists the renames recorded for a queue entry, oldest first.
pub fn list_renames(conn: &Connection, movie_queue: i64) -> Result<Vec<RenameEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, movieQueue, old, new FROM RenameHistory WHERE movieQueue = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([movie_queue], map_row_to_entry)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

fn map_row_to_entry(row: &Row) -> rusqlite::Result<RenameEntry> {
    Ok(RenameEntry {
        id: row.get(0)?,
        movie_queue: row.get(1)?,
        old: row.get(2)?,
        new: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use rusqlite::Connection;

    #[test]
    fn record_and_list() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        // The bundled SQLite enforces foreign keys by default; the library is
        // designed to run with them off (see pool.rs / DESIGN.md).
        conn.execute_batch("PRAGMA foreign_keys = OFF;")
            .expect("should disable foreign keys");
        schema::create_all(&conn).expect("create_all should succeed");

        record_rename(&conn, 7, "/downloads/moon.mkv", "/films/Moon/moon.mkv")
            .expect("record should succeed");
        record_rename(&conn, 7, "/films/Moon/moon.mkv", "/films/Moon (2009)/moon.mkv")
            .expect("record should succeed");
        record_rename(&conn, 8, "/downloads/other.mkv", "/films/Other/other.mkv")
            .expect("record should succeed");

        let renames = list_renames(&conn, 7).expect("list should succeed");
        assert_eq!(renames.len(), 2);
        assert_eq!(renames[0].old, "/downloads/moon.mkv");
        assert_eq!(renames[1].new, "/films/Moon (2009)/moon.mkv");
    }
}
