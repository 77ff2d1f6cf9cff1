//! Movie download queue operations.
//!
//! Every download attempt for a movie is a `MovieQueue` row at a specific
//! quality tier. The rows with `active = true`, ordered by `"order"`, form
//! the movie's current queue: the tier the application tries first sits at
//! order 1.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One queued download/processing attempt for a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    /// Internal database ID.
    pub id: i64,
    /// Movie this entry belongs to.
    pub movie_id: i64,
    /// Quality tier identifier for this attempt.
    pub quality_type: Option<String>,
    /// When the entry was queued (ISO 8601, UTC).
    pub date: Option<String>,
    /// Position in the movie's processing sequence, 1-based.
    pub order: i64,
    /// Whether this entry is part of the movie's current queue.
    pub active: bool,
    /// Whether this attempt finished.
    pub completed: bool,
    /// Seconds to hold back a found release before grabbing it.
    pub wait_for: i64,
    /// Whether finishing this entry completes the movie.
    pub mark_complete: bool,
    /// Release/folder name, filled in once a download exists.
    pub name: Option<String>,
    /// Download link for the grabbed release.
    pub link: Option<String>,
}

/// Parameters for queueing a download attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddQueueParams {
    pub movie_id: i64,
    pub quality_type: Option<String>,
    pub order: i64,
    pub active: bool,
    pub completed: bool,
    pub wait_for: i64,
    pub mark_complete: bool,
    pub name: Option<String>,
    pub link: Option<String>,
}

/// Queues a download attempt.
pub fn add_queue_entry(conn: &Connection, params: &AddQueueParams) -> Result<QueueEntry, StoreError> {
    conn.execute(
        r#"INSERT INTO MovieQueue
               (movieId, qualityType, "order", active, completed, waitFor, markComplete, name, link)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
        params![
            params.movie_id,
            params.quality_type,
            params.order,
            params.active,
            params.completed,
            params.wait_for,
            params.mark_complete,
            params.name,
            params.link,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(queue = id, movie = params.movie_id, "queued download attempt");
    get_queue_entry(conn, id)
}

/// Retrieves a queue entry by ID.
pub fn get_queue_entry(conn: &Connection, id: i64) -> Result<QueueEntry, StoreError> {
    conn.query_row(
        r#"SELECT id, movieId, qualityType, date, "order", active, completed,
                  waitFor, markComplete, name, link
           FROM MovieQueue WHERE id = ?1"#,
        [id],
        map_row_to_entry,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("queue entry {id}")))
}

/// The movie's current queue: active entries in processing order.
pub fn active_queue(conn: &Connection, movie_id: i64) -> Result<Vec<QueueEntry>, StoreError> {
    let mut stmt = conn.prepare(
        r#"SELECT id, movieId, qualityType, date, "order", active, completed,
                  waitFor, markComplete, name, link
           FROM MovieQueue
           WHERE movieId = ?1 AND active = 1
           ORDER BY "order" ASC"#,
    )?;

    let rows = stmt.query_map([movie_id], map_row_to_entry)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Marks an attempt as finished and records the release name.
pub fn mark_completed(conn: &Connection, id: i64, name: Option<&str>) -> Result<(), StoreError> {
    let count = conn.execute(
        "UPDATE MovieQueue SET completed = 1, name = COALESCE(?1, name) WHERE id = ?2",
        params![name, id],
    )?;
    if count == 0 {
        return Err(StoreError::NotFound(format!("queue entry {id}")));
    }
    Ok(())
}

/// Takes an entry out of the movie's current queue.
pub fn deactivate(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let count = conn.execute("UPDATE MovieQueue SET active = 0 WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(StoreError::NotFound(format!("queue entry {id}")));
    }
    Ok(())
}

fn map_row_to_entry(row: &Row) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get(0)?,
        movie_id: row.get(1)?,
        quality_type: row.get(2)?,
        date: row.get(3)?,
        order: row.get(4)?,
        active: row.get(5)?,
        completed: row.get(6)?,
        wait_for: row.get(7)?,
        mark_complete: row.get(8)?,
        name: row.get(9)?,
        link: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movies::{add_movie, AddMovieParams};
    use crate::schema;
    use reelvault_types::MovieStatus;
    use rusqlite::Connection;

    fn setup_movie() -> (Connection, i64) {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        schema::create_all(&conn).expect("create_all should succeed");
        let movie = add_movie(
            &conn,
            &AddMovieParams {
                name: "Moon".to_string(),
                year: Some(2009),
                imdb: None,
                status: MovieStatus::Want,
                quality: None,
                movie_db: None,
            },
        )
        .expect("add_movie should succeed");
        (conn, movie.id)
    }

    fn attempt(movie_id: i64, order: i64, quality: &str) -> AddQueueParams {
        AddQueueParams {
            movie_id,
            quality_type: Some(quality.to_string()),
            order,
            active: true,
            completed: false,
            wait_for: 0,
            mark_complete: order == 2,
            name: None,
            link: None,
        }
    }

    #[test]
    fn active_queue_is_ordered() {
        let (conn, movie_id) = setup_movie();

        // Insert out of order; the queue must come back in order.
        add_queue_entry(&conn, &attempt(movie_id, 2, "720p")).expect("add should succeed");
        add_queue_entry(&conn, &attempt(movie_id, 1, "1080p")).expect("add should succeed");

        let queue = active_queue(&conn, movie_id).expect("active_queue should succeed");
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].order, 1);
        assert_eq!(queue[0].quality_type.as_deref(), Some("1080p"));
        assert_eq!(queue[1].order, 2);
        assert!(queue[1].mark_complete);
    }

    #[test]
    fn inactive_entries_are_excluded() {
        let (conn, movie_id) = setup_movie();

        let kept = add_queue_entry(&conn, &attempt(movie_id, 1, "1080p")).expect("add");
        let dropped = add_queue_entry(&conn, &attempt(movie_id, 2, "cam")).expect("add");
        deactivate(&conn, dropped.id).expect("deactivate should succeed");

        let queue = active_queue(&conn, movie_id).expect("active_queue should succeed");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, kept.id);
    }

    #[test]
    fn completion_records_release_name() {
        let (conn, movie_id) = setup_movie();
        let entry = add_queue_entry(&conn, &attempt(movie_id, 1, "720p")).expect("add");

        mark_completed(&conn, entry.id, Some("Moon.2009.720p")).expect("complete should succeed");

        let fetched = get_queue_entry(&conn, entry.id).expect("get should succeed");
        assert!(fetched.completed);
        assert_eq!(fetched.name.as_deref(), Some("Moon.2009.720p"));

        // A later completion without a name keeps the recorded one.
        mark_completed(&conn, entry.id, None).expect("complete should succeed");
        let fetched = get_queue_entry(&conn, entry.id).expect("get should succeed");
        assert_eq!(fetched.name.as_deref(), Some("Moon.2009.720p"));
    }

    #[test]
    fn missing_entry_errors() {
        let (conn, _) = setup_movie();
        assert!(matches!(
            get_queue_entry(&conn, 42).unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            mark_completed(&conn, 42, None).unwrap_err(),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            deactivate(&conn, 42).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
