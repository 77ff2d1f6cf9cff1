//! Movie persistence operations.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use reelvault_types::MovieStatus;

/// A tracked movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Internal database ID.
    pub id: i64,
    /// When the movie was added (ISO 8601, UTC).
    pub date_added: String,
    /// Display title.
    pub name: Option<String>,
    /// Release year.
    pub year: Option<i64>,
    /// IMDB identifier (e.g. `tt1375666`).
    pub imdb: Option<String>,
    /// Lifecycle status as stored. Legacy databases may contain strings
    /// this build does not know; they are preserved verbatim.
    pub status: Option<String>,
    /// Quality template reference.
    pub quality: Option<String>,
    /// External movie-database identifier.
    pub movie_db: Option<String>,
}

impl Movie {
    /// The stored status parsed into [`MovieStatus`], if recognized.
    pub fn parsed_status(&self) -> Option<MovieStatus> {
        self.status.as_deref().and_then(MovieStatus::parse)
    }
}

/// Parameters for adding a movie to the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMovieParams {
    pub name: String,
    pub year: Option<i64>,
    pub imdb: Option<String>,
    pub status: MovieStatus,
    pub quality: Option<String>,
    pub movie_db: Option<String>,
}

/// Adds a movie. `dateAdded` defaults to the current time.
pub fn add_movie(conn: &Connection, params: &AddMovieParams) -> Result<Movie, StoreError> {
    conn.execute(
        "INSERT INTO Movie (name, year, imdb, status, quality, movieDb)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            params.name,
            params.year,
            params.imdb,
            params.status.as_str(),
            params.quality,
            params.movie_db,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(movie = id, name = params.name.as_str(), "added movie");
    get_movie(conn, id)
}

/// Retrieves a movie by ID.
pub fn get_movie(conn: &Connection, id: i64) -> Result<Movie, StoreError> {
    conn.query_row(
        "SELECT id, dateAdded, name, year, imdb, status, quality, movieDb
         FROM Movie WHERE id = ?1",
        [id],
        map_row_to_movie,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("movie {id}")))
}

/// Looks up a movie by its IMDB identifier.
pub fn find_by_imdb(conn: &Connection, imdb: &str) -> Result<Option<Movie>, StoreError> {
    let movie = conn
        .query_row(
            "SELECT id, dateAdded, name, year, imdb, status, quality, movieDb
             FROM Movie WHERE imdb = ?1",
            [imdb],
            map_row_to_movie,
        )
        .optional()?;
    Ok(movie)
}

/// Lists the whole library in insertion order.
pub fn list_movies(conn: &Connection) -> Result<Vec<Movie>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, dateAdded, name, year, imdb, status, quality, movieDb
         FROM Movie ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], map_row_to_movie)?;
    let mut movies = Vec::new();
    for row in rows {
        movies.push(row?);
    }
    Ok(movies)
}

/// Lists movies with the given lifecycle status.
pub fn list_by_status(conn: &Connection, status: MovieStatus) -> Result<Vec<Movie>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, dateAdded, name, year, imdb, status, quality, movieDb
         FROM Movie WHERE status = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([status.as_str()], map_row_to_movie)?;
    let mut movies = Vec::new();
    for row in rows {
        movies.push(row?);
    }
    Ok(movies)
}

/// Updates a movie's lifecycle status.
pub fn set_status(conn: &Connection, id: i64, status: MovieStatus) -> Result<(), StoreError> {
    let count = conn.execute(
        "UPDATE Movie SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    if count == 0 {
        return Err(StoreError::NotFound(format!("movie {id}")));
    }
    Ok(())
}

fn map_row_to_movie(row: &Row) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        date_added: row.get(1)?,
        name: row.get(2)?,
        year: row.get(3)?,
        imdb: row.get(4)?,
        status: row.get(5)?,
        quality: row.get(6)?,
        movie_db: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use rusqlite::Connection;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        // The bundled SQLite enforces foreign keys by default; the library is
        // designed to run with them off (see pool.rs / DESIGN.md).
        conn.execute_batch("PRAGMA foreign_keys = OFF;")
            .expect("should disable foreign keys");
        schema::create_all(&conn).expect("create_all should succeed");
        conn
    }

    fn inception() -> AddMovieParams {
        AddMovieParams {
            name: "Inception".to_string(),
            year: Some(2010),
            imdb: Some("tt1375666".to_string()),
            status: MovieStatus::Want,
            quality: Some("20".to_string()),
            movie_db: None,
        }
    }

    #[test]
    fn add_and_get_movie() {
        let conn = setup_db();

        let movie = add_movie(&conn, &inception()).expect("add should succeed");
        assert_eq!(movie.name.as_deref(), Some("Inception"));
        assert_eq!(movie.parsed_status(), Some(MovieStatus::Want));
        assert!(!movie.date_added.is_empty(), "dateAdded must default");

        let fetched = get_movie(&conn, movie.id).expect("get should succeed");
        assert_eq!(fetched, movie);
    }

    #[test]
    fn get_missing_movie() {
        let conn = setup_db();
        let err = get_movie(&conn, 99).unwrap_err();
        match err {
            StoreError::NotFound(what) => assert_eq!(what, "movie 99"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn find_by_imdb_id() {
        let conn = setup_db();
        add_movie(&conn, &inception()).expect("add should succeed");

        let found = find_by_imdb(&conn, "tt1375666").expect("find should succeed");
        assert_eq!(
            found.and_then(|m| m.name),
            Some("Inception".to_string())
        );
        assert!(find_by_imdb(&conn, "tt0000000").unwrap().is_none());
    }

    #[test]
    fn status_transitions() {
        let conn = setup_db();
        let movie = add_movie(&conn, &inception()).expect("add should succeed");

        set_status(&conn, movie.id, MovieStatus::Snatched).expect("update should succeed");
        let fetched = get_movie(&conn, movie.id).expect("get should succeed");
        assert_eq!(fetched.parsed_status(), Some(MovieStatus::Snatched));

        let snatched = list_by_status(&conn, MovieStatus::Snatched).expect("list should succeed");
        assert_eq!(snatched.len(), 1);
        assert!(list_by_status(&conn, MovieStatus::Want).unwrap().is_empty());

        let err = set_status(&conn, 99, MovieStatus::Deleted).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn unknown_legacy_status_survives() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO Movie (name, status) VALUES ('Old Row', 'archived')",
            [],
        )
        .expect("insert should succeed");

        let movies = list_movies(&conn).expect("list should succeed");
        assert_eq!(movies[0].status.as_deref(), Some("archived"));
        assert_eq!(movies[0].parsed_status(), None);
    }
}
