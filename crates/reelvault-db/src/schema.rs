//! Schema definitions and catalog introspection.
//!
//! Table and column names keep the legacy on-disk layout (`Movie`,
//! `MovieQueue`, `movieId`, quoted `"order"`, …) because the migration
//! engine has to operate on database files written by earlier releases.

use rusqlite::Connection;

/// DDL for every entity table. `CREATE TABLE IF NOT EXISTS` throughout:
/// missing tables are created, existing ones are never dropped or altered.
const CREATE_TABLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS DbVersion (
    version INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS Movie (
    id INTEGER PRIMARY KEY,
    dateAdded TEXT NOT NULL DEFAULT (datetime('now')),
    name TEXT,
    year INTEGER,
    imdb TEXT,
    status TEXT,
    quality TEXT REFERENCES QualityTemplate(id),
    movieDb TEXT
);

CREATE TABLE IF NOT EXISTS MovieQueue (
    id INTEGER PRIMARY KEY,
    movieId INTEGER REFERENCES Movie(id),
    qualityType TEXT,
    date TEXT DEFAULT (datetime('now')),
    "order" INTEGER,
    active INTEGER,
    completed INTEGER,
    waitFor INTEGER DEFAULT 0,
    markComplete INTEGER,
    name TEXT,
    link TEXT
);

CREATE TABLE IF NOT EXISTS RenameHistory (
    id INTEGER PRIMARY KEY,
    movieQueue INTEGER REFERENCES MovieQueue(id),
    old TEXT,
    new TEXT
);

CREATE TABLE IF NOT EXISTS QualityTemplate (
    id INTEGER PRIMARY KEY,
    name INTEGER UNIQUE,
    label TEXT,
    "order" INTEGER,
    waitFor INTEGER DEFAULT 0,
    custom INTEGER,
    "default" INTEGER
);

CREATE TABLE IF NOT EXISTS QualityTemplateType (
    id INTEGER PRIMARY KEY,
    quality INTEGER REFERENCES QualityTemplate(id),
    "order" INTEGER,
    type TEXT,
    markComplete INTEGER
);
"#;

/// Materializes any missing entity tables.
///
/// Idempotent and non-destructive: existing tables are left untouched,
/// whatever their layout. Upgrading an old layout is the migration
/// engine's job, not this function's.
pub fn create_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(CREATE_TABLES_SQL)
}

/// Returns whether a table with the given name exists.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )
}

/// Returns whether the given table has a column with the given name.
///
/// A missing table reports `false`, same as a missing column.
pub fn column_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
        [table, column],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn create_all_is_idempotent() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        create_all(&conn).expect("first create_all should succeed");

        conn.execute("INSERT INTO Movie (name) VALUES ('Alien')", [])
            .expect("insert should succeed");

        create_all(&conn).expect("second create_all should succeed");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Movie", [], |row| row.get(0))
            .expect("should count movies");
        assert_eq!(count, 1, "existing rows must survive create_all");
    }

    #[test]
    fn all_entity_tables_exist() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        create_all(&conn).expect("create_all should succeed");

        for table in [
            "DbVersion",
            "Movie",
            "MovieQueue",
            "RenameHistory",
            "QualityTemplate",
            "QualityTemplateType",
        ] {
            assert!(
                table_exists(&conn, table).expect("table_exists should succeed"),
                "missing table {table}"
            );
        }
        assert!(!table_exists(&conn, "Feed").expect("table_exists should succeed"));
    }

    #[test]
    fn column_introspection() {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        create_all(&conn).expect("create_all should succeed");

        assert!(column_exists(&conn, "RenameHistory", "movieQueue").unwrap());
        assert!(!column_exists(&conn, "RenameHistory", "movieId").unwrap());
        // Missing table is reported as a missing column, not an error.
        assert!(!column_exists(&conn, "History", "movieId").unwrap());
    }
}
