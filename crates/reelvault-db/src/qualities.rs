//! Quality templates and default seeding.
//!
//! A `QualityTemplate` is an ordered recipe of quality tiers to try for a
//! movie. Built-in templates (one per tier) are seeded at startup; users
//! can add their own with `custom = true`, which seeding never touches.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use reelvault_types::{DEFAULT_QUALITY_CODE, QUALITY_TIERS};

/// A quality template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityTemplate {
    /// Internal database ID.
    pub id: i64,
    /// Unique integer code (tier code for built-ins).
    pub name: i64,
    /// Human-readable label.
    pub label: Option<String>,
    /// Preference position among templates.
    pub order: Option<i64>,
    /// Seconds to hold back found releases.
    pub wait_for: i64,
    /// Whether this template was created by the user.
    pub custom: bool,
    /// Whether this is the template applied to new movies.
    pub is_default: bool,
}

/// One tier step inside a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityTemplateType {
    /// Internal database ID.
    pub id: i64,
    /// Owning `QualityTemplate` id.
    pub quality: i64,
    /// Position within the template, 1-based.
    pub order: i64,
    /// Tier identifier, stored in the legacy `type` column.
    pub kind: String,
    /// Whether finishing this tier completes the movie.
    pub mark_complete: bool,
}

/// Fetches a template by its unique code.
pub fn get_template(conn: &Connection, code: i64) -> Result<Option<QualityTemplate>, StoreError> {
    let template = conn
        .query_row(
            r#"SELECT id, name, label, "order", waitFor, custom, "default"
               FROM QualityTemplate WHERE name = ?1"#,
            [code],
            map_row_to_template,
        )
        .optional()?;
    Ok(template)
}

/// Lists all templates in preference order.
pub fn list_templates(conn: &Connection) -> Result<Vec<QualityTemplate>, StoreError> {
    let mut stmt = conn.prepare(
        r#"SELECT id, name, label, "order", waitFor, custom, "default"
           FROM QualityTemplate ORDER BY "order" ASC"#,
    )?;

    let rows = stmt.query_map([], map_row_to_template)?;
    let mut templates = Vec::new();
    for row in rows {
        templates.push(row?);
    }
    Ok(templates)
}

/// Lists a template's tier steps in order.
pub fn template_types(
    conn: &Connection,
    template_id: i64,
) -> Result<Vec<QualityTemplateType>, StoreError> {
    let mut stmt = conn.prepare(
        r#"SELECT id, quality, "order", type, markComplete
           FROM QualityTemplateType WHERE quality = ?1 ORDER BY "order" ASC"#,
    )?;

    let rows = stmt.query_map([template_id], map_row_to_type)?;
    let mut types = Vec::new();
    for row in rows {
        types.push(row?);
    }
    Ok(types)
}

/// Seeds the built-in quality templates.
///
/// Idempotent: a tier whose code already has a template row is skipped, so
/// user edits to built-in rows (label, order, waitFor) survive restarts.
/// Returns the number of templates inserted.
pub fn seed_defaults(conn: &Connection) -> Result<usize, StoreError> {
    let mut inserted = 0;

    for (idx, tier) in QUALITY_TIERS.iter().enumerate() {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM QualityTemplate WHERE name = ?1)",
            [tier.code],
            |row| row.get(0),
        )?;
        if exists {
            continue;
        }

        conn.execute(
            r#"INSERT INTO QualityTemplate (name, label, "order", waitFor, custom, "default")
               VALUES (?1, ?2, ?3, 0, 0, ?4)"#,
            params![
                tier.code,
                tier.label,
                (idx + 1) as i64,
                tier.code == DEFAULT_QUALITY_CODE,
            ],
        )?;
        let template_id = conn.last_insert_rowid();

        conn.execute(
            r#"INSERT INTO QualityTemplateType (quality, "order", type, markComplete)
               VALUES (?1, 1, ?2, 1)"#,
            params![template_id, tier.identifier],
        )?;

        inserted += 1;
        tracing::debug!(code = tier.code, label = tier.label, "seeded quality template");
    }

    if inserted > 0 {
        tracing::info!(inserted, "seeded default quality templates");
    }
    Ok(inserted)
}

fn map_row_to_template(row: &Row) -> rusqlite::Result<QualityTemplate> {
    Ok(QualityTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        label: row.get(2)?,
        order: row.get(3)?,
        wait_for: row.get(4)?,
        custom: row.get(5)?,
        is_default: row.get(6)?,
    })
}

fn map_row_to_type(row: &Row) -> rusqlite::Result<QualityTemplateType> {
    Ok(QualityTemplateType {
        id: row.get(0)?,
        quality: row.get(1)?,
        order: row.get(2)?,
        kind: row.get(3)?,
        mark_complete: row.get(4)?,
    })
}
