use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};

use crate::commands::import::ImportRecord;
use crate::parser::deserializers::STORAGE_DT_FMT;
use crate::parser::types::{Activity, Ticket};

fn parse_stored(value: Option<String>) -> Option<NaiveDateTime> {
    value.and_then(|s| NaiveDateTime::parse_from_str(&s, STORAGE_DT_FMT).ok())
}

pub fn get_active_import_id(conn: &Connection) -> Result<Option<i64>, rusqlite::Error> {
    conn.query_row(
        "SELECT id FROM imports WHERE is_active = 1 ORDER BY id DESC LIMIT 1",
        [],
        |row| row.get(0),
    )
    .optional()
}

/// Tickets of one import, in source order.
pub fn load_tickets(conn: &Connection, import_id: i64) -> Result<Vec<Ticket>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, opened_at, closed_at, team_code, operator_code,
                responsible_code, channel_code, status_code
         FROM tickets
         WHERE import_id = ?1
         ORDER BY row_id",
    )?;
    let rows = stmt
        .query_map([import_id], |row| {
            Ok(Ticket {
                id: row.get(0)?,
                opened_at: parse_stored(row.get(1)?),
                closed_at: parse_stored(row.get(2)?),
                team_code: row.get(3)?,
                operator_code: row.get(4)?,
                responsible_code: row.get(5)?,
                channel_code: row.get(6)?,
                status_code: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Activities of one import, in source order.
pub fn load_activities(conn: &Connection, import_id: i64) -> Result<Vec<Activity>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, ticket_id, occurred_at, operator_code, activity_type_code, description
         FROM activities
         WHERE import_id = ?1
         ORDER BY row_id",
    )?;
    let rows = stmt
        .query_map([import_id], |row| {
            Ok(Activity {
                id: row.get(0)?,
                ticket_id: row.get(1)?,
                occurred_at: parse_stored(row.get(2)?),
                operator_code: row.get(3)?,
                activity_type_code: row.get(4)?,
                description: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Historique des imports, du plus récent au plus ancien.
pub fn get_import_history(conn: &Connection) -> Result<Vec<ImportRecord>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, tickets_filename, activities_filename, import_date,
                ticket_rows, activity_rows, skipped_rows,
                date_range_from, date_range_to, is_active
         FROM imports
         ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ImportRecord {
                id: row.get(0)?,
                tickets_filename: row.get(1)?,
                activities_filename: row.get(2)?,
                import_date: row.get(3)?,
                ticket_rows: row.get::<_, i64>(4)? as usize,
                activity_rows: row.get::<_, i64>(5)? as usize,
                skipped_rows: row.get::<_, i64>(6)? as usize,
                date_range_from: row.get(7)?,
                date_range_to: row.get(8)?,
                is_active: row.get::<_, i64>(9)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
