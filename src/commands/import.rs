use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::Connection;

use crate::config::{delimiter_byte, get_config_from_db};
use crate::db::insert::{insert_snapshot, NewImport};
use crate::error::AppError;
use crate::parser::columns::{ACTIVITIES_SCHEMA, TICKETS_SCHEMA};
use crate::parser::types::ParseWarning;

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub tickets_path: PathBuf,
    pub activities_path: PathBuf,
    /// Overrides the configured delimiter.
    pub delimiter: Option<char>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub import_id: i64,
    pub ticket_rows: usize,
    pub activity_rows: usize,
    pub skipped_rows: usize,
    pub warnings: Vec<ParseWarning>,
    pub detected_columns: Vec<String>,
    pub missing_optional_columns: Vec<String>,
    pub date_range_from: Option<String>,
    pub date_range_to: Option<String>,
    pub parse_duration_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub id: i64,
    pub tickets_filename: String,
    pub activities_filename: String,
    pub import_date: String,
    pub ticket_rows: usize,
    pub activity_rows: usize,
    pub skipped_rows: usize,
    pub date_range_from: Option<String>,
    pub date_range_to: Option<String>,
    pub is_active: bool,
}

/// Prefixes each message with its table, line numbers restart per file.
fn tag_warnings(table: &'static str, warnings: Vec<ParseWarning>) -> impl Iterator<Item = ParseWarning> {
    warnings.into_iter().map(move |w| ParseWarning {
        line: w.line,
        message: format!("{}: {}", table, w.message),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Parses both exports and stores them as the new active snapshot.
pub(crate) fn run_import_logic(
    conn: &mut Connection,
    request: &ImportRequest,
) -> Result<ImportResult, AppError> {
    let start = Instant::now();

    let delimiter = match request.delimiter {
        Some(c) => delimiter_byte(c)?,
        None => get_config_from_db(conn)?.delimiter_byte()?,
    };

    let tickets_filename = file_name(&request.tickets_path);
    let activities_filename = file_name(&request.activities_path);

    // Duplicate check by filename
    let is_duplicate = {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM imports WHERE tickets_filename = ?1 AND activities_filename = ?2",
            rusqlite::params![&tickets_filename, &activities_filename],
            |row| row.get(0),
        )?;
        count > 0
    };

    let tickets = crate::parser::parse_tickets_csv(&request.tickets_path, delimiter, |rows, accepted| {
        log::debug!("chamados: {} lignes lues, {} retenues", rows, accepted);
    })?;
    let activities =
        crate::parser::parse_activities_csv(&request.activities_path, delimiter, |rows, accepted| {
            log::debug!("acompanhamentos: {} lignes lues, {} retenues", rows, accepted);
        })?;

    let date_range_from = tickets
        .rows
        .iter()
        .filter_map(|t| t.opened_at)
        .min()
        .map(|dt| dt.date().to_string());
    let date_range_to = tickets
        .rows
        .iter()
        .filter_map(|t| t.opened_at)
        .max()
        .map(|dt| dt.date().to_string());

    let skipped_rows = tickets.skipped_rows + activities.skipped_rows;
    let parse_duration_ms = tickets.parse_duration_ms + activities.parse_duration_ms;
    let detected_columns: Vec<String> = tickets
        .detected_columns
        .iter()
        .chain(activities.detected_columns.iter())
        .cloned()
        .collect();
    let missing_optional_columns: Vec<String> = tickets
        .missing_optional_columns
        .iter()
        .chain(activities.missing_optional_columns.iter())
        .cloned()
        .collect();

    let import = NewImport {
        tickets_filename,
        activities_filename,
        skipped_rows,
        date_range_from: date_range_from.clone(),
        date_range_to: date_range_to.clone(),
        detected_columns: detected_columns.clone(),
        parse_duration_ms,
    };
    let import_id = insert_snapshot(conn, &import, &tickets.rows, &activities.rows)?;

    log::info!(
        "Import {} terminé en {} ms: {} chamados, {} acompanhamentos, {} ligne(s) ignorée(s)",
        import_id,
        start.elapsed().as_millis(),
        tickets.rows.len(),
        activities.rows.len(),
        skipped_rows
    );

    // duplicate warning first
    let mut warnings: Vec<ParseWarning> = tag_warnings(TICKETS_SCHEMA.name, tickets.warnings).collect();
    warnings.extend(tag_warnings(ACTIVITIES_SCHEMA.name, activities.warnings));
    if is_duplicate {
        warnings.insert(
            0,
            ParseWarning {
                line: 0,
                message: format!(
                    "Fichiers '{}' / '{}' déjà importés (doublon potentiel)",
                    import.tickets_filename, import.activities_filename
                ),
            },
        );
    }

    Ok(ImportResult {
        import_id,
        ticket_rows: tickets.rows.len(),
        activity_rows: activities.rows.len(),
        skipped_rows,
        warnings,
        detected_columns,
        missing_optional_columns,
        date_range_from,
        date_range_to,
        parse_duration_ms,
    })
}

pub(crate) fn get_import_history(conn: &Connection) -> Result<Vec<ImportRecord>, AppError> {
    Ok(crate::db::queries::get_import_history(conn)?)
}
