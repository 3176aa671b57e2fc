use std::io::Read;
use std::path::Path;
use std::time::Instant;

use crate::error::AppError;
use crate::parser::columns::{
    validate_columns, ColumnMap, TableSchema, ACTIVITIES_SCHEMA, ACTIVITY_DESCRIPTION,
    ACTIVITY_ID, ACTIVITY_OCCURRED_AT, ACTIVITY_OPERATOR, ACTIVITY_TICKET_ID, ACTIVITY_TYPE,
    TICKETS_SCHEMA, TICKET_CHANNEL, TICKET_CLOSED_AT, TICKET_ID, TICKET_OPENED_AT,
    TICKET_OPERATOR, TICKET_RESPONSIBLE, TICKET_STATUS, TICKET_TEAM,
};
use crate::parser::deserializers::{
    parse_code, parse_opt_f64, parse_opt_text, parse_team_code, parse_timestamp,
};
use crate::parser::types::{Activity, ActivityRaw, ParseWarning, Ticket, TicketRaw};

/// Output of a table parse: normalized rows plus import metadata.
#[derive(Debug)]
pub struct ParseOutput<T> {
    pub rows: Vec<T>,
    pub warnings: Vec<ParseWarning>,
    pub total_rows_processed: usize,
    pub skipped_rows: usize,
    pub detected_columns: Vec<String>,
    pub missing_optional_columns: Vec<String>,
    pub parse_duration_ms: u64,
}

/// A normalized row, optionally with a non-fatal remark about it.
type Normalized<T> = Result<(T, Option<String>), String>;

pub fn parse_tickets_csv(
    path: impl AsRef<Path>,
    delimiter: u8,
    progress_cb: impl Fn(usize, usize),
) -> Result<ParseOutput<Ticket>, AppError> {
    let file = std::fs::File::open(path)?;
    parse_tickets_reader(std::io::BufReader::new(file), delimiter, progress_cb)
}

pub fn parse_activities_csv(
    path: impl AsRef<Path>,
    delimiter: u8,
    progress_cb: impl Fn(usize, usize),
) -> Result<ParseOutput<Activity>, AppError> {
    let file = std::fs::File::open(path)?;
    parse_activities_reader(std::io::BufReader::new(file), delimiter, progress_cb)
}

pub fn parse_tickets_reader<R: Read>(
    reader: R,
    delimiter: u8,
    progress_cb: impl Fn(usize, usize),
) -> Result<ParseOutput<Ticket>, AppError> {
    parse_table(reader, delimiter, &TICKETS_SCHEMA, progress_cb, |cm, rec| {
        normalize_ticket(&ticket_record_to_raw(cm, rec))
    })
}

pub fn parse_activities_reader<R: Read>(
    reader: R,
    delimiter: u8,
    progress_cb: impl Fn(usize, usize),
) -> Result<ParseOutput<Activity>, AppError> {
    parse_table(reader, delimiter, &ACTIVITIES_SCHEMA, progress_cb, |cm, rec| {
        normalize_activity(&activity_record_to_raw(cm, rec))
    })
}

/// Core parsing loop shared by both tables.
/// `progress_cb(rows_processed, rows_accepted)` is called every 500 rows.
fn parse_table<R, T, F>(
    reader: R,
    delimiter: u8,
    schema: &TableSchema,
    progress_cb: impl Fn(usize, usize),
    convert: F,
) -> Result<ParseOutput<T>, AppError>
where
    R: Read,
    F: Fn(&ColumnMap, &csv::StringRecord) -> Normalized<T>,
{
    let start = Instant::now();

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .double_quote(true)
        .quoting(true)
        .from_reader(reader);

    // Phase 1: validate columns
    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::EmptyFile);
    }
    let col_map = ColumnMap::from_headers(&headers);
    let col_validation = validate_columns(&col_map, schema)?;

    // Phase 2: parse and normalise records
    let mut rows: Vec<T> = Vec::new();
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut skipped = 0usize;
    let mut row_idx = 0usize;

    for result in rdr.records() {
        row_idx += 1;
        if row_idx % 500 == 0 {
            progress_cb(row_idx, rows.len());
        }

        // +1 for the header row
        let line = row_idx + 1;
        match result {
            Ok(record) => match convert(&col_map, &record) {
                Ok((row, remark)) => {
                    if let Some(message) = remark {
                        warnings.push(ParseWarning { line, message });
                    }
                    rows.push(row);
                }
                Err(message) => {
                    warnings.push(ParseWarning { line, message });
                    skipped += 1;
                }
            },
            Err(err) => {
                warnings.push(ParseWarning {
                    line,
                    message: err.to_string(),
                });
                skipped += 1;
            }
        }
    }

    if row_idx == 0 {
        log::warn!("Table {} sans aucune ligne de données", schema.name);
    }

    Ok(ParseOutput {
        rows,
        warnings,
        total_rows_processed: row_idx,
        skipped_rows: skipped,
        detected_columns: col_validation.present,
        missing_optional_columns: col_validation.missing_optional,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn ticket_record_to_raw(col_map: &ColumnMap, record: &csv::StringRecord) -> TicketRaw {
    let get = |col: &str| col_map.get(record, col).map(str::to_string);
    TicketRaw {
        id: get(TICKET_ID),
        opened_at: get(TICKET_OPENED_AT),
        closed_at: get(TICKET_CLOSED_AT),
        team_code: get(TICKET_TEAM),
        operator_code: get(TICKET_OPERATOR),
        responsible_code: get(TICKET_RESPONSIBLE),
        channel_code: get(TICKET_CHANNEL),
        status_code: get(TICKET_STATUS),
    }
}

fn activity_record_to_raw(col_map: &ColumnMap, record: &csv::StringRecord) -> ActivityRaw {
    let get = |col: &str| col_map.get(record, col).map(str::to_string);
    ActivityRaw {
        id: get(ACTIVITY_ID),
        ticket_id: get(ACTIVITY_TICKET_ID),
        occurred_at: get(ACTIVITY_OCCURRED_AT),
        operator_code: get(ACTIVITY_OPERATOR),
        activity_type_code: get(ACTIVITY_TYPE),
        description: get(ACTIVITY_DESCRIPTION),
    }
}

pub(crate) fn normalize_ticket(raw: &TicketRaw) -> Normalized<Ticket> {
    let id_str = raw.id.as_deref().unwrap_or("").trim();
    let id = parse_code(id_str).ok_or_else(|| format!("Identifiant de ticket invalide: {:?}", id_str))?;

    let opened_at = raw.opened_at.as_deref().and_then(parse_timestamp);
    let mut closed_at = raw.closed_at.as_deref().and_then(parse_timestamp);

    // opened_at <= closed_at; an inconsistent closing date is discarded, the ticket is kept
    let mut remark = None;
    if let (Some(open), Some(close)) = (opened_at, closed_at) {
        if close < open {
            remark = Some(format!(
                "Ticket {}: date de fin antérieure à la date d'ouverture, ignorée",
                id
            ));
            closed_at = None;
        }
    }

    let code = |v: &Option<String>| v.as_deref().and_then(parse_code);

    Ok((
        Ticket {
            id,
            opened_at,
            closed_at,
            team_code: raw.team_code.as_deref().and_then(parse_team_code),
            operator_code: code(&raw.operator_code),
            responsible_code: code(&raw.responsible_code),
            channel_code: code(&raw.channel_code),
            status_code: code(&raw.status_code),
        },
        remark,
    ))
}

pub(crate) fn normalize_activity(raw: &ActivityRaw) -> Normalized<Activity> {
    let ticket_str = raw.ticket_id.as_deref().unwrap_or("").trim();
    let ticket_id = parse_code(ticket_str)
        .ok_or_else(|| format!("Ticket de rattachement invalide: {:?}", ticket_str))?;

    // The source keeps activity ids as text; "15.0" and "15" are the same id.
    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .map(|s| parse_code(s).map(|v| v.to_string()).unwrap_or_else(|| s.to_string()))
        .unwrap_or_default();

    Ok((
        Activity {
            id,
            ticket_id,
            occurred_at: raw.occurred_at.as_deref().and_then(parse_timestamp),
            operator_code: raw.operator_code.as_deref().and_then(parse_code),
            activity_type_code: raw.activity_type_code.as_deref().and_then(parse_opt_f64),
            description: raw.description.as_deref().and_then(parse_opt_text),
        },
        None,
    ))
}
