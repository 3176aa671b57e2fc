use rusqlite::{Connection, Transaction};

use crate::parser::deserializers::format_timestamp;
use crate::parser::types::{Activity, Ticket};

/// Metadata recorded alongside one imported snapshot.
#[derive(Debug, Clone)]
pub struct NewImport {
    pub tickets_filename: String,
    pub activities_filename: String,
    pub skipped_rows: usize,
    pub date_range_from: Option<String>,
    pub date_range_to: Option<String>,
    pub detected_columns: Vec<String>,
    pub parse_duration_ms: u64,
}

/// Stores a full snapshot and makes it the only active import.
/// Everything happens in one transaction: readers see the previous snapshot
/// or the new one, never a mix.
pub fn insert_snapshot(
    conn: &mut Connection,
    import: &NewImport,
    tickets: &[Ticket],
    activities: &[Activity],
) -> Result<i64, rusqlite::Error> {
    let tx = conn.transaction()?;

    tx.execute("UPDATE imports SET is_active = 0", [])?;

    let detected_json =
        serde_json::to_string(&import.detected_columns).unwrap_or_else(|_| "[]".to_string());

    tx.execute(
        "INSERT INTO imports (
            tickets_filename, activities_filename, ticket_rows, activity_rows, skipped_rows,
            date_range_from, date_range_to, detected_columns, parse_duration_ms, is_active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
        rusqlite::params![
            &import.tickets_filename,
            &import.activities_filename,
            tickets.len() as i64,
            activities.len() as i64,
            import.skipped_rows as i64,
            import.date_range_from.as_deref(),
            import.date_range_to.as_deref(),
            detected_json,
            import.parse_duration_ms as i64,
        ],
    )?;
    let import_id = tx.last_insert_rowid();

    bulk_insert_tickets(&tx, import_id, tickets)?;
    bulk_insert_activities(&tx, import_id, activities)?;

    tx.commit()?;
    Ok(import_id)
}

fn bulk_insert_tickets(
    tx: &Transaction<'_>,
    import_id: i64,
    tickets: &[Ticket],
) -> Result<usize, rusqlite::Error> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO tickets (
            import_id, id, opened_at, closed_at, team_code,
            operator_code, responsible_code, channel_code, status_code
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    for t in tickets {
        stmt.execute(rusqlite::params![
            import_id,
            t.id,
            t.opened_at.as_ref().map(format_timestamp),
            t.closed_at.as_ref().map(format_timestamp),
            t.team_code,
            t.operator_code,
            t.responsible_code,
            t.channel_code,
            t.status_code,
        ])?;
    }

    Ok(tickets.len())
}

fn bulk_insert_activities(
    tx: &Transaction<'_>,
    import_id: i64,
    activities: &[Activity],
) -> Result<usize, rusqlite::Error> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO activities (
            import_id, id, ticket_id, occurred_at, operator_code,
            activity_type_code, description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for a in activities {
        stmt.execute(rusqlite::params![
            import_id,
            a.id,
            a.ticket_id,
            a.occurred_at.as_ref().map(format_timestamp),
            a.operator_code,
            a.activity_type_code,
            a.description,
        ])?;
    }

    Ok(activities.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn import(name: &str) -> NewImport {
        NewImport {
            tickets_filename: format!("{name}_chamados.csv"),
            activities_filename: format!("{name}_acompanhamentos.csv"),
            skipped_rows: 1,
            date_range_from: Some("2024-01-01".into()),
            date_range_to: Some("2024-01-31".into()),
            detected_columns: vec!["cdchamado".into()],
            parse_duration_ms: 12,
        }
    }

    fn ticket(id: i64) -> Ticket {
        Ticket {
            id,
            opened_at: NaiveDateTime::parse_from_str("2024-01-10 09:00:00", "%Y-%m-%d %H:%M:%S").ok(),
            closed_at: None,
            team_code: Some(1),
            operator_code: Some(497),
            responsible_code: None,
            channel_code: Some(2),
            status_code: Some(7),
        }
    }

    fn activity(id: &str, ticket_id: i64) -> Activity {
        Activity {
            id: id.into(),
            ticket_id,
            occurred_at: None,
            operator_code: Some(206),
            activity_type_code: Some(22.0),
            description: Some("retorno ao solicitante".into()),
        }
    }

    #[test]
    fn test_insert_snapshot_counts() {
        let mut conn = setup();
        let id = insert_snapshot(
            &mut conn,
            &import("jan"),
            &[ticket(1), ticket(2)],
            &[activity("10", 1)],
        )
        .unwrap();

        let (tickets, activities): (i64, i64) = conn
            .query_row(
                "SELECT ticket_rows, activity_rows FROM imports WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((tickets, activities), (2, 1));

        let stored: i64 = conn
            .query_row("SELECT COUNT(*) FROM tickets WHERE import_id = ?1", [id], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[test]
    fn test_new_snapshot_deactivates_previous() {
        let mut conn = setup();
        let first = insert_snapshot(&mut conn, &import("jan"), &[ticket(1)], &[]).unwrap();
        let second = insert_snapshot(&mut conn, &import("feb"), &[ticket(1)], &[]).unwrap();

        let active: Vec<i64> = conn
            .prepare("SELECT id FROM imports WHERE is_active = 1")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(active, vec![second]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_duplicate_ticket_ids_are_all_stored() {
        let mut conn = setup();
        let id = insert_snapshot(&mut conn, &import("dup"), &[ticket(5), ticket(5)], &[]).unwrap();
        let stored: i64 = conn
            .query_row("SELECT COUNT(*) FROM tickets WHERE import_id = ?1", [id], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 2);
    }
}
