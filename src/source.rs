//! Where the two source tables come from: a pair of CSV exports or the active
//! import of a SQLite snapshot database.

use std::path::PathBuf;
use std::time::Instant;

use crate::db;
use crate::error::AppError;
use crate::parser::{self, Activity, ParseWarning, Ticket};

/// One immutable load of both tables.
#[derive(Debug)]
pub struct Snapshot {
    pub tickets: Vec<Ticket>,
    pub activities: Vec<Activity>,
    pub warnings: Vec<ParseWarning>,
    pub loaded_at: Instant,
}

impl Snapshot {
    pub fn new(tickets: Vec<Ticket>, activities: Vec<Activity>) -> Self {
        Snapshot {
            tickets,
            activities,
            warnings: Vec::new(),
            loaded_at: Instant::now(),
        }
    }
}

pub trait DataSource {
    fn load(&self) -> Result<Snapshot, AppError>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

pub struct CsvSource {
    pub tickets_path: PathBuf,
    pub activities_path: PathBuf,
    pub delimiter: u8,
}

impl DataSource for CsvSource {
    fn load(&self) -> Result<Snapshot, AppError> {
        let tickets = parser::parse_tickets_csv(&self.tickets_path, self.delimiter, |_, _| {})?;
        let activities =
            parser::parse_activities_csv(&self.activities_path, self.delimiter, |_, _| {})?;

        let mut snapshot = Snapshot::new(tickets.rows, activities.rows);
        snapshot.warnings = tickets.warnings;
        snapshot.warnings.extend(activities.warnings);
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!(
            "csv {} + {}",
            self.tickets_path.display(),
            self.activities_path.display()
        )
    }
}

pub struct SqliteSource {
    pub db_path: PathBuf,
}

impl DataSource for SqliteSource {
    fn load(&self) -> Result<Snapshot, AppError> {
        let conn = db::setup::init_db(&self.db_path)?;
        let import_id = db::queries::get_active_import_id(&conn)?.ok_or(AppError::NoActiveImport)?;
        let tickets = db::queries::load_tickets(&conn, import_id)?;
        let activities = db::queries::load_activities(&conn, import_id)?;
        Ok(Snapshot::new(tickets, activities))
    }

    fn describe(&self) -> String {
        format!("sqlite {}", self.db_path.display())
    }
}
