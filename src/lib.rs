pub mod analyzer;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod parser;
pub mod reference;
pub mod source;
pub mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;

use commands::config::ConfigUpdate;
use commands::import::ImportRequest;
use commands::report::ReportRequest;
use config::AppConfig;
use error::AppError;
use reference::ReferenceData;
use source::{CsvSource, DataSource, SqliteSource};
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "helpdesk-dashboard")]
#[command(version, about = "Rapports consolidés de chamados et acompanhamentos par opérateur, équipe et canal")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a tickets/activities export pair as the new active snapshot
    Import {
        #[arg(long)]
        tickets: PathBuf,
        #[arg(long)]
        activities: PathBuf,
        #[arg(long)]
        db: PathBuf,
        /// Field delimiter; defaults to the stored configuration
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Build one report, or the whole dashboard with `--kind all`
    Report {
        #[arg(long, default_value = "all")]
        kind: String,
        /// First day included (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(long)]
        from: Option<String>,
        /// Last day included
        #[arg(long)]
        to: Option<String>,
        /// Team code, repeatable; all teams when omitted
        #[arg(long = "team")]
        teams: Vec<u32>,
        #[arg(long, conflicts_with_all = ["tickets", "activities"])]
        db: Option<PathBuf>,
        #[arg(long, requires = "activities")]
        tickets: Option<PathBuf>,
        #[arg(long, requires = "tickets")]
        activities: Option<PathBuf>,
        /// CSV delimiter when reading exports directly
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// JSON file overriding the built-in teams and operators
        #[arg(long)]
        reference: Option<PathBuf>,
    },

    /// List past imports, newest first
    History {
        #[arg(long)]
        db: PathBuf,
    },

    /// Show or update the stored configuration
    Config {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        refresh_interval_secs: Option<u64>,
        #[arg(long)]
        csv_delimiter: Option<char>,
    },
}

fn parse_kind(kind: &str) -> Result<Option<analyzer::ReportKind>, AppError> {
    if kind == "all" {
        Ok(None)
    } else {
        kind.parse().map(Some).map_err(AppError::Custom)
    }
}

fn report_state(
    db: Option<PathBuf>,
    tickets: Option<PathBuf>,
    activities: Option<PathBuf>,
    delimiter: char,
    reference: Option<PathBuf>,
) -> Result<AppState, AppError> {
    let reference = match reference {
        Some(path) => ReferenceData::from_path(path)?,
        None => ReferenceData::default(),
    };

    let (config, source): (AppConfig, Box<dyn DataSource + Send + Sync>) =
        match (db, tickets, activities) {
            (Some(db_path), _, _) => {
                let conn = db::setup::init_db(&db_path)?;
                let config = config::get_config_from_db(&conn)?;
                let source: Box<dyn DataSource + Send + Sync> = Box::new(SqliteSource { db_path });
                (config, source)
            }
            (None, Some(tickets_path), Some(activities_path)) => {
                let config = AppConfig {
                    csv_delimiter: delimiter,
                    ..AppConfig::default()
                };
                let source: Box<dyn DataSource + Send + Sync> = Box::new(CsvSource {
                    tickets_path,
                    activities_path,
                    delimiter: config.delimiter_byte()?,
                });
                (config, source)
            }
            _ => {
                return Err(AppError::Custom(
                    "Source manquante: --db ou --tickets et --activities".into(),
                ))
            }
        };

    Ok(AppState::new(reference, config, source))
}

/// Runs one parsed command and returns its JSON payload.
pub fn execute(cli: Cli) -> Result<JsonValue, AppError> {
    let value = match cli.command {
        Commands::Import {
            tickets,
            activities,
            db,
            delimiter,
        } => {
            let mut conn = db::setup::init_db(&db)?;
            let request = ImportRequest {
                tickets_path: tickets,
                activities_path: activities,
                delimiter,
            };
            serde_json::to_value(commands::import::run_import_logic(&mut conn, &request)?)?
        }
        Commands::Report {
            kind,
            from,
            to,
            teams,
            db,
            tickets,
            activities,
            delimiter,
            reference,
        } => {
            let request = ReportRequest {
                kind: parse_kind(&kind)?,
                date_from: from,
                date_to: to,
                teams,
            };
            let state = report_state(db, tickets, activities, delimiter, reference)?;
            serde_json::to_value(commands::report::run_report_logic(&state, &request)?)?
        }
        Commands::History { db } => {
            let conn = db::setup::init_db(&db)?;
            serde_json::to_value(commands::import::get_import_history(&conn)?)?
        }
        Commands::Config {
            db,
            refresh_interval_secs,
            csv_delimiter,
        } => {
            let conn = db::setup::init_db(&db)?;
            let update = ConfigUpdate {
                refresh_interval_secs,
                csv_delimiter,
            };
            let config = if update.is_empty() {
                commands::config::get_config(&conn)?
            } else {
                commands::config::update_config(&conn, &update)?
            };
            serde_json::to_value(config)?
        }
    };
    Ok(value)
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let value = execute(cli)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

// ─── E2E Integration Tests ──────────────────────────────────────────────────
