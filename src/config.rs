use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 600;
const DEFAULT_CSV_DELIMITER: char = ',';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// How long a loaded snapshot is reused before the source is read again.
    pub refresh_interval_secs: u64,
    pub csv_delimiter: char,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            csv_delimiter: DEFAULT_CSV_DELIMITER,
        }
    }
}

impl AppConfig {
    /// Delimiter as the single byte the csv reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, AppError> {
        delimiter_byte(self.csv_delimiter)
    }
}

pub fn delimiter_byte(c: char) -> Result<u8, AppError> {
    if c.is_ascii() && !c.is_ascii_alphanumeric() && c != '"' && c != '\n' && c != '\r' {
        Ok(c as u8)
    } else {
        Err(AppError::Custom(format!("Délimiteur CSV invalide: {:?}", c)))
    }
}

pub fn get_config_from_db(conn: &Connection) -> Result<AppConfig, rusqlite::Error> {
    let mut stmt = conn.prepare_cached("SELECT key, value FROM config")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut config = AppConfig::default();

    for row in rows {
        let (key, value) = row?;
        match key.as_str() {
            "refresh_interval_secs" => {
                config.refresh_interval_secs =
                    value.parse().unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
            }
            "csv_delimiter" => {
                let mut chars = value.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    if delimiter_byte(c).is_ok() {
                        config.csv_delimiter = c;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(config)
}

pub fn update_config_in_db(conn: &Connection, config: &AppConfig) -> Result<(), rusqlite::Error> {
    let pairs: Vec<(&str, String)> = vec![
        (
            "refresh_interval_secs",
            config.refresh_interval_secs.to_string(),
        ),
        ("csv_delimiter", config.csv_delimiter.to_string()),
    ];

    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO config (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
    )?;

    for (key, value) in pairs {
        stmt.execute(rusqlite::params![key, value])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_defaults_when_table_is_empty() {
        let conn = setup();
        let config = get_config_from_db(&conn).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.refresh_interval_secs, 600);
        assert_eq!(config.delimiter_byte().unwrap(), b',');
    }

    #[test]
    fn test_update_then_read_back() {
        let conn = setup();
        let config = AppConfig {
            refresh_interval_secs: 30,
            csv_delimiter: ';',
        };
        update_config_in_db(&conn, &config).unwrap();
        assert_eq!(get_config_from_db(&conn).unwrap(), config);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let conn = setup();
        conn.execute_batch(
            "INSERT INTO config (key, value) VALUES ('refresh_interval_secs', 'soon');
             INSERT INTO config (key, value) VALUES ('csv_delimiter', ';;');",
        )
        .unwrap();
        assert_eq!(get_config_from_db(&conn).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_delimiter_validation() {
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert!(delimiter_byte('a').is_err());
        assert!(delimiter_byte('é').is_err());
        assert!(delimiter_byte('"').is_err());
    }
}
