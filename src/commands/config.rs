use rusqlite::Connection;
use serde::Deserialize;

use crate::config::{delimiter_byte, get_config_from_db, update_config_in_db, AppConfig};
use crate::error::AppError;

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub refresh_interval_secs: Option<u64>,
    pub csv_delimiter: Option<char>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.refresh_interval_secs.is_none() && self.csv_delimiter.is_none()
    }
}

pub(crate) fn get_config(conn: &Connection) -> Result<AppConfig, AppError> {
    Ok(get_config_from_db(conn)?)
}

/// Applies `update` over the stored configuration and returns the result.
pub(crate) fn update_config(conn: &Connection, update: &ConfigUpdate) -> Result<AppConfig, AppError> {
    let mut config = get_config_from_db(conn)?;
    if update.is_empty() {
        return Ok(config);
    }

    if let Some(secs) = update.refresh_interval_secs {
        config.refresh_interval_secs = secs;
    }
    if let Some(c) = update.csv_delimiter {
        delimiter_byte(c)?;
        config.csv_delimiter = c;
    }

    update_config_in_db(conn, &config)?;
    log::info!(
        "Configuration mise à jour: rafraîchissement {} s, délimiteur {:?}",
        config.refresh_interval_secs,
        config.csv_delimiter
    );
    Ok(config)
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
    fn test_partial_update_keeps_other_fields() {
        let conn = setup();
        let updated = update_config(
            &conn,
            &ConfigUpdate {
                csv_delimiter: Some(';'),
                ..ConfigUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.csv_delimiter, ';');
        assert_eq!(updated.refresh_interval_secs, 600);
        assert_eq!(get_config(&conn).unwrap(), updated);
    }

    #[test]
    fn test_invalid_delimiter_is_rejected_and_not_stored() {
        let conn = setup();
        let err = update_config(
            &conn,
            &ConfigUpdate {
                refresh_interval_secs: Some(5),
                csv_delimiter: Some('x'),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Délimiteur"));
        assert_eq!(get_config(&conn).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_empty_update_is_a_read() {
        let conn = setup();
        let config = update_config(&conn, &ConfigUpdate::default()).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
