use std::path::Path;

use rusqlite::Connection;

use super::migrations::run_migrations;

/// Opens (or creates) the snapshot database and brings its schema up to date.
pub fn init_db(path: impl AsRef<Path>) -> Result<Connection, rusqlite::Error> {
    let path = path.as_ref();
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -64000;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    let version = run_migrations(&conn)?;
    log::debug!("Base ouverte: {} (schéma v{})", path.display(), version);

    Ok(conn)
}
