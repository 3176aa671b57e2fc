use rusqlite::Connection;

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("sql/001_initial.sql"),
}];

/// Applies pending migrations and returns the resulting schema version.
pub fn run_migrations(conn: &Connection) -> Result<u32, rusqlite::Error> {
    let mut version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    for migration in MIGRATIONS {
        if migration.version <= version {
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        tx.commit()?;
        version = migration.version;
        log::info!("Migration {} appliquée", migration.version);
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let first = run_migrations(&conn).unwrap();
        let second = run_migrations(&conn).unwrap();
        assert_eq!(first, MIGRATIONS.len() as u32);
        assert_eq!(first, second);
    }

    #[test]
    fn test_up_to_date_schema_is_left_alone() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO config (key, value, updated_at) VALUES ('k', 'v', datetime('now'))",
            [],
        )
        .unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 1);
        let kept: i64 = conn
            .query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, 1);
    }
}
