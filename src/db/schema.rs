//! Database schema initialization

use duckdb::Connection;

use crate::error::Result;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    // DuckDB has no AUTOINCREMENT, session ids come from a sequence
    conn.execute_batch(
        r"
        CREATE SEQUENCE IF NOT EXISTS listening_sessions_id_seq START 1;

        CREATE TABLE IF NOT EXISTS listening_sessions (
            id BIGINT PRIMARY KEY DEFAULT nextval('listening_sessions_id_seq'),
            user_id BIGINT NOT NULL,
            song_id BIGINT NOT NULL,
            start_time BIGINT NOT NULL,
            end_time BIGINT,
            actual_listen_duration_ms BIGINT NOT NULL DEFAULT 0,
            was_completed BOOLEAN NOT NULL DEFAULT FALSE,

            -- Local calendar fields of start_time
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day_of_month INTEGER NOT NULL,
            day_of_week INTEGER NOT NULL,
            date_string VARCHAR NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_month
            ON listening_sessions(user_id, year, month);

        CREATE INDEX IF NOT EXISTS idx_sessions_user_date
            ON listening_sessions(user_id, date_string);

        -- Song catalog mirror, owned by the library
        CREATE TABLE IF NOT EXISTS songs (
            id BIGINT PRIMARY KEY,
            title VARCHAR NOT NULL,
            artist VARCHAR NOT NULL,
            artwork VARCHAR
        );
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_name IN ('listening_sessions', 'songs')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
