use rusqlite::{Connection, Result};

use crate::config::StoreConfig;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS symbols (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ticker TEXT NOT NULL UNIQUE,
        currency TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS labels (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL CHECK (name <> '')
    );
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        transaction_type TEXT NOT NULL CHECK (transaction_type IN ('BUY', 'SELL', 'DIVIDEND')),
        symbol_id INTEGER NOT NULL REFERENCES symbols(id),
        price TEXT NOT NULL,
        quantity TEXT NOT NULL,
        commission TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS transaction_labels (
        transaction_id INTEGER NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
        label_id TEXT NOT NULL REFERENCES labels(id),
        position INTEGER NOT NULL
    );
";

pub fn establish_connection(config: &StoreConfig) -> Result<Connection> {
    let conn = Connection::open(&config.database_path)?;
    create_schema(&conn)?;
    tracing::debug!(path = %config.database_path.display(), "opened transaction store");
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}

#[cfg(test)]
pub fn establish_test_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}
