//! Categorization result store: one row per batch content hash.

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::CategorizedExpense;

/// Entries older than this are ignored; the next write overwrites them.
pub const RESULT_TTL_SECS: i64 = 24 * 60 * 60;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Stored result for a batch key, provided it is within the TTL. Corrupt
/// payloads read as a miss.
pub fn get_cached(conn: &Connection, key: &str) -> Option<Vec<CategorizedExpense>> {
    let row: std::result::Result<(String, i64), _> = conn.query_row(
        "SELECT payload, created_at FROM cache_entries WHERE key = ?1",
        [key],
        |row| Ok((row.get(0)?, row.get(1)?)),
    );
    let (payload, created_at) = row.ok()?;
    if chrono::Utc::now().timestamp() - created_at > RESULT_TTL_SECS {
        debug!("cache entry {key} is stale");
        return None;
    }
    match serde_json::from_str(&payload) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!("corrupt cache entry {key}: {e}");
            None
        }
    }
}

/// Store a batch result, replacing any previous entry for the key.
pub fn save_cached(conn: &Connection, key: &str, result: &[CategorizedExpense]) -> Result<()> {
    let payload = serde_json::to_string(result)?;
    conn.execute(
        "INSERT OR REPLACE INTO cache_entries (key, payload, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![key, payload, chrono::Utc::now().timestamp()],
    )?;
    Ok(())
}
