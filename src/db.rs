use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            entry_id   TEXT PRIMARY KEY,
            body       TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_records_fetched ON records(fetched_at);
        ",
    )?;
    Ok(())
}

// ── Records ──

pub struct CachedRecord {
    pub entry_id: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRecord {
    pub fn is_stale(&self, max_age_days: i64, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > Duration::days(max_age_days)
    }
}

pub fn get_record(conn: &Connection, entry_id: &str) -> Result<Option<CachedRecord>> {
    let row = conn
        .query_row(
            "SELECT entry_id, body, fetched_at FROM records WHERE entry_id = ?1",
            [entry_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(row.map(|(entry_id, body, fetched_at)| CachedRecord {
        entry_id,
        body,
        // Unparseable timestamps count as infinitely old
        fetched_at: parse_timestamp(&fetched_at).unwrap_or(DateTime::<Utc>::MIN_UTC),
    }))
}

pub fn save_record(
    conn: &Connection,
    entry_id: &str,
    body: &str,
    fetched_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO records (entry_id, body, fetched_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![entry_id, body, format_timestamp(fetched_at)],
    )?;
    Ok(())
}

/// Delete rows older than `max_age_days`. Returns the number removed.
pub fn purge_stale(conn: &Connection, max_age_days: i64, now: DateTime<Utc>) -> Result<usize> {
    let cutoff = format_timestamp(now - Duration::days(max_age_days));
    let removed = conn.execute("DELETE FROM records WHERE fetched_at < ?1", [cutoff])?;
    Ok(removed)
}

// ── Stats ──

pub struct CacheStats {
    pub total: usize,
    pub stale: usize,
    pub oldest: Option<String>,
    pub newest: Option<String>,
}

pub fn get_stats(conn: &Connection, max_age_days: i64, now: DateTime<Utc>) -> Result<CacheStats> {
    let cutoff = format_timestamp(now - Duration::days(max_age_days));
    let total: usize = conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?;
    let stale: usize = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE fetched_at < ?1",
        [cutoff],
        |r| r.get(0),
    )?;
    let (oldest, newest) = conn.query_row(
        "SELECT MIN(fetched_at), MAX(fetched_at) FROM records",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    Ok(CacheStats {
        total,
        stale,
        oldest,
        newest,
    })
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// ── Tests ──
