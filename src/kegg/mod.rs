pub mod client;
pub mod listing;

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db;
use crate::error::{ExpertError, Result};
use crate::model::PathwayRecord;

pub use client::KeggClient;

/// Anything that can hand back the flat-file text of a KEGG entry.
pub trait RecordSource {
    /// None when the entry does not exist.
    async fn get(&self, entry: &str) -> Result<Option<String>>;

    /// Raw `/find/<db>/<query>` listing. Offline sources have nothing to search.
    async fn find(&self, _db: &str, _query: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Fetch one entry; a missing entry is `NotFound`.
pub async fn fetch_record<S: RecordSource>(source: &S, entry: &str) -> Result<PathwayRecord> {
    match source.get(entry).await? {
        Some(text) => Ok(PathwayRecord::new(entry, text)),
        None => Err(ExpertError::NotFound(entry.to_string())),
    }
}

// ── Ids ──

/// `C02094` → `cpd:C02094`. Anything else is returned trimmed.
pub fn normalize_compound_id(id: &str) -> String {
    let id = id.trim();
    if id.len() > 1 && id.starts_with('C') && id[1..].chars().all(|c| c.is_ascii_digit()) {
        format!("cpd:{}", id)
    } else {
        id.to_string()
    }
}

/// `map00906` / `00906` → `path:map00906`; organism maps (`sce00906`) get
/// the `path:` prefix too.
pub fn normalize_pathway_id(id: &str) -> String {
    let id = id.trim();
    if id.contains(':') {
        id.to_string()
    } else if id.chars().all(|c| c.is_ascii_digit()) {
        format!("path:map{}", id)
    } else {
        format!("path:{}", id)
    }
}

// ── Sources ──

/// Reads `<dir>/<db>_<id>.txt` or `<dir>/<id>.txt`.
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, entry: &str) -> Vec<PathBuf> {
        let mut names = vec![entry.replace(':', "_")];
        if let Some((_, bare)) = entry.split_once(':') {
            names.push(bare.to_string());
        }
        names
            .into_iter()
            .map(|n| self.dir.join(format!("{}.txt", n)))
            .collect()
    }
}

impl RecordSource for FileSource {
    async fn get(&self, entry: &str) -> Result<Option<String>> {
        for path in self.candidates(entry) {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) if text.trim().is_empty() => return Ok(None),
                Ok(text) => {
                    debug!("Read {} from {}", entry, path.display());
                    return Ok(Some(text));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

/// Read-through SQLite cache in front of another source.
pub struct CachedSource<S> {
    inner: S,
    conn: Connection,
    max_age_days: i64,
}

impl<S: RecordSource> CachedSource<S> {
    pub fn new(inner: S, conn: Connection, max_age_days: i64) -> Self {
        Self {
            inner,
            conn,
            max_age_days,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RecordSource> RecordSource for CachedSource<S> {
    async fn get(&self, entry: &str) -> Result<Option<String>> {
        let cached = db::get_record(&self.conn, entry)?;
        let now = Utc::now();

        if let Some(rec) = &cached {
            if !rec.is_stale(self.max_age_days, now) {
                debug!("Cache hit for {}", rec.entry_id);
                return Ok(Some(rec.body.clone()));
            }
        }

        match self.inner.get(entry).await {
            Ok(Some(body)) => {
                db::save_record(&self.conn, entry, &body, now)?;
                info!("Fetched {} ({} bytes)", entry, body.len());
                Ok(Some(body))
            }
            Ok(None) => Ok(None),
            Err(e) => match cached {
                Some(rec) => {
                    warn!("Fetch failed for {}: {}; using stale cached copy", entry, e);
                    Ok(Some(rec.body))
                }
                None => Err(e),
            },
        }
    }

    async fn find(&self, db: &str, query: &str) -> Result<String> {
        self.inner.find(db, query).await
    }
}

// ── Tests ──
