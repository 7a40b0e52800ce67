use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

pub mod models;
use models::*;

use crate::projection::Crosswalk;

/// SQLite-backed identifier crosswalk (single connection with mutex)
#[derive(Clone)]
pub struct CrosswalkDb {
    conn: Arc<Mutex<Connection>>,
}

impl CrosswalkDb {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open crosswalk database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = CrosswalkDb {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("crosswalk connection mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Insert or replace one mapping
    #[cfg(test)]
    pub fn upsert_mapping(&self, mapping: &CrosswalkMapping) -> Result<()> {
        self.upsert_many(std::slice::from_ref(mapping)).map(|_| ())
    }

    /// Bulk-upsert mappings in one transaction. Returns the number written.
    pub fn upsert_many(&self, mappings: &[CrosswalkMapping]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO crosswalk (sport, service, provider_id, canonical_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(sport, service, provider_id) DO UPDATE SET
                    canonical_id=excluded.canonical_id,
                    updated_at=excluded.updated_at",
            )?;
            for m in mappings {
                stmt.execute(params![
                    m.sport.as_str(),
                    m.service.as_str(),
                    m.provider_id.trim(),
                    m.canonical_id,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(mappings.len())
    }

    /// Seed the crosswalk from a JSON array of mappings.
    pub fn import_json(&self, path: &str) -> Result<usize> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read crosswalk seed {}", path))?;
        let mappings: Vec<CrosswalkMapping> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse crosswalk seed {}", path))?;
        let n = self.upsert_many(&mappings)?;
        info!("Imported {} crosswalk mappings from {}", n, path);
        Ok(n)
    }

    /// Load every mapping for one (sport, service) into memory.
    pub fn load_crosswalk(&self, sport: Sport, service: Service) -> Result<Crosswalk> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT provider_id, canonical_id FROM crosswalk WHERE sport=?1 AND service=?2",
        )?;
        let rows = stmt
            .query_map(params![sport.as_str(), service.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut crosswalk = Crosswalk::new();
        for (provider_id, canonical_id) in rows {
            crosswalk.insert(sport, service, &provider_id, canonical_id);
        }
        Ok(crosswalk)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let n = conn.query_row("SELECT COUNT(*) FROM crosswalk", [], |row| row.get(0))?;
        Ok(n)
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS crosswalk (
    sport        TEXT    NOT NULL,
    service      TEXT    NOT NULL,
    provider_id  TEXT    NOT NULL,
    canonical_id INTEGER NOT NULL,
    updated_at   TEXT    NOT NULL,
    PRIMARY KEY (sport, service, provider_id)
);

CREATE INDEX IF NOT EXISTS idx_crosswalk_context ON crosswalk(sport, service);
"#;
