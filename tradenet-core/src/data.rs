use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Cache of finished PageRank runs, keyed by dataset fingerprint and parameters.
pub struct RankStore {
    conn: Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankParams {
    pub damping: f64,
    pub trials: u64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRun {
    pub id: String,
    pub fingerprint: String,
    pub created_at: i64,
    pub params: RankParams,
    pub country_count: usize,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

impl RankStore {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let store = RankStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = RankStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS rank_runs (
    id TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,   -- sha256 of the record batch
    created_at INTEGER NOT NULL,
    damping REAL NOT NULL CHECK(damping BETWEEN 0 AND 1),
    trials INTEGER NOT NULL,
    seed INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rank_runs_lookup ON rank_runs(fingerprint, damping, trials, seed);

CREATE TABLE IF NOT EXISTS ranks (
    run_id TEXT NOT NULL,
    country_code TEXT NOT NULL,
    rank REAL NOT NULL,

    FOREIGN KEY(run_id) REFERENCES rank_runs(id) ON DELETE CASCADE,
    UNIQUE(run_id, country_code)
);

CREATE INDEX IF NOT EXISTS idx_ranks_run ON ranks(run_id);
            ",
        )?;
        Ok(())
    }

    pub fn save_run(
        &self,
        fingerprint: &str,
        params: &RankParams,
        ranks: &HashMap<String, f64>,
    ) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO rank_runs (id, fingerprint, created_at, damping, trials, seed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &run_id,
                fingerprint,
                current_timestamp(),
                params.damping,
                params.trials as i64,
                params.seed as i64,
            ],
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO ranks (run_id, country_code, rank) VALUES (?1, ?2, ?3)")?;
            for (code, rank) in ranks {
                stmt.execute(params![&run_id, code, rank])?;
            }
        }

        tx.commit()?;
        Ok(run_id)
    }

    /// Most recent run for this dataset and parameter set, if any.
    pub fn find_run(&self, fingerprint: &str, params: &RankParams) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM rank_runs
             WHERE fingerprint = ?1 AND damping = ?2 AND trials = ?3 AND seed = ?4
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
        )?;

        let run_id = stmt
            .query_row(
                params![
                    fingerprint,
                    params.damping,
                    params.trials as i64,
                    params.seed as i64
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(run_id)
    }

    pub fn load_ranks(&self, run_id: &str) -> Result<HashMap<String, f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT country_code, rank FROM ranks WHERE run_id = ?1")?;

        let ranks = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<HashMap<String, f64>>>()?;
        Ok(ranks)
    }

    pub fn list_runs(&self) -> Result<Vec<RankRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.fingerprint, r.created_at, r.damping, r.trials, r.seed,
                    (SELECT COUNT(*) FROM ranks k WHERE k.run_id = r.id)
             FROM rank_runs r
             ORDER BY r.created_at DESC, r.rowid DESC",
        )?;

        let runs = stmt
            .query_map([], |row| {
                Ok(RankRun {
                    id: row.get(0)?,
                    fingerprint: row.get(1)?,
                    created_at: row.get(2)?,
                    params: RankParams {
                        damping: row.get(3)?,
                        trials: row.get::<_, i64>(4)? as u64,
                        seed: row.get::<_, i64>(5)? as u64,
                    },
                    country_count: row.get::<_, i64>(6)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM rank_runs WHERE id = ?1", params![run_id])?;
        Ok(deleted > 0)
    }
}
