//! Where the rotation pointer lives between runs: Postgres when a database is
//! configured, otherwise a small JSON file next to the sheets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db;
use crate::models::RunSummary;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    pointers: BTreeMap<String, u64>,
}

pub enum PointerStore {
    Postgres(PgPool),
    File(PathBuf),
}

impl PointerStore {
    pub async fn load(&self, key: &str) -> anyhow::Result<u64> {
        let value = match self {
            Self::Postgres(pool) => db::load_pointer(pool, key).await?,
            Self::File(path) => read_state(path)?.pointers.get(key).copied().unwrap_or(0),
        };
        debug!(key, value, "loaded rotation pointer");
        Ok(value)
    }

    pub async fn save(&self, key: &str, value: u64) -> anyhow::Result<()> {
        match self {
            Self::Postgres(pool) => db::save_pointer(pool, key, value).await?,
            Self::File(path) => {
                let mut state = read_state(path)?;
                state.pointers.insert(key.to_string(), value);
                let json = serde_json::to_string_pretty(&state)?;
                std::fs::write(path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
        }
        info!(key, value, "saved rotation pointer");
        Ok(())
    }

    /// Keeps an audit row per run. Only Postgres has anywhere to put it.
    pub async fn record_run(
        &self,
        week_label: &str,
        summary: &RunSummary,
        pointer_after: u64,
    ) -> anyhow::Result<()> {
        if let Self::Postgres(pool) = self {
            let id = db::record_run(pool, week_label, Utc::now(), summary, pointer_after).await?;
            debug!(run_id = %id, "recorded run");
        }
        Ok(())
    }
}

fn read_state(path: &Path) -> anyhow::Result<StateFile> {
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
