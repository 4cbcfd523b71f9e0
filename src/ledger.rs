use crate::client::ClientError;
use crate::models::Activity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::error;

pub const DEFAULT_LEDGER_PATH: &str = "data/completions.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerData {
    completions: BTreeMap<String, u64>,
}

/// Durable local copy of completion counts, keyed by activity id. The server
/// counter is authoritative; this mirrors whatever it last reported.
#[derive(Debug, Clone)]
pub struct CompletionLedger {
    path: PathBuf,
    data: LedgerData,
}

impl CompletionLedger {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: LedgerData::default(),
        }
    }

    /// A missing or unreadable file yields an empty ledger.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(err) => {
                    error!("failed to parse completion ledger: {err}");
                    LedgerData::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerData::default(),
            Err(err) => {
                error!("failed to read completion ledger: {err}");
                LedgerData::default()
            }
        };

        Self { path, data }
    }

    pub async fn persist(&self) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(&self.data)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }

    pub fn count(&self, id: &str) -> u64 {
        self.data.completions.get(id).copied().unwrap_or(0)
    }

    pub fn record(&mut self, id: &str, count: u64) {
        self.data.completions.insert(id.to_string(), count);
    }

    /// Replaces every entry with the counts reported in `catalog`.
    pub fn sync_from(&mut self, catalog: &[Activity]) {
        self.data.completions = catalog
            .iter()
            .map(|activity| (activity.id.clone(), activity.completion_count))
            .collect();
    }

    pub fn total(&self) -> u64 {
        self.data
            .completions
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }
}
