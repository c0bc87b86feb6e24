// One JSON document per run, partitioned by date
use crate::application::sample_sink::SampleSink;
use crate::domain::run::RunRecord;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct JsonRunSink {
    root: PathBuf,
}

impl JsonRunSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/YYYY/YYYYMM/YYYYMMDD/YYYYMMDD.HHMMSS.json`
    pub fn path_for(&self, started: DateTime<Utc>) -> PathBuf {
        self.root
            .join(started.format("%Y").to_string())
            .join(started.format("%Y%m").to_string())
            .join(started.format("%Y%m%d").to_string())
            .join(format!("{}.json", started.format("%Y%m%d.%H%M%S")))
    }
}

#[async_trait]
impl SampleSink for JsonRunSink {
    fn name(&self) -> &str {
        "json"
    }

    async fn write_run(&self, run: &RunRecord) -> anyhow::Result<()> {
        let path = self.path_for(run.timestamp_utc);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let body = serde_json::to_vec_pretty(run).context("Failed to encode run record")?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Saved {} ({} B)", path.display(), body.len());
        Ok(())
    }
}
