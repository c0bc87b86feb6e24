// In-memory sink holding the most recent run for the status endpoint
use crate::application::sample_sink::SampleSink;
use crate::domain::run::RunRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct LatestRunSink {
    latest: Arc<RwLock<Option<RunRecord>>>,
}

impl LatestRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<RunRecord> {
        self.latest.read().await.clone()
    }
}

#[async_trait]
impl SampleSink for LatestRunSink {
    fn name(&self) -> &str {
        "latest"
    }

    async fn write_run(&self, run: &RunRecord) -> anyhow::Result<()> {
        *self.latest.write().await = Some(run.clone());
        Ok(())
    }
}
