// Sink trait for completed runs
use crate::domain::run::RunRecord;
use async_trait::async_trait;

#[async_trait]
pub trait SampleSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Persist one run's records
    async fn write_run(&self, run: &RunRecord) -> anyhow::Result<()>;
}
