// Sampling service - Use case for one complete sampling run
use crate::application::aggregator::{RunAggregator, RunCancellation};
use crate::application::catalogue_service::CatalogueService;
use crate::application::render_backend::SurfaceSlot;
use crate::application::sample_sink::SampleSink;
use crate::domain::run::RunRecord;
use crate::domain::segment::RouteGeometry;
use std::sync::Arc;

pub struct SamplingService {
    catalogue: CatalogueService,
    aggregator: RunAggregator,
    sinks: Vec<Arc<dyn SampleSink>>,
    routes: Vec<RouteGeometry>,
}

impl SamplingService {
    pub fn new(
        catalogue: CatalogueService,
        aggregator: RunAggregator,
        sinks: Vec<Arc<dyn SampleSink>>,
        routes: Vec<RouteGeometry>,
    ) -> Self {
        Self {
            catalogue,
            aggregator,
            sinks,
            routes,
        }
    }

    /// Resolve the catalogue, sample it and hand the run to every sink.
    pub async fn run_once(
        &self,
        slot: &mut SurfaceSlot,
        cancel: &RunCancellation,
    ) -> anyhow::Result<RunRecord> {
        let segments = self.catalogue.load_or_generate(&self.routes).await?;
        let record = self.aggregator.run(&segments, slot, cancel).await?;
        self.publish(&record).await;
        Ok(record)
    }

    async fn publish(&self, record: &RunRecord) {
        for sink in &self.sinks {
            match sink.write_run(record).await {
                Ok(()) => {
                    tracing::info!("Run written to {} sink", sink.name());
                }
                Err(e) => {
                    tracing::error!("Error writing run to {} sink: {:#}", sink.name(), e);
                }
            }
        }
    }
}
