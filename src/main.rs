// Main entry point - Dependency injection and run scheduling
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use tokio::sync::watch;

use crate::application::aggregator::{RunAggregator, RunCancellation};
use crate::application::catalogue_service::CatalogueService;
use crate::application::fetcher::DirectionsFetcher;
use crate::application::parser::DirectionsParser;
use crate::application::render_backend::SurfaceSlot;
use crate::application::sample_sink::SampleSink;
use crate::application::sampler::SegmentSampler;
use crate::application::sampling_service::SamplingService;
use crate::domain::run::RunProgress;
use crate::infrastructure::config::{load_sampler_config, SamplerConfig};
use crate::infrastructure::csv_catalogue::CsvCatalogueRepository;
use crate::infrastructure::csv_sink::CsvSampleSink;
use crate::infrastructure::json_sink::JsonRunSink;
use crate::infrastructure::latest_run_sink::LatestRunSink;
use crate::infrastructure::webdriver::WebDriverBackend;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_sampler_config()?;

    // Create adapters (infrastructure layer)
    let catalogue_repository = Arc::new(CsvCatalogueRepository::new(
        config.segmentation.catalogue_path.clone(),
    ));
    let backend = Arc::new(WebDriverBackend::new(
        config.fetch.webdriver_url.clone(),
        config.fetch.headless,
        config.fetch.locale.clone(),
        Duration::from_millis(config.fetch.timeout_ms) + Duration::from_secs(30),
    )?);
    let latest_run = LatestRunSink::new();
    let sinks = build_sinks(&config, latest_run.clone());

    // Create services (application layer)
    let parser = DirectionsParser::new(config.parser.match_policy)
        .context("Failed to compile directions patterns")?;
    let sampler = SegmentSampler::new(
        DirectionsFetcher::new(config.fetch_settings()),
        Arc::new(parser),
        config.retry_policy(),
    );
    let (progress_tx, progress_rx) = watch::channel(RunProgress::default());
    let service = SamplingService::new(
        CatalogueService::new(catalogue_repository, config.segmenter()),
        RunAggregator::new(sampler, config.pacing(), progress_tx),
        sinks,
        config.routes(),
    );

    // Optional status endpoint (presentation layer)
    if let Some(bind) = &config.http.bind {
        let addr: SocketAddr = bind.parse().with_context(|| format!("Invalid http.bind {}", bind))?;
        let state = Arc::new(AppState {
            progress: progress_rx,
            latest_run,
        });
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Status endpoint listening on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(state)).await {
                tracing::error!("Status endpoint stopped: {}", e);
            }
        });
    }

    // Stop between segments on Ctrl-C
    let cancel = RunCancellation::default();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current segment");
                cancel.cancel();
            }
        });
    }

    let mut slot = SurfaceSlot::new(backend);
    let outcome = run_schedule(&service, &mut slot, &cancel, config.run.interval_secs).await;
    slot.reset().await;
    outcome
}

fn build_sinks(config: &SamplerConfig, latest_run: LatestRunSink) -> Vec<Arc<dyn SampleSink>> {
    let mut sinks: Vec<Arc<dyn SampleSink>> = vec![Arc::new(latest_run)];
    if let Some(path) = &config.output.csv_path {
        sinks.push(Arc::new(CsvSampleSink::new(path.clone())));
    }
    if let Some(root) = &config.output.json_root {
        sinks.push(Arc::new(JsonRunSink::new(root.clone())));
    }
    sinks
}

async fn run_schedule(
    service: &SamplingService,
    slot: &mut SurfaceSlot,
    cancel: &RunCancellation,
    interval_secs: Option<u64>,
) -> anyhow::Result<()> {
    let Some(interval_secs) = interval_secs else {
        service.run_once(slot, cancel).await?;
        return Ok(());
    };

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while !cancel.is_cancelled() {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        service.run_once(slot, cancel).await?;
    }

    tracing::info!("Sampling stopped");
    Ok(())
}
