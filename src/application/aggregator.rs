// Run aggregator - one paced pass over the catalogue
use crate::application::render_backend::SurfaceSlot;
use crate::application::sampler::SegmentSampler;
use crate::domain::errors::RunError;
use crate::domain::run::{RunProgress, RunRecord};
use crate::domain::sample::SampleStatus;
use crate::domain::segment::Segment;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Cooperative stop flag, checked between segments.
#[derive(Debug, Clone, Default)]
pub struct RunCancellation(Arc<AtomicBool>);

impl RunCancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RunAggregator {
    sampler: SegmentSampler,
    pacing: Duration,
    progress: watch::Sender<RunProgress>,
}

impl RunAggregator {
    pub fn new(sampler: SegmentSampler, pacing: Duration, progress: watch::Sender<RunProgress>) -> Self {
        Self {
            sampler,
            pacing,
            progress,
        }
    }

    /// Sample every segment in catalogue order.
    ///
    /// A segment that exhausts its retries still contributes a result, so a
    /// completed run has exactly `catalogue.len()` results. Only an empty
    /// catalogue aborts the run.
    pub async fn run(
        &self,
        catalogue: &[Segment],
        slot: &mut SurfaceSlot,
        cancel: &RunCancellation,
    ) -> Result<RunRecord, RunError> {
        if catalogue.is_empty() {
            return Err(RunError::EmptyCatalogue);
        }

        let total = catalogue.len();
        let mut record = RunRecord::new(Utc::now());
        self.progress.send_replace(RunProgress {
            running: true,
            run_started_at: Some(record.timestamp_utc),
            index: 0,
            total,
        });
        tracing::info!("Run started over {} segments", total);

        for (i, segment) in catalogue.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            if cancel.is_cancelled() {
                tracing::warn!("Run cancelled after {}/{} segments", i, total);
                break;
            }

            tracing::info!("Segment {}/{} (id {})", i + 1, total, segment.id);
            self.progress.send_modify(|p| p.index = i + 1);

            let result = self.sampler.sample(slot, segment).await;
            record.results.push(result);
        }

        record.completed = record.results.len() == total;
        self.progress.send_modify(|p| p.running = false);

        tracing::info!(
            "Run finished: {} results, {} success, {} timeout, {} parse_error, {} other_error",
            record.results.len(),
            record.count_with_status(SampleStatus::Success),
            record.count_with_status(SampleStatus::Timeout),
            record.count_with_status(SampleStatus::ParseError),
            record.count_with_status(SampleStatus::OtherError),
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fetcher::DirectionsFetcher;
    use crate::application::parser::{DirectionsParser, MatchPolicy};
    use crate::application::test_support::{ScriptedBackend, fetch_settings, instant_policy};
    use crate::domain::errors::FetchError;
    use crate::domain::geo::GeoPoint;

    fn aggregator(max_attempts: u32) -> (RunAggregator, watch::Receiver<RunProgress>) {
        let sampler = SegmentSampler::new(
            DirectionsFetcher::new(fetch_settings()),
            Arc::new(DirectionsParser::new(MatchPolicy::FirstMatch).unwrap()),
            instant_policy(max_attempts),
        );
        let (tx, rx) = watch::channel(RunProgress::default());
        (RunAggregator::new(sampler, Duration::ZERO, tx), rx)
    }

    fn catalogue(n: u64) -> Vec<Segment> {
        (1..=n)
            .map(|id| {
                let lng = 79.85 + id as f64 * 0.0001;
                Segment::new(id, GeoPoint::new(6.9, lng), GeoPoint::new(6.9, lng + 0.0001))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_every_segment_yields_one_result_in_order() {
        let backend = ScriptedBackend::new();
        backend.push(Ok("2 min 0.5 km".to_string()));
        backend.push(Err(FetchError::RenderTimeout(Duration::from_secs(1))));
        backend.push(Err(FetchError::RenderTimeout(Duration::from_secs(1))));
        backend.push(Ok("no route".to_string()));
        backend.push(Err(FetchError::RenderError("crashed".to_string())));
        backend.push(Ok("3 min 1 km".to_string()));
        backend.push(Ok("1 min 300 m".to_string()));
        let mut slot = SurfaceSlot::new(Arc::new(backend.clone()));
        let (aggregator, progress) = aggregator(2);
        let segments = catalogue(5);

        let record = aggregator
            .run(&segments, &mut slot, &RunCancellation::default())
            .await
            .unwrap();

        let ids: Vec<u64> = record.results.iter().map(|r| r.segment_id).collect();
        let statuses: Vec<SampleStatus> = record.results.iter().map(|r| r.status).collect();
        assert!(record.completed);
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            statuses,
            vec![
                SampleStatus::Success,
                SampleStatus::Timeout,
                SampleStatus::ParseError,
                SampleStatus::Success,
                SampleStatus::Success,
            ]
        );
        assert_eq!(record.results[4].distance_km, Some(0.3));

        let last = progress.borrow().clone();
        assert!(!last.running);
        assert_eq!((last.index, last.total), (5, 5));
    }

    #[tokio::test]
    async fn test_empty_catalogue_aborts() {
        let backend = ScriptedBackend::new();
        let mut slot = SurfaceSlot::new(Arc::new(backend));
        let (aggregator, _progress) = aggregator(3);

        let result = aggregator.run(&[], &mut slot, &RunCancellation::default()).await;

        assert_eq!(result, Err(RunError::EmptyCatalogue));
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_between_segments() {
        let backend = ScriptedBackend::always(Ok("2 min 0.5 km".to_string()));
        let mut slot = SurfaceSlot::new(Arc::new(backend.clone()));
        let (aggregator, _progress) = aggregator(3);
        let cancel = RunCancellation::default();
        cancel.cancel();

        let record = aggregator.run(&catalogue(3), &mut slot, &cancel).await.unwrap();

        assert!(record.results.is_empty());
        assert!(!record.completed);
        assert!(backend.navigations().is_empty());
    }
}
