// Segment sampler - fetch, parse and retry one segment
use crate::application::fetcher::DirectionsFetcher;
use crate::application::parser::{DirectionsParser, ParsedDirections};
use crate::application::render_backend::SurfaceSlot;
use crate::application::retry_policy::RetryPolicy;
use crate::domain::errors::FetchError;
use crate::domain::sample::{SampleResult, SampleStatus};
use crate::domain::segment::Segment;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Longest error detail kept on a sample record.
pub const ERROR_DETAIL_MAX_CHARS: usize = 120;

#[derive(Debug)]
enum Failure {
    Fetch(FetchError),
    Parse(ParsedDirections),
}

#[derive(Debug)]
enum SamplerState {
    Pending,
    Fetching {
        attempt: u32,
    },
    RetryWait {
        attempt: u32,
        failure: Failure,
    },
    Success {
        attempt: u32,
        duration_min: u32,
        distance_km: f64,
    },
    Failed {
        attempt: u32,
        failure: Failure,
    },
}

#[derive(Clone)]
pub struct SegmentSampler {
    fetcher: DirectionsFetcher,
    parser: Arc<DirectionsParser>,
    policy: RetryPolicy,
}

impl SegmentSampler {
    pub fn new(fetcher: DirectionsFetcher, parser: Arc<DirectionsParser>, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            parser,
            policy,
        }
    }

    /// Always produces a result; failures are encoded in its status.
    pub async fn sample(&self, slot: &mut SurfaceSlot, segment: &Segment) -> SampleResult {
        let started = Instant::now();
        let timestamp = Utc::now();
        let mut state = SamplerState::Pending;

        loop {
            state = match state {
                SamplerState::Pending => SamplerState::Fetching { attempt: 1 },

                SamplerState::Fetching { attempt } => self.fetch_once(slot, segment, attempt).await,

                SamplerState::RetryWait { attempt, failure } => {
                    let delay = match &failure {
                        Failure::Fetch(e) => {
                            tracing::warn!(
                                "Segment {}: attempt {} failed: {}, retrying",
                                segment.id,
                                attempt,
                                e
                            );
                            if self.policy.resets_surface(e) {
                                slot.reset().await;
                            }
                            self.policy.backoff_for(e)
                        }
                        Failure::Parse(_) => {
                            tracing::warn!(
                                "Segment {}: attempt {} returned no usable numbers, retrying",
                                segment.id,
                                attempt
                            );
                            self.policy.backoff
                        }
                    };
                    tokio::time::sleep(delay).await;
                    SamplerState::Fetching {
                        attempt: attempt + 1,
                    }
                }

                SamplerState::Success {
                    attempt,
                    duration_min,
                    distance_km,
                } => {
                    let result = SampleResult::success(
                        segment,
                        timestamp,
                        duration_min,
                        distance_km,
                        started.elapsed().as_secs_f64(),
                        attempt,
                    );
                    tracing::info!(
                        "Segment {}: {} min, {} km, {:?} km/h",
                        segment.id,
                        duration_min,
                        distance_km,
                        result.avg_speed_kmh
                    );
                    return result;
                }

                SamplerState::Failed { attempt, failure } => {
                    return self.fail(slot, segment, timestamp, started, attempt, failure).await;
                }
            };
        }
    }

    async fn fetch_once(
        &self,
        slot: &mut SurfaceSlot,
        segment: &Segment,
        attempt: u32,
    ) -> SamplerState {
        let failure = match self.fetch_and_parse(slot, segment).await {
            Ok(ParsedDirections {
                duration_min: Some(duration_min),
                distance_km: Some(distance_km),
            }) => {
                return SamplerState::Success {
                    attempt,
                    duration_min,
                    distance_km,
                };
            }
            Ok(parsed) => Failure::Parse(parsed),
            Err(e) => Failure::Fetch(e),
        };

        let retryable = match failure {
            Failure::Fetch(_) => true,
            Failure::Parse(_) => self.policy.retry_parse_errors,
        };

        if retryable && self.policy.has_attempts_left(attempt) {
            SamplerState::RetryWait { attempt, failure }
        } else {
            SamplerState::Failed { attempt, failure }
        }
    }

    async fn fetch_and_parse(
        &self,
        slot: &mut SurfaceSlot,
        segment: &Segment,
    ) -> Result<ParsedDirections, FetchError> {
        let surface = slot.acquire().await?;
        let text = self.fetcher.fetch(surface, segment).await?;
        Ok(self.parser.parse(&text))
    }

    async fn fail(
        &self,
        slot: &mut SurfaceSlot,
        segment: &Segment,
        timestamp: chrono::DateTime<Utc>,
        started: Instant,
        attempt: u32,
        failure: Failure,
    ) -> SampleResult {
        let (status, detail) = match failure {
            Failure::Fetch(e) => {
                // Do not hand a possibly hung page to the next segment
                if self.policy.resets_surface(&e) {
                    slot.reset().await;
                }
                let status = if e.is_timeout() {
                    SampleStatus::Timeout
                } else {
                    SampleStatus::OtherError
                };
                (status, e.to_string())
            }
            Failure::Parse(parsed) => (SampleStatus::ParseError, describe_missing(&parsed)),
        };

        tracing::warn!(
            "Segment {}: giving up after {} attempt(s): {} ({})",
            segment.id,
            attempt,
            status,
            detail
        );

        SampleResult::failure(
            segment,
            timestamp,
            status,
            truncate_detail(&detail),
            started.elapsed().as_secs_f64(),
            attempt,
        )
    }
}

/// Failure rows carry no metrics, so whatever was recovered goes in the detail.
fn describe_missing(parsed: &ParsedDirections) -> String {
    match (parsed.duration_min, parsed.distance_km) {
        (None, None) => "no duration or distance in directions text".to_string(),
        (None, Some(km)) => format!("no duration in directions text (distance {} km)", km),
        (Some(min), None) => format!("no distance in directions text (duration {} min)", min),
        (Some(_), Some(_)) => "unexpected complete parse".to_string(),
    }
}

pub fn truncate_detail(detail: &str) -> String {
    detail.chars().take(ERROR_DETAIL_MAX_CHARS).collect()
}
