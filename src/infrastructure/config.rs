use crate::application::fetcher::FetchSettings;
use crate::application::parser::MatchPolicy;
use crate::application::render_backend::ReadySignal;
use crate::application::retry_policy::RetryPolicy;
use crate::application::segmenter::{DEFAULT_MAX_SEGMENT_LEN_M, Segmenter};
use crate::domain::geo::GeoPoint;
use crate::domain::segment::RouteGeometry;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SamplerConfig {
    pub segmentation: SegmentationConfig,
    pub fetch: FetchConfig,
    pub retry: RetryConfig,
    pub parser: ParserConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SegmentationConfig {
    pub max_segment_len_m: f64,
    pub max_segments_per_direction: Option<usize>,
    pub catalogue_path: PathBuf,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_segment_len_m: DEFAULT_MAX_SEGMENT_LEN_M,
            max_segments_per_direction: None,
            catalogue_path: PathBuf::from("data/segments.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub maps_host: String,
    pub webdriver_url: String,
    pub ready_signal: ReadySignal,
    pub timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub content_selector: String,
    pub headless: bool,
    pub locale: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            maps_host: "www.google.com".to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            ready_signal: ReadySignal::NetworkIdle,
            timeout_ms: 90_000,
            settle_delay_ms: 2_000,
            content_selector: "#section-directions-trip-0".to_string(),
            headless: true,
            locale: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub timeout_backoff_ms: u64,
    pub reset_surface_on_error: bool,
    pub retry_parse_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_ms: policy.backoff.as_millis() as u64,
            timeout_backoff_ms: policy.timeout_backoff.as_millis() as u64,
            reset_surface_on_error: policy.reset_surface_on_error,
            retry_parse_errors: policy.retry_parse_errors,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ParserConfig {
    pub match_policy: MatchPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub pacing_secs: f64,
    pub interval_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pacing_secs: 2.0,
            interval_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_path: Option<PathBuf>,
    pub json_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouteConfig {
    pub name: String,
    /// `[lat, lng]` pairs in travel order
    pub points: Vec<[f64; 2]>,
}

impl SamplerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.segmentation.max_segment_len_m > 0.0) {
            anyhow::bail!(
                "segmentation.max_segment_len_m must be positive, got {}",
                self.segmentation.max_segment_len_m
            );
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if !(self.run.pacing_secs >= 0.0) {
            anyhow::bail!("run.pacing_secs must not be negative");
        }
        if self.output.csv_path.is_none() && self.output.json_root.is_none() {
            anyhow::bail!("configure at least one of output.csv_path or output.json_root");
        }
        Ok(())
    }

    pub fn segmenter(&self) -> Segmenter {
        Segmenter::new(
            self.segmentation.max_segment_len_m,
            self.segmentation.max_segments_per_direction,
        )
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            maps_host: self.fetch.maps_host.clone(),
            ready_signal: self.fetch.ready_signal,
            timeout: Duration::from_millis(self.fetch.timeout_ms),
            settle_delay: Duration::from_millis(self.fetch.settle_delay_ms),
            content_selector: self.fetch.content_selector.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            backoff: Duration::from_millis(self.retry.backoff_ms),
            timeout_backoff: Duration::from_millis(self.retry.timeout_backoff_ms),
            reset_surface_on_error: self.retry.reset_surface_on_error,
            retry_parse_errors: self.retry.retry_parse_errors,
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs_f64(self.run.pacing_secs)
    }

    pub fn routes(&self) -> Vec<RouteGeometry> {
        self.routes
            .iter()
            .map(|r| {
                let points = r.points.iter().map(|[lat, lng]| GeoPoint::new(*lat, *lng)).collect();
                RouteGeometry::new(r.name.clone(), points)
            })
            .collect()
    }
}

pub fn load_sampler_config() -> anyhow::Result<SamplerConfig> {
    build_sampler_config(config::File::with_name("config/sampler"))
}

fn build_sampler_config<S>(file: S) -> anyhow::Result<SamplerConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("SAMPLER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: SamplerConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
