// In-memory doubles for the application ports
use crate::application::catalogue_repository::CatalogueRepository;
use crate::application::fetcher::FetchSettings;
use crate::application::render_backend::{ReadySignal, RenderBackend, RenderSurface};
use crate::application::retry_policy::RetryPolicy;
use crate::application::sample_sink::SampleSink;
use crate::domain::errors::{CatalogueError, FetchError};
use crate::domain::run::RunRecord;
use crate::domain::segment::Segment;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fetch_settings() -> FetchSettings {
    FetchSettings {
        maps_host: "www.google.com".to_string(),
        ready_signal: ReadySignal::NetworkIdle,
        timeout: Duration::from_millis(50),
        settle_delay: Duration::ZERO,
        content_selector: "#section-directions-trip-0".to_string(),
    }
}

pub fn instant_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::ZERO,
        timeout_backoff: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, FetchError>>,
    fallback: Option<Result<String, FetchError>>,
    open_failures: VecDeque<String>,
    navigations: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Backend whose surfaces answer each navigation with the next scripted reply.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply used whenever the queue is empty.
    pub fn always(reply: Result<String, FetchError>) -> Self {
        let backend = Self::new();
        backend.script.lock().unwrap().fallback = Some(reply);
        backend
    }

    pub fn push(&self, reply: Result<String, FetchError>) {
        self.script.lock().unwrap().replies.push_back(reply);
    }

    pub fn fail_next_open(&self, message: &str) {
        self.script.lock().unwrap().open_failures.push_back(message.to_string());
    }

    pub fn navigations(&self) -> Vec<String> {
        self.script.lock().unwrap().navigations.clone()
    }

    pub fn opened(&self) -> usize {
        self.script.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.script.lock().unwrap().closed
    }
}

#[async_trait]
impl RenderBackend for ScriptedBackend {
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, FetchError> {
        let mut script = self.script.lock().unwrap();
        if let Some(message) = script.open_failures.pop_front() {
            return Err(FetchError::RenderError(message));
        }
        script.opened += 1;
        Ok(Box::new(ScriptedSurface {
            script: self.script.clone(),
            loaded: None,
        }))
    }
}

struct ScriptedSurface {
    script: Arc<Mutex<Script>>,
    loaded: Option<String>,
}

#[async_trait]
impl RenderSurface for ScriptedSurface {
    async fn navigate(
        &mut self,
        url: &str,
        _ready: ReadySignal,
        _timeout: Duration,
    ) -> Result<(), FetchError> {
        let mut script = self.script.lock().unwrap();
        script.navigations.push(url.to_string());
        let reply = match script.replies.pop_front() {
            Some(reply) => reply,
            None => script
                .fallback
                .clone()
                .unwrap_or_else(|| Err(FetchError::RenderError("script exhausted".to_string()))),
        };
        self.loaded = Some(reply?);
        Ok(())
    }

    async fn read_text(&mut self, _selector: &str) -> Result<String, FetchError> {
        self.loaded
            .take()
            .ok_or_else(|| FetchError::RenderError("nothing loaded".to_string()))
    }

    async fn close(&mut self) {
        self.script.lock().unwrap().closed += 1;
    }
}

#[derive(Default)]
pub struct InMemoryCatalogueRepository {
    saved: Mutex<Option<Vec<Segment>>>,
    save_count: Mutex<usize>,
}

impl InMemoryCatalogueRepository {
    pub fn saved(&self) -> Option<Vec<Segment>> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.save_count.lock().unwrap()
    }
}

#[async_trait]
impl CatalogueRepository for InMemoryCatalogueRepository {
    async fn load(&self) -> Result<Option<Vec<Segment>>, CatalogueError> {
        Ok(self.saved())
    }

    async fn save(&self, segments: &[Segment]) -> Result<(), CatalogueError> {
        *self.saved.lock().unwrap() = Some(segments.to_vec());
        *self.save_count.lock().unwrap() += 1;
        Ok(())
    }
}

/// Sink that keeps every run it receives, or fails on demand.
#[derive(Default)]
pub struct RecordingSink {
    runs: Mutex<Vec<RunRecord>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn runs(&self) -> Vec<RunRecord> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SampleSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn write_run(&self, run: &RunRecord) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }
}
