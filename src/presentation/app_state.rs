// Application state for HTTP handlers
use crate::domain::run::RunProgress;
use crate::infrastructure::latest_run_sink::LatestRunSink;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub progress: watch::Receiver<RunProgress>,
    pub latest_run: LatestRunSink,
}
