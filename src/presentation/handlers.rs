// HTTP request handlers
use crate::domain::run::RunProgress;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/status", get(run_status))
        .route("/runs/latest", get(latest_run))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Progress of the run in flight, or of the last one
pub async fn run_status(State(state): State<Arc<AppState>>) -> Json<RunProgress> {
    Json(state.progress.borrow().clone())
}

/// Most recent completed run
pub async fn latest_run(State(state): State<Arc<AppState>>) -> Response {
    match state.latest_run.latest().await {
        Some(run) => Json(run).into_response(),
        None => (StatusCode::NOT_FOUND, "no run recorded yet").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sample_sink::SampleSink;
    use crate::domain::run::RunRecord;
    use chrono::Utc;
    use tokio::sync::watch;

    fn state() -> (Arc<AppState>, watch::Sender<RunProgress>) {
        let (tx, rx) = watch::channel(RunProgress::default());
        let state = AppState {
            progress: rx,
            latest_run: Default::default(),
        };
        (Arc::new(state), tx)
    }

    #[tokio::test]
    async fn test_status_reflects_progress() {
        let (state, tx) = state();
        tx.send_replace(RunProgress {
            running: true,
            run_started_at: None,
            index: 3,
            total: 10,
        });

        let Json(progress) = run_status(State(state)).await;

        assert!(progress.running);
        assert_eq!((progress.index, progress.total), (3, 10));
    }

    #[tokio::test]
    async fn test_latest_run_not_found_then_found() {
        let (state, _tx) = state();

        let response = latest_run(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.latest_run.write_run(&RunRecord::new(Utc::now())).await.unwrap();
        let response = latest_run(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
