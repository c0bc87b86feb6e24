// Rendering capability port - directions pages and their visible text
use crate::domain::errors::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Signal that a navigation has produced readable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadySignal {
    /// Document loaded and no new network resources for a short quiet window
    NetworkIdle,
    /// Document reached `readyState == "complete"`
    DomReady,
}

/// One browsing surface (a page). Stateful, so never shared between workers.
#[async_trait]
pub trait RenderSurface: Send {
    /// Load `url` and block until `ready` holds, failing with
    /// `RenderTimeout` once `timeout` elapses.
    async fn navigate(
        &mut self,
        url: &str,
        ready: ReadySignal,
        timeout: Duration,
    ) -> Result<(), FetchError>;

    /// Visible text of the first element matching `selector`.
    async fn read_text(&mut self, selector: &str) -> Result<String, FetchError>;

    /// Tear the surface down. Best effort, never fails.
    async fn close(&mut self);
}

#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, FetchError>;
}

/// Exclusive owner of at most one live surface.
///
/// The surface is opened lazily on `acquire` and discarded on `reset`, so a
/// corrupted page is never reused.
pub struct SurfaceSlot {
    backend: Arc<dyn RenderBackend>,
    surface: Option<Box<dyn RenderSurface>>,
}

impl SurfaceSlot {
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            surface: None,
        }
    }

    pub async fn acquire(&mut self) -> Result<&mut dyn RenderSurface, FetchError> {
        let surface = match self.surface.take() {
            Some(surface) => surface,
            None => {
                tracing::debug!("Opening new render surface");
                self.backend.open_surface().await?
            }
        };
        Ok(&mut **self.surface.insert(surface))
    }

    pub async fn reset(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            tracing::debug!("Discarding render surface");
            surface.close().await;
        }
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }
}
