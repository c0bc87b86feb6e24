// Domain error taxonomy
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid geometry for route '{route}': need at least 2 points, got {points}")]
    InvalidGeometry { route: String, points: usize },

    #[error("coordinate out of range: lat={lat}, lng={lng}")]
    OutOfRange { lat: f64, lng: f64 },
}

/// Failures raised while driving the rendering capability. Both are retryable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("render timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("render error: {0}")]
    RenderError(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::RenderTimeout(_))
    }
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("segment catalogue is empty")]
    Empty,

    #[error("corrupt segment catalogue: {0}")]
    Corrupt(String),

    #[error("catalogue I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RunError {
    #[error("cannot run over an empty segment catalogue")]
    EmptyCatalogue,
}
