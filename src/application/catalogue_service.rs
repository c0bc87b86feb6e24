// Catalogue service - Use case for obtaining a stable segment catalogue
use crate::application::catalogue_repository::CatalogueRepository;
use crate::application::segmenter::Segmenter;
use crate::domain::errors::CatalogueError;
use crate::domain::segment::{RouteGeometry, Segment};
use std::sync::Arc;

#[derive(Clone)]
pub struct CatalogueService {
    repository: Arc<dyn CatalogueRepository>,
    segmenter: Segmenter,
}

impl CatalogueService {
    pub fn new(repository: Arc<dyn CatalogueRepository>, segmenter: Segmenter) -> Self {
        Self {
            repository,
            segmenter,
        }
    }

    /// Load the persisted catalogue if there is one, otherwise generate it from
    /// `routes` and persist it. Generation never runs while a catalogue exists,
    /// so segment ids stay stable across runs.
    pub async fn load_or_generate(
        &self,
        routes: &[RouteGeometry],
    ) -> Result<Vec<Segment>, CatalogueError> {
        if let Some(segments) = self.repository.load().await? {
            if segments.is_empty() {
                return Err(CatalogueError::Empty);
            }
            tracing::info!("Loaded persisted catalogue with {} segments", segments.len());
            return Ok(segments);
        }

        tracing::info!("No persisted catalogue, generating from {} routes", routes.len());
        let segments = self.segmenter.generate(routes);
        if segments.is_empty() {
            return Err(CatalogueError::Empty);
        }

        self.repository.save(&segments).await?;
        tracing::info!("Persisted new catalogue with {} segments", segments.len());
        Ok(segments)
    }
}
