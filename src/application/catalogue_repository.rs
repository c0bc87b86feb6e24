// Repository trait for the persisted segment catalogue
use crate::domain::errors::CatalogueError;
use crate::domain::segment::Segment;
use async_trait::async_trait;

#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    /// Load the persisted catalogue verbatim, `None` when nothing is persisted yet
    async fn load(&self) -> Result<Option<Vec<Segment>>, CatalogueError>;

    /// Persist a freshly generated catalogue
    async fn save(&self, segments: &[Segment]) -> Result<(), CatalogueError>;
}
