// CSV-backed segment catalogue
use crate::application::catalogue_repository::CatalogueRepository;
use crate::domain::errors::CatalogueError;
use crate::domain::geo::GeoPoint;
use crate::domain::segment::{Segment, SegmentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CatalogueRow {
    segment_id: SegmentId,
    start_lat: f64,
    start_lng: f64,
    end_lat: f64,
    end_lng: f64,
}

impl From<&Segment> for CatalogueRow {
    fn from(segment: &Segment) -> Self {
        Self {
            segment_id: segment.id,
            start_lat: segment.start.lat,
            start_lng: segment.start.lng,
            end_lat: segment.end.lat,
            end_lng: segment.end.lng,
        }
    }
}

impl CatalogueRow {
    fn into_segment(self) -> Result<Segment, CatalogueError> {
        let start = GeoPoint::try_new(self.start_lat, self.start_lng);
        let end = GeoPoint::try_new(self.end_lat, self.end_lng);
        match (start, end) {
            (Ok(start), Ok(end)) => Ok(Segment::new(self.segment_id, start, end)),
            (Err(e), _) | (_, Err(e)) => Err(CatalogueError::Corrupt(format!(
                "segment {}: {}",
                self.segment_id, e
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvCatalogueRepository {
    path: PathBuf,
}

impl CsvCatalogueRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(path: &Path) -> Result<Vec<Segment>, CatalogueError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(from_csv)?;
        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for row in reader.deserialize::<CatalogueRow>() {
            let segment = row.map_err(from_csv)?.into_segment()?;
            if !seen.insert(segment.id) {
                return Err(CatalogueError::Corrupt(format!(
                    "duplicate segment id {}",
                    segment.id
                )));
            }
            segments.push(segment);
        }

        Ok(segments)
    }

    fn write(path: &Path, segments: &[Segment]) -> Result<(), CatalogueError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(from_csv)?;
        for segment in segments {
            writer.serialize(CatalogueRow::from(segment)).map_err(from_csv)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// I/O failures stay I/O; anything else means the file content is bad.
fn from_csv(e: csv::Error) -> CatalogueError {
    let detail = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => CatalogueError::Io(io),
        _ => CatalogueError::Corrupt(detail),
    }
}

#[async_trait]
impl CatalogueRepository for CsvCatalogueRepository {
    async fn load(&self) -> Result<Option<Vec<Segment>>, CatalogueError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let path = self.path.clone();
        let segments = tokio::task::spawn_blocking(move || Self::read(&path))
            .await
            .map_err(|e| CatalogueError::Io(std::io::Error::other(e)))??;

        tracing::debug!("Read {} segments from {}", segments.len(), self.path.display());
        Ok(Some(segments))
    }

    async fn save(&self, segments: &[Segment]) -> Result<(), CatalogueError> {
        let path = self.path.clone();
        let segments = segments.to_vec();
        tokio::task::spawn_blocking(move || Self::write(&path, &segments))
            .await
            .map_err(|e| CatalogueError::Io(std::io::Error::other(e)))?
    }
}
