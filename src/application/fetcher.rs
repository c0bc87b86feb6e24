// Directions fetcher - drives a render surface to a directions view
use crate::application::render_backend::{ReadySignal, RenderSurface};
use crate::domain::errors::FetchError;
use crate::domain::geo::GeoPoint;
use crate::domain::segment::Segment;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub maps_host: String,
    pub ready_signal: ReadySignal,
    pub timeout: Duration,
    pub settle_delay: Duration,
    pub content_selector: String,
}

#[derive(Debug, Clone)]
pub struct DirectionsFetcher {
    settings: FetchSettings,
}

impl DirectionsFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn directions_url(&self, start: &GeoPoint, end: &GeoPoint) -> String {
        format!(
            "https://{}/maps/dir/{},{}/{},{}/",
            self.settings.maps_host.trim_end_matches('/'),
            start.lat,
            start.lng,
            end.lat,
            end.lng
        )
    }

    /// Raw visible text of the directions panel for `segment`.
    ///
    /// Errors are surfaced untouched; retry decisions belong to the caller.
    pub async fn fetch(
        &self,
        surface: &mut dyn RenderSurface,
        segment: &Segment,
    ) -> Result<String, FetchError> {
        let url = self.directions_url(&segment.start, &segment.end);
        tracing::debug!("Segment {}: navigating to {}", segment.id, url);

        surface
            .navigate(&url, self.settings.ready_signal, self.settings.timeout)
            .await?;

        // Route cards are filled in after the ready signal fires
        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        surface.read_text(&self.settings.content_selector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render_backend::RenderBackend;
    use crate::application::test_support::{ScriptedBackend, fetch_settings};

    #[test]
    fn test_directions_url() {
        let fetcher = DirectionsFetcher::new(fetch_settings());
        let url = fetcher.directions_url(
            &GeoPoint::new(6.980032, 79.875507),
            &GeoPoint::new(6.943065, 79.878269),
        );

        assert_eq!(
            url,
            "https://www.google.com/maps/dir/6.980032,79.875507/6.943065,79.878269/"
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_text_of_navigated_page() {
        let backend = ScriptedBackend::new();
        backend.push(Ok("23 min 3.9 km".to_string()));
        let mut surface = backend.open_surface().await.unwrap();
        let fetcher = DirectionsFetcher::new(fetch_settings());
        let segment = Segment::new(
            1,
            GeoPoint::new(6.980032, 79.875507),
            GeoPoint::new(6.943065, 79.878269),
        );

        let text = fetcher.fetch(&mut *surface, &segment).await.unwrap();

        assert_eq!(text, "23 min 3.9 km");
        assert_eq!(
            backend.navigations(),
            vec![fetcher.directions_url(&segment.start, &segment.end)]
        );
    }

    #[tokio::test]
    async fn test_fetch_propagates_timeout() {
        let backend = ScriptedBackend::new();
        backend.push(Err(FetchError::RenderTimeout(Duration::from_millis(10))));
        let mut surface = backend.open_surface().await.unwrap();
        let fetcher = DirectionsFetcher::new(fetch_settings());
        let segment = Segment::new(1, GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001));

        let result = fetcher.fetch(&mut *surface, &segment).await;

        assert!(matches!(result, Err(FetchError::RenderTimeout(_))));
    }
}
