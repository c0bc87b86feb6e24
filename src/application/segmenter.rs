// Segmenter - split route geometry into short directed segments
use crate::domain::errors::GeometryError;
use crate::domain::geo::{self, DISTANCE_EPSILON_METERS, GeoPoint};
use crate::domain::segment::{Direction, RouteGeometry, Segment, SegmentId};

pub const DEFAULT_MAX_SEGMENT_LEN_M: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct Segmenter {
    max_segment_len_m: f64,
    max_segments_per_direction: Option<usize>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEGMENT_LEN_M, None)
    }
}

impl Segmenter {
    pub fn new(max_segment_len_m: f64, max_segments_per_direction: Option<usize>) -> Self {
        Self {
            max_segment_len_m,
            max_segments_per_direction,
        }
    }

    /// Build the catalogue for all routes, both directions each.
    ///
    /// Ids come from one counter starting at 1 and shared by every route and
    /// direction. A route with invalid geometry is skipped without consuming ids.
    pub fn generate(&self, routes: &[RouteGeometry]) -> Vec<Segment> {
        let mut next_id: SegmentId = 1;
        let mut catalogue = Vec::new();

        for route in routes {
            match self.segment_route(route, &mut next_id) {
                Ok(segments) => {
                    tracing::info!("Route {}: {} segments", route.name, segments.len());
                    catalogue.extend(segments);
                }
                Err(e) => {
                    tracing::warn!("Skipping route {}: {}", route.name, e);
                }
            }
        }

        catalogue
    }

    /// Segment one route forward then reverse, drawing ids from `next_id`.
    pub fn segment_route(
        &self,
        route: &RouteGeometry,
        next_id: &mut SegmentId,
    ) -> Result<Vec<Segment>, GeometryError> {
        route.validate()?;

        let mut segments = Vec::new();
        for direction in Direction::BOTH {
            let directed = match direction {
                Direction::Forward => route.clone(),
                Direction::Reverse => route.reversed(),
            };

            let mut pieces = self.split(&directed.points);
            if let Some(cap) = self.max_segments_per_direction {
                pieces.truncate(cap);
            }

            tracing::debug!(
                "Route {} {}: {} segments",
                route.name,
                direction.as_str(),
                pieces.len()
            );

            for (start, end) in pieces {
                segments.push(Segment::new(*next_id, start, end));
                *next_id += 1;
            }
        }

        Ok(segments)
    }

    /// Consecutive point pairs no longer than the max length. Repeated points
    /// produce no pieces.
    fn split(&self, points: &[GeoPoint]) -> Vec<(GeoPoint, GeoPoint)> {
        let mut pieces = Vec::new();

        for pair in points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let d = geo::distance(a, b);
            if d <= DISTANCE_EPSILON_METERS {
                continue;
            }

            // Rounded up so no piece exceeds the maximum length
            let steps = ((d / self.max_segment_len_m).ceil() as usize).max(1);
            let interpolated = geo::interpolate(a, b, steps);
            pieces.extend(interpolated.windows(2).map(|w| (w[0], w[1])));
        }

        pieces
    }
}
