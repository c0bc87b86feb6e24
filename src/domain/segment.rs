// Segment and route domain models
use super::errors::GeometryError;
use super::geo::GeoPoint;
use serde::{Deserialize, Serialize};

pub type SegmentId = u64;

/// A short directed stretch of road, the unit of sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub start: GeoPoint,
    pub end: GeoPoint,
}

impl Segment {
    pub fn new(id: SegmentId, start: GeoPoint, end: GeoPoint) -> Self {
        Self { id, start, end }
    }
}

/// Ordered polyline of a road in one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    pub name: String,
    pub points: Vec<GeoPoint>,
}

impl RouteGeometry {
    pub fn new(name: impl Into<String>, points: Vec<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.points.len() < 2 {
            return Err(GeometryError::InvalidGeometry {
                route: self.name.clone(),
                points: self.points.len(),
            });
        }
        self.points.iter().try_for_each(GeoPoint::validate)
    }

    /// The same road traversed end to start.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            name: self.name.clone(),
            points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Forward, Direction::Reverse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}
