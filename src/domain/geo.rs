// Geodesy - great-circle distance and linear interpolation
use super::errors::GeometryError;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distances below this are treated as the same point.
pub const DISTANCE_EPSILON_METERS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a point, rejecting coordinates outside the WGS84 ranges.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, GeometryError> {
        let point = Self::new(lat, lng);
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        let lat_ok = (-90.0..=90.0).contains(&self.lat);
        let lng_ok = (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(GeometryError::OutOfRange {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Haversine distance in meters.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Split `a -> b` into `count` equal steps in lat/lng space.
///
/// Returns `count + 1` points whose first and last entries are exactly `a` and `b`.
/// A `count` of zero is treated as one.
pub fn interpolate(a: &GeoPoint, b: &GeoPoint, count: usize) -> Vec<GeoPoint> {
    let count = count.max(1);
    let mut points = Vec::with_capacity(count + 1);
    points.push(*a);

    for i in 1..count {
        let t = i as f64 / count as f64;
        points.push(GeoPoint::new(
            a.lat + (b.lat - a.lat) * t,
            a.lng + (b.lng - a.lng) * t,
        ));
    }

    points.push(*b);
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(6.980032, 79.875507);
        let b = GeoPoint::new(6.943065, 79.878269);

        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = distance(&a, &b);

        assert!((d - 111_194.93).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_interpolate_keeps_endpoints() {
        let a = GeoPoint::new(6.895575, 79.854851);
        let b = GeoPoint::new(6.871813, 79.884564);
        let points = interpolate(&a, &b, 4);

        assert_eq!(points.len(), 5);
        assert_eq!(points[0], a);
        assert_eq!(points[4], b);
        assert!((points[2].lat - (a.lat + b.lat) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_zero_count() {
        let a = GeoPoint::new(1.0, 1.0);
        let b = GeoPoint::new(2.0, 2.0);

        assert_eq!(interpolate(&a, &b, 0), vec![a, b]);
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert!(GeoPoint::try_new(91.0, 0.0).is_err());
        assert!(GeoPoint::try_new(0.0, -180.5).is_err());
        assert!(GeoPoint::try_new(-90.0, 180.0).is_ok());
    }
}
