// Sample domain models
use super::geo;
use super::segment::{Segment, SegmentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Success,
    Timeout,
    ParseError,
    OtherError,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Success => "success",
            SampleStatus::Timeout => "timeout",
            SampleStatus::ParseError => "parse_error",
            SampleStatus::OtherError => "other_error",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One measurement for one segment.
///
/// `avg_speed_kmh` is only ever set alongside a positive duration and a distance,
/// and `error_detail` is only set when the status is not `Success`. Both are
/// enforced by the constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub timestamp_utc: DateTime<Utc>,
    pub segment_id: SegmentId,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    pub time_min: Option<u32>,
    pub distance_km: Option<f64>,
    pub avg_speed_kmh: Option<f64>,
    pub straight_line_m: f64,
    pub process_time_sec: f64,
    pub attempts: u32,
    pub status: SampleStatus,
    pub error_detail: Option<String>,
}

impl SampleResult {
    pub fn success(
        segment: &Segment,
        timestamp_utc: DateTime<Utc>,
        time_min: u32,
        distance_km: f64,
        process_time_sec: f64,
        attempts: u32,
    ) -> Self {
        let mut result = Self::blank(segment, timestamp_utc, process_time_sec, attempts);
        result.time_min = Some(time_min);
        result.distance_km = Some(distance_km);
        result.avg_speed_kmh = average_speed_kmh(distance_km, time_min);
        result.status = SampleStatus::Success;
        result
    }

    /// A failed sample. All metrics are null.
    pub fn failure(
        segment: &Segment,
        timestamp_utc: DateTime<Utc>,
        status: SampleStatus,
        detail: String,
        process_time_sec: f64,
        attempts: u32,
    ) -> Self {
        debug_assert_ne!(status, SampleStatus::Success);
        let mut result = Self::blank(segment, timestamp_utc, process_time_sec, attempts);
        result.status = status;
        result.error_detail = Some(detail);
        result
    }

    fn blank(
        segment: &Segment,
        timestamp_utc: DateTime<Utc>,
        process_time_sec: f64,
        attempts: u32,
    ) -> Self {
        Self {
            timestamp_utc,
            segment_id: segment.id,
            start_lat: segment.start.lat,
            start_lng: segment.start.lng,
            end_lat: segment.end.lat,
            end_lng: segment.end.lng,
            time_min: None,
            distance_km: None,
            avg_speed_kmh: None,
            straight_line_m: round2(geo::distance(&segment.start, &segment.end)),
            process_time_sec: round2(process_time_sec),
            attempts,
            status: SampleStatus::OtherError,
            error_detail: None,
        }
    }
}

/// km/h rounded to 2 decimals; `None` for a zero duration.
pub fn average_speed_kmh(distance_km: f64, time_min: u32) -> Option<f64> {
    if time_min == 0 {
        return None;
    }
    Some(round2(distance_km / (time_min as f64 / 60.0)))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
