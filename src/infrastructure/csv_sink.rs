// Append-only CSV table of samples
use crate::application::sample_sink::SampleSink;
use crate::domain::run::RunRecord;
use crate::domain::sample::{SampleResult, SampleStatus};
use crate::domain::segment::SegmentId;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct SampleRow {
    timestamp_utc: String,
    segment_id: SegmentId,
    start_lat: f64,
    start_lng: f64,
    end_lat: f64,
    end_lng: f64,
    time_min: Option<u32>,
    distance_km: Option<f64>,
    avg_speed_kmh: Option<f64>,
    process_time_sec: f64,
    status: SampleStatus,
}

impl From<&SampleResult> for SampleRow {
    fn from(r: &SampleResult) -> Self {
        Self {
            timestamp_utc: r.timestamp_utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            segment_id: r.segment_id,
            start_lat: r.start_lat,
            start_lng: r.start_lng,
            end_lat: r.end_lat,
            end_lng: r.end_lng,
            time_min: r.time_min,
            distance_km: r.distance_km,
            avg_speed_kmh: r.avg_speed_kmh,
            process_time_sec: r.process_time_sec,
            status: r.status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvSampleSink {
    path: PathBuf,
}

impl CsvSampleSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(path: &Path, run: &RunRecord) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(is_new).from_writer(file);
        for result in &run.results {
            writer.serialize(SampleRow::from(result))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl SampleSink for CsvSampleSink {
    fn name(&self) -> &str {
        "csv"
    }

    async fn write_run(&self, run: &RunRecord) -> anyhow::Result<()> {
        let path = self.path.clone();
        let run = run.clone();
        tokio::task::spawn_blocking(move || Self::append(&path, &run)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::GeoPoint;
    use crate::domain::segment::Segment;
    use chrono::{TimeZone, Utc};

    fn run() -> RunRecord {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 6, 30, 0).unwrap();
        let segment = Segment::new(
            1,
            GeoPoint::new(6.980032, 79.875507),
            GeoPoint::new(6.943065, 79.878269),
        );
        let mut run = RunRecord::new(ts);
        run.results.push(SampleResult::success(&segment, ts, 23, 3.9, 4.5, 1));
        run.results.push(SampleResult::failure(
            &segment,
            ts,
            SampleStatus::Timeout,
            "render timed out".to_string(),
            270.0,
            3,
        ));
        run.completed = true;
        run
    }

    #[tokio::test]
    async fn test_header_written_once_and_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/samples.csv");
        let sink = CsvSampleSink::new(&path);

        sink.write_run(&run()).await.unwrap();
        sink.write_run(&run()).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "timestamp_utc,segment_id,start_lat,start_lng,end_lat,end_lng,time_min,distance_km,avg_speed_kmh,process_time_sec,status"
        );
        assert_eq!(
            lines[1],
            "2025-03-01T06:30:00Z,1,6.980032,79.875507,6.943065,79.878269,23,3.9,10.17,4.5,success"
        );
        assert_eq!(
            lines[2],
            "2025-03-01T06:30:00Z,1,6.980032,79.875507,6.943065,79.878269,,,,270.0,timeout"
        );
        assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp_utc")).count(), 1);
    }
}
