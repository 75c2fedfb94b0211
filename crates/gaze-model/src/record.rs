//! Per-sample gaze log records and their JSONL writer.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;
use crate::stream::StreamError;

/// One accepted sample as it left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeRecord {
    /// Predictor timestamp in seconds, if it reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,

    /// Smoothed screen X.
    pub gx: f64,
    /// Smoothed screen Y.
    pub gy: f64,

    /// Stabilized surface-local X.
    pub ix: f64,
    /// Stabilized surface-local Y.
    pub iy: f64,
}

impl GazeRecord {
    pub fn new(t: Option<f64>, smoothed: Point2D, surface: Point2D) -> Self {
        Self {
            t,
            gx: smoothed.x,
            gy: smoothed.y,
            ix: surface.x,
            iy: surface.y,
        }
    }

    /// The stabilized surface-local point.
    pub fn surface_point(&self) -> Point2D {
        Point2D::new(self.ix, self.iy)
    }
}

/// Writes gaze records to a JSONL file.
pub struct GazeLogWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl GazeLogWriter {
    /// Create (or truncate) the file and write `header` as a `#` comment line.
    pub fn create(path: impl AsRef<Path>, header: &impl Serialize) -> Result<Self, StreamError> {
        let path = path.as_ref().to_path_buf();
        let io_error = |e| StreamError::IoError {
            path: path.clone(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(io_error)?;

        let mut writer = BufWriter::new(file);
        let header_json = serde_json::to_string(header)
            .map_err(|e| StreamError::SerializeError { source: e })?;
        writeln!(writer, "# {header_json}").map_err(io_error)?;

        Ok(Self {
            writer,
            path,
            records_written: 0,
        })
    }

    /// Append one record.
    pub fn write_record(&mut self, record: &GazeRecord) -> Result<(), StreamError> {
        let json =
            serde_json::to_string(record).map_err(|e| StreamError::SerializeError { source: e })?;
        writeln!(self.writer, "{json}").map_err(|e| self.io_error(e))?;
        self.records_written += 1;
        Ok(())
    }

    /// Append every record in order.
    pub fn write_all(&mut self, records: &[GazeRecord]) -> Result<(), StreamError> {
        records.iter().try_for_each(|r| self.write_record(r))
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.writer.flush().map_err(|e| self.io_error(e))
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StreamError {
        StreamError::IoError {
            path: self.path.clone(),
            source,
        }
    }
}

impl Drop for GazeLogWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Parse gaze records from JSONL, skipping `#` lines.
pub fn parse_records(jsonl: &str) -> Result<Vec<GazeRecord>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::StreamHeader;

    #[test]
    fn test_record_json_fields() {
        let record = GazeRecord::new(
            Some(2.0),
            Point2D::new(310.0, 220.0),
            Point2D::new(210.0, 170.0),
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"t\":2.0"));
        assert!(json.contains("\"gx\":310.0"));
        assert!(json.contains("\"iy\":170.0"));
        assert_eq!(record.surface_point(), Point2D::new(210.0, 170.0));
    }

    #[test]
    fn test_writer_output_parses_back() {
        let dir = std::env::temp_dir().join("gazemap_test_gaze_log");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("gaze.jsonl");

        let records = vec![
            GazeRecord::new(Some(0.0), Point2D::new(1.0, 2.0), Point2D::new(0.5, 1.5)),
            GazeRecord::new(None, Point2D::new(3.0, 4.0), Point2D::new(2.5, 3.5)),
        ];

        {
            let mut writer = GazeLogWriter::create(&path, &StreamHeader::now(None)).unwrap();
            writer.write_all(&records).unwrap();
            assert_eq!(writer.records_written(), 2);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().next().unwrap().starts_with("# "));
        assert_eq!(parse_records(&content).unwrap(), records);

        std::fs::remove_dir_all(&dir).ok();
    }
}
