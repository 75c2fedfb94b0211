//! Loading and saving recorded gaze streams.
//!
//! Stream files are append-friendly JSONL: an optional `# {header}` first
//! line followed by one [`StreamRecord`] per line. Blank lines and other
//! `#` lines are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sample::{GazeSample, StreamHeader, StreamRecord};

/// A recorded stream held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStream {
    pub header: Option<StreamHeader>,
    pub records: Vec<StreamRecord>,
}

impl RecordedStream {
    pub fn new(header: Option<StreamHeader>, records: Vec<StreamRecord>) -> Self {
        Self { header, records }
    }

    /// Parse JSONL content. Line numbers in errors are 1-based.
    pub fn parse(content: &str) -> Result<Self, StreamError> {
        let mut header = None;
        let mut records = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                // Only the first line may carry the header.
                if index == 0 {
                    header = serde_json::from_str(comment.trim()).ok();
                }
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| StreamError::ParseError {
                line: index + 1,
                source: e,
            })?;
            records.push(record);
        }

        Ok(Self { header, records })
    }

    /// Load a stream from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StreamError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| e.with_path(path))
    }

    /// Serialize to JSONL, header first.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut output = String::new();
        if let Some(header) = &self.header {
            output.push_str("# ");
            output.push_str(&serde_json::to_string(header)?);
            output.push('\n');
        }
        for record in &self.records {
            output.push_str(&serde_json::to_string(record)?);
            output.push('\n');
        }
        Ok(output)
    }

    /// Write the stream to disk, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StreamError> {
        let path = path.as_ref();
        let io_error = |e| StreamError::IoError {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let jsonl = self
            .to_jsonl()
            .map_err(|e| StreamError::SerializeError { source: e })?;
        std::fs::write(path, jsonl).map_err(io_error)
    }

    /// Iterate over the gaze samples only.
    pub fn samples(&self) -> impl Iterator<Item = &GazeSample> + '_ {
        self.records.iter().filter_map(StreamRecord::as_gaze)
    }

    /// Number of gaze samples in the stream.
    pub fn sample_count(&self) -> usize {
        self.samples().count()
    }

    /// Time span covered by timestamped samples, in seconds.
    pub fn duration_secs(&self) -> f64 {
        let mut first = None;
        let mut last = None;
        for t in self.samples().filter_map(GazeSample::valid_timestamp) {
            if first.is_none() {
                first = Some(t);
            }
            last = Some(t);
        }
        match (first, last) {
            (Some(a), Some(b)) => (b - a).max(0.0),
            _ => 0.0,
        }
    }
}

/// Errors that can occur when reading or writing stream files.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {source}")]
    ParseError {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Parse error in {path} on line {line}: {source}")]
    FileParseError {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Serialization error: {source}")]
    SerializeError { source: serde_json::Error },
}

impl StreamError {
    fn with_path(self, path: &Path) -> Self {
        match self {
            Self::ParseError { line, source } => Self::FileParseError {
                path: path.to_path_buf(),
                line,
                source,
            },
            other => other,
        }
    }
}
