//! Recorded landmark streams.
//!
//! A recording is JSON Lines, one frame per line:
//!
//! ```text
//! {"timestamp_ms": 0, "faces": [[{"x": 0.5, "y": 0.5, "z": 0.0}, ...]]}
//! {"timestamp_ms": 33, "faces": []}
//! ```
//!
//! `timestamp_ms` is optional and measured from the start of the recording.
//! Blank lines and lines starting with `#` are skipped.

use crate::landmarks::types::Frame;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// One line of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    #[serde(flatten)]
    pub frame: Frame,
}

impl RecordedFrame {
    /// Monotonic instant of this frame relative to `base`, if stamped.
    pub fn at(&self, base: Instant) -> Option<Instant> {
        self.timestamp_ms
            .map(|ms| base + Duration::from_millis(ms))
    }
}

/// Errors reading a recording.
#[derive(Debug)]
pub enum ReplayError {
    IoError(std::io::Error),
    ParseError { line: usize, message: String },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::IoError(e) => write!(f, "IO error: {e}"),
            ReplayError::ParseError { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        ReplayError::IoError(e)
    }
}

/// Iterates over the frames of a recording, yielding 1-based line numbers.
pub struct FrameReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl FrameReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<(usize, RecordedFrame), ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line_no += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let line = self.buf.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            return Some(
                serde_json::from_str::<RecordedFrame>(line)
                    .map(|frame| (self.line_no, frame))
                    .map_err(|e| ReplayError::ParseError {
                        line: self.line_no,
                        message: e.to_string(),
                    }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::FaceBuilder;
    use std::io::Cursor;

    #[test]
    fn test_reads_frames_and_skips_blank_lines() {
        let input = "# session 1\n{\"timestamp_ms\": 0, \"faces\": []}\n\n{\"faces\": [[{\"x\": 0.1, \"y\": 0.2}]]}\n";
        let frames: Vec<_> = FrameReader::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, 2);
        assert_eq!(frames[0].1.timestamp_ms, Some(0));
        assert_eq!(frames[0].1.frame.face_count(), 0);
        assert_eq!(frames[1].0, 4);
        assert_eq!(frames[1].1.timestamp_ms, None);
        assert_eq!(frames[1].1.frame.face_count(), 1);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let input = "{\"faces\": []}\nnot json\n";
        let mut reader = FrameReader::new(Cursor::new(input));

        assert!(reader.next().unwrap().is_ok());
        match reader.next().unwrap() {
            Err(ReplayError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_frames_after_bad_line_still_read() {
        let input = "{\"timestamp_ms\": 0, \"faces\": []}\n{\"faces\": 3}\n{\"timestamp_ms\": 66, \"faces\": []}\n";
        let entries: Vec<_> = FrameReader::new(Cursor::new(input)).collect();

        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[1], Err(ReplayError::ParseError { line: 2, .. })));

        let valid: Vec<(usize, Option<u64>)> = entries
            .into_iter()
            .filter_map(Result::ok)
            .map(|(line, frame)| (line, frame.timestamp_ms))
            .collect();
        assert_eq!(valid, vec![(1, Some(0)), (3, Some(66))]);
    }

    #[test]
    fn test_timestamp_offsets_base() {
        let base = Instant::now();
        let recorded = RecordedFrame {
            timestamp_ms: Some(1500),
            frame: Frame::empty(),
        };
        assert_eq!(recorded.at(base), Some(base + Duration::from_millis(1500)));

        let unstamped = RecordedFrame {
            timestamp_ms: None,
            frame: Frame::empty(),
        };
        assert_eq!(unstamped.at(base), None);
    }

    #[test]
    fn test_written_frame_reads_back() {
        let recorded = RecordedFrame {
            timestamp_ms: Some(33),
            frame: Frame::single(FaceBuilder::neutral().build()),
        };
        let line = serde_json::to_string(&recorded).unwrap();

        let (_, parsed) = FrameReader::new(Cursor::new(line))
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(parsed.timestamp_ms, Some(33));
        assert_eq!(parsed.frame.faces[0].len(), recorded.frame.faces[0].len());
    }
}
