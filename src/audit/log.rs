//! Session audit log.
//!
//! Counts only engine outcomes. No landmarks or images are retained.

use crate::engine::{FrameState, SignalOutcome, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for the current session.
#[derive(Debug)]
pub struct SessionLog {
    frames_processed: AtomicU64,
    no_face_frames: AtomicU64,
    multiple_face_frames: AtomicU64,
    blink_frames: AtomicU64,
    centered_frames: AtomicU64,
    flagged_frames: AtomicU64,
    malformed_frames: AtomicU64,
    alerts_dispatched: AtomicU64,
    alerts_suppressed: AtomicU64,
    external_signals: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            frames_processed: AtomicU64::new(0),
            no_face_frames: AtomicU64::new(0),
            multiple_face_frames: AtomicU64::new(0),
            blink_frames: AtomicU64::new(0),
            centered_frames: AtomicU64::new(0),
            flagged_frames: AtomicU64::new(0),
            malformed_frames: AtomicU64::new(0),
            alerts_dispatched: AtomicU64::new(0),
            alerts_suppressed: AtomicU64::new(0),
            external_signals: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a session log that accumulates on top of the stats stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "could not load previous session stats");
        }

        log
    }

    /// Count one processed frame.
    pub fn record(&self, verdict: &Verdict) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);

        let counter = match verdict.state {
            FrameState::NoFace => &self.no_face_frames,
            FrameState::MultipleFaces => &self.multiple_face_frames,
            FrameState::Blinking => &self.blink_frames,
            FrameState::Centered => &self.centered_frames,
            FrameState::Flagged => &self.flagged_frames,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if verdict.malformed {
            self.malformed_frames.fetch_add(1, Ordering::Relaxed);
        }

        self.record_alerts(verdict.alerts.len() as u64, verdict.suppressed_alerts as u64);
    }

    /// Count one external signal.
    pub fn record_signal(&self, outcome: &SignalOutcome) {
        self.external_signals.fetch_add(1, Ordering::Relaxed);
        self.record_alerts(outcome.alerts.len() as u64, outcome.suppressed_alerts as u64);
    }

    fn record_alerts(&self, dispatched: u64, suppressed: u64) {
        self.alerts_dispatched.fetch_add(dispatched, Ordering::Relaxed);
        self.alerts_suppressed.fetch_add(suppressed, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            no_face_frames: self.no_face_frames.load(Ordering::Relaxed),
            multiple_face_frames: self.multiple_face_frames.load(Ordering::Relaxed),
            blink_frames: self.blink_frames.load(Ordering::Relaxed),
            centered_frames: self.centered_frames.load(Ordering::Relaxed),
            flagged_frames: self.flagged_frames.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            alerts_dispatched: self.alerts_dispatched.load(Ordering::Relaxed),
            alerts_suppressed: self.alerts_suppressed.load(Ordering::Relaxed),
            external_signals: self.external_signals.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Frames processed: {}\n\
             - No-face frames: {}\n\
             - Multiple-face frames: {}\n\
             - Blink frames: {}\n\
             - Centered frames: {}\n\
             - Off-screen frames: {}\n\
             - Malformed frames: {}\n\
             - Alerts dispatched: {} ({} suppressed)\n\
             - External signals: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Data Handling:\n\
             - No video or images retained\n\
             - Landmarks discarded after each frame\n\
             - Only verdict counts retained",
            stats.frames_processed,
            stats.no_face_frames,
            stats.multiple_face_frames,
            stats.blink_frames,
            stats.centered_frames,
            stats.flagged_frames,
            stats.malformed_frames,
            stats.alerts_dispatched,
            stats.alerts_suppressed,
            stats.external_signals,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let persisted = PersistedStats::from_stats(&self.stats());
            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.frames_processed
                    .store(persisted.frames_processed, Ordering::Relaxed);
                self.no_face_frames
                    .store(persisted.no_face_frames, Ordering::Relaxed);
                self.multiple_face_frames
                    .store(persisted.multiple_face_frames, Ordering::Relaxed);
                self.blink_frames
                    .store(persisted.blink_frames, Ordering::Relaxed);
                self.centered_frames
                    .store(persisted.centered_frames, Ordering::Relaxed);
                self.flagged_frames
                    .store(persisted.flagged_frames, Ordering::Relaxed);
                self.malformed_frames
                    .store(persisted.malformed_frames, Ordering::Relaxed);
                self.alerts_dispatched
                    .store(persisted.alerts_dispatched, Ordering::Relaxed);
                self.alerts_suppressed
                    .store(persisted.alerts_suppressed, Ordering::Relaxed);
                self.external_signals
                    .store(persisted.external_signals, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.frames_processed,
            &self.no_face_frames,
            &self.multiple_face_frames,
            &self.blink_frames,
            &self.centered_frames,
            &self.flagged_frames,
            &self.malformed_frames,
            &self.alerts_dispatched,
            &self.alerts_suppressed,
            &self.external_signals,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub no_face_frames: u64,
    pub multiple_face_frames: u64,
    pub blink_frames: u64,
    pub centered_frames: u64,
    pub flagged_frames: u64,
    pub malformed_frames: u64,
    pub alerts_dispatched: u64,
    pub alerts_suppressed: u64,
    pub external_signals: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedStats {
    frames_processed: u64,
    no_face_frames: u64,
    multiple_face_frames: u64,
    blink_frames: u64,
    centered_frames: u64,
    flagged_frames: u64,
    malformed_frames: u64,
    alerts_dispatched: u64,
    alerts_suppressed: u64,
    external_signals: u64,
    last_updated: Option<DateTime<Utc>>,
}

impl PersistedStats {
    fn from_stats(stats: &SessionStats) -> Self {
        Self {
            frames_processed: stats.frames_processed,
            no_face_frames: stats.no_face_frames,
            multiple_face_frames: stats.multiple_face_frames,
            blink_frames: stats.blink_frames,
            centered_frames: stats.centered_frames,
            flagged_frames: stats.flagged_frames,
            malformed_frames: stats.malformed_frames,
            alerts_dispatched: stats.alerts_dispatched,
            alerts_suppressed: stats.alerts_suppressed,
            external_signals: stats.external_signals,
            last_updated: Some(Utc::now()),
        }
    }
}

/// Thread-safe shared session log.
pub type SharedSessionLog = Arc<SessionLog>;

/// Create a new shared session log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedSessionLog {
    Arc::new(SessionLog::with_persistence(path))
}
