//! End-of-session integrity report.
//!
//! The builder follows a session verdict by verdict and produces a
//! reviewer-facing summary: final score and tier, score statistics, how
//! frames were classified, and every alert that reached the candidate.

use crate::core::gaze::Zone;
use crate::core::score::{ScoreTier, MAX_SCORE};
use crate::engine::{ExternalSignal, FrameState, SignalOutcome, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "proctor-signal-engine";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
}

/// Summary statistics of the per-frame score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; 0 with fewer than two frames
    pub std_dev: f64,
}

/// How many frames ended in each state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounts {
    pub total: u64,
    pub no_face: u64,
    pub multiple_faces: u64,
    pub blinking: u64,
    pub centered: u64,
    pub flagged: u64,
    pub malformed: u64,
}

impl FrameCounts {
    fn count(&mut self, verdict: &Verdict) {
        self.total += 1;
        match verdict.state {
            FrameState::NoFace => self.no_face += 1,
            FrameState::MultipleFaces => self.multiple_faces += 1,
            FrameState::Blinking => self.blinking += 1,
            FrameState::Centered => self.centered += 1,
            FrameState::Flagged => self.flagged += 1,
        }
        if verdict.malformed {
            self.malformed += 1;
        }
    }
}

/// Dispatched alerts by category. Throttled alerts are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts {
    /// Sustained iris deviations
    pub gaze: u64,
    /// Sustained head turns or tilts
    pub head_pose: u64,
    /// No face or multiple faces
    pub face: u64,
    pub tab_switch: u64,
}

impl ViolationCounts {
    pub fn total(&self) -> u64 {
        self.gaze + self.head_pose + self.face + self.tab_switch
    }

    fn count_frame(&mut self, verdict: &Verdict) {
        let dispatched = verdict.alerts.len() as u64;
        match (verdict.state, verdict.zone) {
            (FrameState::NoFace | FrameState::MultipleFaces, _) => self.face += dispatched,
            (_, Some(Zone::Eye(_))) => self.gaze += dispatched,
            (_, Some(Zone::Head(_))) => self.head_pose += dispatched,
            _ => {}
        }
    }

    fn count_signal(&mut self, outcome: &SignalOutcome) {
        let dispatched = outcome.alerts.len() as u64;
        match outcome.signal {
            ExternalSignal::TabSwitch => self.tab_switch += dispatched,
        }
    }
}

/// One dispatched alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub message: String,
    /// RFC3339
    pub at: String,
    /// Score right after the alert
    pub score: f64,
}

/// Complete session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Session start time (RFC3339)
    pub started_at_utc: String,
    /// When the report was built (RFC3339)
    pub ended_at_utc: String,
    pub final_score: f64,
    pub tier: ScoreTier,
    pub tier_label: String,
    pub narrative: String,
    /// Absent when no frame was observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_stats: Option<ScoreStats>,
    pub frames: FrameCounts,
    pub external_signals: u64,
    pub violations: ViolationCounts,
    pub alerts: Vec<AlertRecord>,
    pub suppressed_alerts: u64,
}

/// Accumulates verdicts into a [`SessionReport`].
pub struct ReportBuilder {
    session_id: Uuid,
    label: Option<String>,
    started_at: DateTime<Utc>,
    scores: Vec<f64>,
    final_score: f64,
    frames: FrameCounts,
    external_signals: u64,
    violations: ViolationCounts,
    alerts: Vec<AlertRecord>,
    suppressed_alerts: u64,
}

impl ReportBuilder {
    /// Create a builder with a fresh session ID.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            label: None,
            started_at: Utc::now(),
            scores: Vec::new(),
            final_score: MAX_SCORE,
            frames: FrameCounts::default(),
            external_signals: 0,
            violations: ViolationCounts::default(),
            alerts: Vec::new(),
            suppressed_alerts: 0,
        }
    }

    /// Attach a free-form label (exam name, candidate reference).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn frames_observed(&self) -> u64 {
        self.frames.total
    }

    pub fn observe(&mut self, verdict: &Verdict) {
        self.observe_at(verdict, Utc::now());
    }

    /// Record a verdict, stamping its alerts with `at`.
    pub fn observe_at(&mut self, verdict: &Verdict, at: DateTime<Utc>) {
        self.frames.count(verdict);
        self.violations.count_frame(verdict);
        self.scores.push(verdict.score);
        self.record_alerts(&verdict.alerts, verdict.suppressed_alerts, verdict.score, at);
    }

    pub fn observe_signal(&mut self, outcome: &SignalOutcome) {
        self.observe_signal_at(outcome, Utc::now());
    }

    pub fn observe_signal_at(&mut self, outcome: &SignalOutcome, at: DateTime<Utc>) {
        self.external_signals += 1;
        self.violations.count_signal(outcome);
        self.record_alerts(&outcome.alerts, outcome.suppressed_alerts, outcome.score, at);
    }

    fn record_alerts(&mut self, alerts: &[String], suppressed: u32, score: f64, at: DateTime<Utc>) {
        self.final_score = score;
        self.suppressed_alerts += u64::from(suppressed);
        self.alerts.extend(alerts.iter().map(|message| AlertRecord {
            message: message.clone(),
            at: at.to_rfc3339(),
            score,
        }));
    }

    fn score_stats(&self) -> Option<ScoreStats> {
        if self.scores.is_empty() {
            return None;
        }

        let std_dev = if self.scores.len() < 2 {
            0.0
        } else {
            self.scores.iter().std_dev()
        };

        Some(ScoreStats {
            mean: self.scores.iter().mean(),
            min: Statistics::min(self.scores.iter()),
            max: Statistics::max(self.scores.iter()),
            std_dev,
        })
    }

    /// Build the report as of now.
    pub fn build(&self) -> SessionReport {
        let tier = ScoreTier::from_score(self.final_score);

        SessionReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            session_id: self.session_id.to_string(),
            label: self.label.clone(),
            started_at_utc: self.started_at.to_rfc3339(),
            ended_at_utc: Utc::now().to_rfc3339(),
            final_score: self.final_score,
            tier,
            tier_label: tier.label().to_string(),
            narrative: tier.narrative().to_string(),
            score_stats: self.score_stats(),
            frames: self.frames.clone(),
            external_signals: self.external_signals,
            violations: self.violations.clone(),
            alerts: self.alerts.clone(),
            suppressed_alerts: self.suppressed_alerts,
        }
    }

    /// Build and serialize the report to JSON.
    pub fn build_json(&self) -> String {
        serde_json::to_string_pretty(&self.build()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
