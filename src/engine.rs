//! Engine facade.
//!
//! [`Engine::process_at`] takes one landmark frame through presence, blink,
//! gaze/head-pose fusion, hysteresis, the trust score and the alert
//! throttler, and returns a [`Verdict`]. Alerts and score changes are also
//! pushed to the injected [`EventSink`] in processing order.
//!
//! Everything except the alert throttle window is counted in frames, so the
//! engine may be called at any frame rate. The only state carried between
//! calls is [`EngineState`].

use crate::config::{ConfigError, EngineConfig};
use crate::core::blink::detect_blink;
use crate::core::gaze::{GazeClassifier, Zone};
use crate::core::hysteresis::{HysteresisCounter, HysteresisStep};
use crate::core::presence::{classify_presence, Presence, PresenceReading};
use crate::core::score::{ScoreTier, TrustScore};
use crate::core::throttle::AlertThrottler;
use crate::landmarks::types::{FaceLandmarks, Frame};
use crate::sink::EventSink;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

pub const NO_FACE_ALERT: &str = "⚠️ No face detected";
pub const MULTIPLE_FACES_ALERT: &str = "⚠️ Multiple faces detected";
pub const TAB_SWITCH_ALERT: &str = "🚫 Tab switched";

/// Outcome class of one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameState {
    NoFace,
    MultipleFaces,
    Blinking,
    Centered,
    /// Off-screen zone; counts toward the hysteresis counter
    Flagged,
}

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub presence: Presence,
    pub state: FrameState,
    pub blink: bool,
    /// Fused zone; only set when a single open-eyed face was evaluated
    pub zone: Option<Zone>,
    pub score: f64,
    pub gaze_out_counter: u32,
    /// Alerts dispatched while processing this frame
    pub alerts: Vec<String>,
    /// Alerts raised but dropped by the throttle
    pub suppressed_alerts: u32,
    /// A lone face was present but lacked usable landmarks
    pub malformed: bool,
}

impl Verdict {
    /// Short status text for a live display.
    pub fn status_label(&self) -> String {
        match self.state {
            FrameState::NoFace => "-".to_string(),
            FrameState::MultipleFaces => "Multiple".to_string(),
            FrameState::Blinking => "Blink".to_string(),
            FrameState::Centered | FrameState::Flagged => self
                .zone
                .map(|zone| zone.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }
}

/// Signals observed by the host rather than the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSignal {
    /// The assessment tab lost visibility
    TabSwitch,
}

/// Result of applying an external signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalOutcome {
    pub signal: ExternalSignal,
    pub score: f64,
    pub alerts: Vec<String>,
    pub suppressed_alerts: u32,
}

/// Events pushed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Alert {
        message: String,
        /// Score after the penalty tied to this alert
        score: f64,
        at: DateTime<Utc>,
    },
    /// The displayed (whole-number) score moved
    ScoreChanged {
        previous: f64,
        current: f64,
        at: DateTime<Utc>,
    },
}

/// Everything the engine remembers between frames.
#[derive(Debug, Clone)]
pub struct EngineState {
    score: TrustScore,
    hysteresis: HysteresisCounter,
    throttle: AlertThrottler,
}

impl EngineState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            score: TrustScore::new(),
            hysteresis: HysteresisCounter::new(config.suspicion_threshold),
            throttle: AlertThrottler::new(config.alert_window),
        }
    }

    pub fn trust_score(&self) -> f64 {
        self.score.value()
    }

    pub fn gaze_out_counter(&self) -> u32 {
        self.hysteresis.count()
    }

    /// When `message` was last dispatched.
    pub fn last_alert(&self, message: &str) -> Option<Instant> {
        self.throttle.last_dispatched(message)
    }

    pub fn tier(&self) -> ScoreTier {
        self.score.tier()
    }
}

#[derive(Default)]
struct Dispatched {
    alerts: Vec<String>,
    suppressed: u32,
}

/// The integrity signal engine for one monitoring session.
pub struct Engine {
    config: EngineConfig,
    gaze: GazeClassifier,
    state: EngineState,
    sink: Box<dyn EventSink + Send>,
}

impl Engine {
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new<S>(config: EngineConfig, sink: S) -> Result<Self, ConfigError>
    where
        S: EventSink + Send + 'static,
    {
        config.validate()?;
        info!(
            suspicion_threshold = config.suspicion_threshold,
            alert_window_ms = config.alert_window.as_millis() as u64,
            "integrity engine created"
        );

        Ok(Self {
            gaze: GazeClassifier::new(&config),
            state: EngineState::new(&config),
            config,
            sink: Box::new(sink),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Copy of the current state.
    pub fn state(&self) -> EngineState {
        self.state.clone()
    }

    pub fn score(&self) -> f64 {
        self.state.score.value()
    }

    /// Process a frame captured now.
    pub fn process(&mut self, frame: &Frame) -> Verdict {
        self.process_at(frame, Instant::now())
    }

    /// Process a frame, using `now` for the alert throttle.
    pub fn process_at(&mut self, frame: &Frame, now: Instant) -> Verdict {
        let previous_score = self.state.score.value();
        let mut dispatched = Dispatched::default();

        let reading = classify_presence(frame);
        let presence = reading.presence();
        let malformed = reading.is_malformed();

        let (state, blink, zone) = match reading {
            PresenceReading::None { defect } => {
                if let Some(defect) = defect {
                    warn!(%defect, "unusable face landmarks, treating frame as no face");
                }
                let penalty = self.config.penalties.no_face;
                self.presence_anomaly(NO_FACE_ALERT, penalty, now, &mut dispatched);
                (FrameState::NoFace, false, None)
            }
            PresenceReading::Multiple(count) => {
                debug!(count, "multiple faces in frame");
                let penalty = self.config.penalties.multiple_faces;
                self.presence_anomaly(MULTIPLE_FACES_ALERT, penalty, now, &mut dispatched);
                (FrameState::MultipleFaces, false, None)
            }
            PresenceReading::Single(face) => self.evaluate_face(&face, now, &mut dispatched),
        };

        self.notify_score_change(previous_score);

        Verdict {
            presence,
            state,
            blink,
            zone,
            score: self.state.score.value(),
            gaze_out_counter: self.state.hysteresis.count(),
            alerts: dispatched.alerts,
            suppressed_alerts: dispatched.suppressed,
            malformed,
        }
    }

    /// Apply a host-observed signal now.
    pub fn signal(&mut self, signal: ExternalSignal) -> SignalOutcome {
        self.signal_at(signal, Instant::now())
    }

    pub fn signal_at(&mut self, signal: ExternalSignal, now: Instant) -> SignalOutcome {
        let previous_score = self.state.score.value();
        let mut dispatched = Dispatched::default();

        match signal {
            ExternalSignal::TabSwitch => {
                self.state.score.penalize(self.config.penalties.tab_switch);
                self.dispatch(TAB_SWITCH_ALERT, now, &mut dispatched);
            }
        }

        self.notify_score_change(previous_score);

        SignalOutcome {
            signal,
            score: self.state.score.value(),
            alerts: dispatched.alerts,
            suppressed_alerts: dispatched.suppressed,
        }
    }

    fn evaluate_face(
        &mut self,
        face: &FaceLandmarks,
        now: Instant,
        dispatched: &mut Dispatched,
    ) -> (FrameState, bool, Option<Zone>) {
        if detect_blink(face, self.config.blink_threshold).is_blinking {
            return (FrameState::Blinking, true, None);
        }

        let zone = self.gaze.classify(face).zone;

        match zone.alert_message() {
            Some(message) => {
                if self.state.hysteresis.observe_off_zone() == HysteresisStep::Tripped {
                    debug!(%zone, "sustained deviation");
                    self.state
                        .score
                        .penalize(self.config.penalties.sustained_deviation);
                    self.dispatch(&message, now, dispatched);
                }
                (FrameState::Flagged, false, Some(zone))
            }
            None => {
                self.state.hysteresis.observe_on_screen();
                self.state
                    .score
                    .recover(self.config.recovery_per_centered_frame);
                (FrameState::Centered, false, Some(zone))
            }
        }
    }

    /// No-face and multiple-face frames: the penalty follows the throttle
    /// unless `throttle_penalties` is off.
    fn presence_anomaly(
        &mut self,
        message: &str,
        penalty: f64,
        now: Instant,
        dispatched: &mut Dispatched,
    ) {
        let admitted = self.state.throttle.admit(message, now);

        if admitted || !self.config.throttle_penalties {
            self.state.score.penalize(penalty);
        }

        if admitted {
            self.emit_alert(message, dispatched);
        } else {
            dispatched.suppressed += 1;
        }
    }

    fn dispatch(&mut self, message: &str, now: Instant, dispatched: &mut Dispatched) {
        if self.state.throttle.admit(message, now) {
            self.emit_alert(message, dispatched);
        } else {
            debug!(alert = message, "alert throttled");
            dispatched.suppressed += 1;
        }
    }

    fn emit_alert(&mut self, message: &str, dispatched: &mut Dispatched) {
        dispatched.alerts.push(message.to_string());
        self.send(EngineEvent::Alert {
            message: message.to_string(),
            score: self.state.score.value(),
            at: Utc::now(),
        });
    }

    fn notify_score_change(&mut self, previous: f64) {
        let current = self.state.score.value();
        if previous.floor() != current.floor() {
            self.send(EngineEvent::ScoreChanged {
                previous,
                current,
                at: Utc::now(),
            });
        }
    }

    fn send(&mut self, event: EngineEvent) {
        if let Err(e) = self.sink.send(event) {
            warn!(error = %e, "event sink failed, event dropped");
        }
    }
}
