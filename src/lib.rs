//! Proctor Signal Engine - integrity signals for webcam-proctored assessments.
//!
//! This library turns per-frame face-mesh landmarks into proctoring signals:
//! who is in front of the camera, whether they are blinking, where they are
//! looking, and a running trust score with throttled alerts.
//!
//! # Guarantees
//!
//! - **No images**: The engine only ever sees normalized landmark coordinates
//! - **No retention**: Landmarks are dropped once a frame is classified
//! - **Never fails on input**: Empty, crowded or malformed frames all yield a verdict
//! - **Deterministic**: Same config, frames and timestamps give the same verdicts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Proctor Signal Engine                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Landmarks  │──▶│  Presence   │──▶│ Blink / Gaze│        │
//! │  │  (Frame)    │   │  classify   │   │   fusion    │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                                             │                │
//! │                                             ▼                │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ Event Sink  │◀──│  Throttle   │◀──│ Hysteresis  │        │
//! │  │  (host)     │   │  + Score    │   │  counter    │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                                                    │
//! │         ▼                                                    │
//! │  ┌─────────────┐   ┌─────────────┐                          │
//! │  │ Session Log │   │   Report    │                          │
//! │  └─────────────┘   └─────────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use proctor_signal_engine::{Engine, EngineConfig, Frame, VecSink};
//!
//! let sink = VecSink::new();
//! let mut engine = Engine::new(EngineConfig::default(), sink.clone()).unwrap();
//!
//! let verdict = engine.process(&Frame::empty());
//! assert_eq!(verdict.score, 99.0);
//! assert_eq!(sink.alerts(), vec!["⚠️ No face detected".to_string()]);
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod engine;
pub mod landmarks;
pub mod replay;
pub mod sink;

// Re-export key types at crate root for convenience
pub use audit::{SessionLog, SessionStats, SharedSessionLog};
pub use config::{Config, ConfigError, EngineConfig, PenaltyConfig};
pub use core::{Presence, ReportBuilder, ScoreTier, SessionReport, Zone};
pub use engine::{
    Engine, EngineEvent, EngineState, ExternalSignal, FrameState, SignalOutcome, Verdict,
};
pub use landmarks::{Face, Frame, LandmarkError, LandmarkPoint};
pub use replay::{FrameReader, RecordedFrame, ReplayError};
pub use sink::{CallbackSink, ChannelSink, EventSink, NoopSink, SinkError, VecSink};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Monitoring notice to show candidates before a session starts.
pub const MONITORING_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              PROCTORED SESSION - MONITORING NOTICE               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Your webcam is used to check assessment integrity.              ║
║                                                                  ║
║  ✓ WHAT IS CHECKED:                                              ║
║    • Whether exactly one face is in view                         ║
║    • Whether your eyes and head stay toward the screen           ║
║    • Whether you switch away from the assessment tab             ║
║                                                                  ║
║  ✗ WHAT IS NEVER KEPT:                                           ║
║    • Video or still images of you                                ║
║    • Facial landmarks beyond the current frame                   ║
║    • Anything about your surroundings                            ║
║                                                                  ║
║  Blinks and brief glances are ignored. Only sustained looking    ║
║  away, a missing face or extra faces lower the integrity score.  ║
║                                                                  ║
║  Session counts can be reviewed anytime with:                    ║
║    proctor-signal status                                         ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitoring_notice_contents() {
        assert!(MONITORING_NOTICE.contains("MONITORING NOTICE"));
        assert!(MONITORING_NOTICE.contains("NEVER KEPT"));
        assert!(MONITORING_NOTICE.contains("Video or still images"));
    }
}
