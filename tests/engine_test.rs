//! Integration tests for the integrity engine

use proctor_signal_engine::{
    audit::SessionLog,
    core::ReportBuilder,
    engine::{MULTIPLE_FACES_ALERT, NO_FACE_ALERT},
    landmarks::fixtures::FaceBuilder,
    ChannelSink, Engine, EngineConfig, EngineEvent, Frame, FrameReader, FrameState, NoopSink,
    Presence, RecordedFrame, VecSink, Verdict,
};
use std::io::Cursor;
use std::time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(33);

fn engine() -> Engine {
    Engine::new(EngineConfig::default(), NoopSink).unwrap()
}

fn centered() -> Frame {
    Frame::single(FaceBuilder::neutral().build())
}

fn looking_right() -> Frame {
    Frame::single(FaceBuilder::neutral().iris_offset(0.5, 0.0).build())
}

/// Feed `frame` `count` times at 30 fps starting from `start`; returns the
/// verdicts and the instant after the last frame.
fn run(
    engine: &mut Engine,
    frame: &Frame,
    count: usize,
    start: Instant,
) -> (Vec<Verdict>, Instant) {
    let mut now = start;
    let verdicts = (0..count)
        .map(|_| {
            let verdict = engine.process_at(frame, now);
            now += FRAME;
            verdict
        })
        .collect();
    (verdicts, now)
}

fn all_alerts(verdicts: &[Verdict]) -> Vec<String> {
    verdicts.iter().flat_map(|v| v.alerts.clone()).collect()
}

#[test]
fn test_zero_faces_never_raise_gaze_alerts() {
    let mut engine = engine();
    let (verdicts, _) = run(&mut engine, &Frame::empty(), 5, Instant::now());

    for verdict in &verdicts {
        assert_eq!(verdict.presence, Presence::None);
        assert_eq!(verdict.zone, None);
        assert!(!verdict.blink);
    }
    assert_eq!(all_alerts(&verdicts), vec![NO_FACE_ALERT.to_string()]);
}

#[test]
fn test_multiple_faces_alert_once_per_window() {
    let sink = VecSink::new();
    let mut engine = Engine::new(EngineConfig::default(), sink.clone()).unwrap();
    let crowd = Frame::new(vec![
        FaceBuilder::neutral().build(),
        FaceBuilder::neutral().head_offset(0.3, 0.0).build(),
    ]);

    let (verdicts, _) = run(&mut engine, &crowd, 20, Instant::now());

    assert!(verdicts.iter().all(|v| v.presence == Presence::Multiple(2)));
    assert_eq!(sink.alerts(), vec![MULTIPLE_FACES_ALERT.to_string()]);
    assert_eq!(engine.score(), 95.0);
}

#[test]
fn test_blink_is_not_penalized() {
    let mut engine = engine();
    let blink = Frame::single(FaceBuilder::neutral().eyes_closed().build());
    let (verdicts, _) = run(&mut engine, &blink, 10, Instant::now());

    assert!(verdicts.iter().all(|v| v.blink && v.state == FrameState::Blinking));
    assert!(all_alerts(&verdicts).is_empty());
    assert_eq!(engine.score(), 100.0);
}

#[test]
fn test_threshold_off_zone_frames_do_not_alert() {
    let mut engine = engine();
    let (mut verdicts, now) = run(&mut engine, &looking_right(), 8, Instant::now());
    verdicts.extend(run(&mut engine, &centered(), 1, now).0);

    assert!(all_alerts(&verdicts).is_empty());
    assert_eq!(verdicts[7].gaze_out_counter, 8);
    assert_eq!(verdicts[8].gaze_out_counter, 7);
    assert_eq!(engine.score(), 100.0);
}

#[test]
fn test_centered_frame_after_trip_keeps_counter_at_zero() {
    let mut engine = engine();
    let (mut verdicts, now) = run(&mut engine, &looking_right(), 9, Instant::now());
    verdicts.extend(run(&mut engine, &centered(), 1, now).0);

    assert_eq!(all_alerts(&verdicts), vec!["👁️ Eye→Right".to_string()]);
    assert_eq!(verdicts[8].gaze_out_counter, 0);
    assert_eq!(verdicts[9].gaze_out_counter, 0);
    assert_eq!(verdicts[9].state, FrameState::Centered);
    assert!(verdicts[9].alerts.is_empty());
    assert!((engine.score() - 97.1).abs() < 1e-9);
}

#[test]
fn test_one_below_threshold_then_centered_does_not_alert() {
    let mut engine = engine();
    let (mut verdicts, now) = run(&mut engine, &looking_right(), 7, Instant::now());
    verdicts.extend(run(&mut engine, &centered(), 1, now).0);

    assert!(all_alerts(&verdicts).is_empty());
    assert_eq!(engine.state().gaze_out_counter(), 6);
}

#[test]
fn test_sustained_iris_deviation_alerts_on_ninth_frame() {
    let sink = VecSink::new();
    let mut engine = Engine::new(EngineConfig::default(), sink.clone()).unwrap();
    let (verdicts, _) = run(&mut engine, &looking_right(), 9, Instant::now());

    for verdict in &verdicts[..8] {
        assert!(verdict.alerts.is_empty());
        assert_eq!(verdict.state, FrameState::Flagged);
        assert_eq!(verdict.score, 100.0);
    }

    let ninth = &verdicts[8];
    assert_eq!(ninth.alerts, vec!["👁️ Eye→Right".to_string()]);
    assert_eq!(ninth.score, 97.0);
    assert_eq!(ninth.gaze_out_counter, 0);
    assert_eq!(ninth.status_label(), "Eye→Right");
    assert_eq!(sink.alerts(), vec!["👁️ Eye→Right".to_string()]);
}

#[test]
fn test_sustained_head_turn_alerts_with_head_zone() {
    let mut engine = engine();
    let turned = Frame::single(FaceBuilder::neutral().head_offset(0.5, 0.0).build());
    let (verdicts, _) = run(&mut engine, &turned, 9, Instant::now());

    assert_eq!(all_alerts(&verdicts), vec!["🔄 Head→Right".to_string()]);
    assert_eq!(engine.score(), 97.0);
}

#[test]
fn test_no_face_throttled_penalty() {
    let mut engine = engine();
    let t0 = Instant::now();
    let mut alerts = Vec::new();
    for offset_ms in [0, 400, 800] {
        let verdict = engine.process_at(&Frame::empty(), t0 + Duration::from_millis(offset_ms));
        alerts.extend(verdict.alerts);
    }

    assert_eq!(alerts, vec![NO_FACE_ALERT.to_string()]);
    assert_eq!(engine.score(), 99.0);
}

#[test]
fn test_no_face_unthrottled_penalty() {
    let config = EngineConfig {
        throttle_penalties: false,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, NoopSink).unwrap();
    let t0 = Instant::now();
    let mut alerts = Vec::new();
    for offset_ms in [0, 400, 800] {
        let verdict = engine.process_at(&Frame::empty(), t0 + Duration::from_millis(offset_ms));
        alerts.extend(verdict.alerts);
    }

    assert_eq!(alerts, vec![NO_FACE_ALERT.to_string()]);
    assert_eq!(engine.score(), 97.0);
}

#[test]
fn test_alert_repeats_after_window() {
    let mut engine = engine();
    let t0 = Instant::now();

    let first = engine.process_at(&Frame::empty(), t0);
    let inside = engine.process_at(&Frame::empty(), t0 + Duration::from_millis(1499));
    let after = engine.process_at(&Frame::empty(), t0 + Duration::from_millis(1500));

    assert_eq!(first.alerts.len(), 1);
    assert!(inside.alerts.is_empty());
    assert_eq!(inside.suppressed_alerts, 1);
    assert_eq!(after.alerts.len(), 1);
    assert_eq!(engine.score(), 98.0);
}

#[test]
fn test_score_stays_in_bounds() {
    let config = EngineConfig {
        throttle_penalties: false,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config, NoopSink).unwrap();
    let crowd = Frame::new(vec![FaceBuilder::neutral().build(); 3]);

    let (verdicts, now) = run(&mut engine, &crowd, 40, Instant::now());
    assert!(verdicts.iter().all(|v| (0.0..=100.0).contains(&v.score)));
    assert_eq!(engine.score(), 0.0);

    let (verdicts, _) = run(&mut engine, &centered(), 1500, now);
    assert!(verdicts.iter().all(|v| (0.0..=100.0).contains(&v.score)));
    assert_eq!(engine.score(), 100.0);
}

#[test]
fn test_identical_inputs_give_identical_verdicts() {
    let script = [
        centered(),
        looking_right(),
        Frame::empty(),
        Frame::single(FaceBuilder::neutral().eyes_closed().build()),
        Frame::new(vec![FaceBuilder::neutral().build(); 2]),
        Frame::single(FaceBuilder::neutral().head_offset(0.0, -0.6).build()),
    ];

    let t0 = Instant::now();
    let replay = || {
        let mut engine = engine();
        let mut verdicts = Vec::new();
        let mut now = t0;
        for round in 0..12 {
            for frame in &script[round % script.len()..] {
                verdicts.push(engine.process_at(frame, now));
                now += FRAME;
            }
        }
        verdicts
    };

    assert_eq!(replay(), replay());
}

#[test]
fn test_malformed_face_is_no_face() {
    let mut engine = engine();
    let truncated = Frame::single(FaceBuilder::neutral().truncated(400).build());
    let verdict = engine.process_at(&truncated, Instant::now());

    assert_eq!(verdict.presence, Presence::None);
    assert_eq!(verdict.state, FrameState::NoFace);
    assert!(verdict.malformed);
    assert_eq!(verdict.alerts, vec![NO_FACE_ALERT.to_string()]);
    assert_eq!(verdict.score, 99.0);
}

#[test]
fn test_malformed_faces_still_count_as_multiple() {
    let mut engine = engine();
    let broken = FaceBuilder::neutral().truncated(10).build();
    let verdict = engine.process_at(&Frame::new(vec![broken.clone(), broken]), Instant::now());

    assert_eq!(verdict.presence, Presence::Multiple(2));
    assert_eq!(verdict.alerts, vec![MULTIPLE_FACES_ALERT.to_string()]);
}

#[test]
fn test_channel_sink_receives_events_in_order() {
    let (sink, events) = ChannelSink::new(16);
    let mut engine = Engine::new(EngineConfig::default(), sink).unwrap();
    let t0 = Instant::now();

    engine.process_at(&Frame::empty(), t0);
    run(&mut engine, &looking_right(), 9, t0 + FRAME);

    let received: Vec<EngineEvent> = events.try_iter().collect();
    let summary: Vec<String> = received
        .iter()
        .map(|event| match event {
            EngineEvent::Alert { message, .. } => message.clone(),
            EngineEvent::ScoreChanged { current, .. } => format!("score {current}"),
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            NO_FACE_ALERT.to_string(),
            "score 99".to_string(),
            "👁️ Eye→Right".to_string(),
            "score 96".to_string(),
        ]
    );
}

#[test]
fn test_recorded_session_through_log_and_report() {
    let mut lines = Vec::new();
    for i in 0..30u64 {
        let frame = if i < 10 { centered() } else { looking_right() };
        let recorded = RecordedFrame {
            timestamp_ms: Some(i * 33),
            frame,
        };
        lines.push(serde_json::to_string(&recorded).unwrap());
    }
    lines.push(r#"{"timestamp_ms": 1000, "faces": []}"#.to_string());

    let mut engine = engine();
    let log = SessionLog::new();
    let mut report = ReportBuilder::new();
    let base = Instant::now();

    for entry in FrameReader::new(Cursor::new(lines.join("\n"))) {
        let (_, recorded) = entry.unwrap();
        let verdict = engine.process_at(&recorded.frame, recorded.at(base).unwrap());
        log.record(&verdict);
        report.observe(&verdict);
    }

    let stats = log.stats();
    assert_eq!(stats.frames_processed, 31);
    assert_eq!(stats.centered_frames, 10);
    assert_eq!(stats.flagged_frames, 20);
    assert_eq!(stats.no_face_frames, 1);
    // Trips at off-zone frames 9 and 18; the second falls inside the window
    assert_eq!(stats.alerts_dispatched, 2);
    assert_eq!(stats.alerts_suppressed, 1);

    let built = report.build();
    assert_eq!(built.frames.total, 31);
    assert_eq!(built.final_score, engine.score());
    assert_eq!(built.final_score, 93.0);
    let messages: Vec<&str> = built.alerts.iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, vec!["👁️ Eye→Right", NO_FACE_ALERT]);
}
