//! Demonstration of the Proctor Signal Engine on a scripted session.
//!
//! This example shows how to:
//! 1. Create an engine with a callback sink
//! 2. Feed it synthetic landmark frames at 30 fps
//! 3. Apply a host-observed tab switch
//! 4. Keep a session log and build the end-of-session report
//!
//! Run with: cargo run --example replay_demo

use std::time::{Duration, Instant};

use proctor_signal_engine::{
    audit::SessionLog,
    core::ReportBuilder,
    landmarks::fixtures::FaceBuilder,
    CallbackSink, Engine, EngineConfig, EngineEvent, ExternalSignal, Frame, MONITORING_NOTICE,
};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn main() {
    println!("Proctor Signal Engine - Replay Demo");
    println!("===================================");
    println!();
    println!("{MONITORING_NOTICE}");

    let sink = CallbackSink::new(|event| {
        if let EngineEvent::Alert { message, score, at } = event {
            println!("  [{}] {message} (score {score:.1})", at.format("%H:%M:%S%.3f"));
        }
    });

    let mut engine = match Engine::new(EngineConfig::default(), sink) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return;
        }
    };

    let log = SessionLog::new();
    let mut report = ReportBuilder::new().with_label("replay demo");

    let centered = Frame::single(FaceBuilder::neutral().build());
    let blink = Frame::single(FaceBuilder::neutral().eyes_closed().build());
    let glance = Frame::single(FaceBuilder::neutral().iris_offset(0.5, 0.0).build());
    let head_turn = Frame::single(FaceBuilder::neutral().head_offset(-0.4, 0.0).build());
    let second_person = Frame::new(vec![
        FaceBuilder::neutral().build(),
        FaceBuilder::neutral().head_offset(0.2, 0.1).build(),
    ]);

    // (description, frame, repetitions)
    let script: [(&str, &Frame, usize); 7] = [
        ("Candidate settles in", &centered, 60),
        ("Blink", &blink, 4),
        ("Brief glance right", &glance, 5),
        ("Reading notes off to the right", &glance, 30),
        ("Turns head away", &head_turn, 20),
        ("Someone walks behind", &second_person, 60),
        ("Candidate leaves the desk", &Frame::empty(), 60),
    ];

    let mut now = Instant::now();
    for (description, frame, repetitions) in script {
        println!("{description} ({repetitions} frames)");
        for _ in 0..repetitions {
            let verdict = engine.process_at(frame, now);
            log.record(&verdict);
            report.observe(&verdict);
            now += FRAME_INTERVAL;
        }
    }

    println!("Tab switch");
    let outcome = engine.signal_at(ExternalSignal::TabSwitch, now);
    log.record_signal(&outcome);
    report.observe_signal(&outcome);

    println!();
    println!("{}", log.summary());
    println!();
    println!("Session Report");
    println!("==============");
    println!("{}", report.build_json());
}
