//! Event sinks.
//!
//! The engine hands alerts and score changes to a sink supplied at
//! construction. Sinks must not block: persistence and broadcast belong to
//! the host, and a failing sink never interrupts classification.

use crate::engine::EngineEvent;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Errors a sink may report back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    /// The receiving side has gone away
    Disconnected,
    /// The sink is at capacity and dropped the event
    Full,
    Rejected(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Disconnected => write!(f, "Event sink disconnected"),
            SinkError::Full => write!(f, "Event sink is full"),
            SinkError::Rejected(reason) => write!(f, "Event rejected: {reason}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Destination for engine events.
pub trait EventSink {
    fn send(&mut self, event: EngineEvent) -> Result<(), SinkError>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn send(&mut self, _event: EngineEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forwards events over a bounded channel without blocking.
pub struct ChannelSink {
    sender: Sender<EngineEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver a host thread drains.
    pub fn new(capacity: usize) -> (Self, Receiver<EngineEvent>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn send(&mut self, event: EngineEvent) -> Result<(), SinkError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

/// Calls a closure for every event.
///
/// A panic inside the closure is caught and reported as
/// [`SinkError::Rejected`], so it never unwinds through the engine.
pub struct CallbackSink {
    callback: Box<dyn FnMut(EngineEvent) + Send>,
}

impl CallbackSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(EngineEvent) + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl EventSink for CallbackSink {
    fn send(&mut self, event: EngineEvent) -> Result<(), SinkError> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(event)))
            .map_err(|_| SinkError::Rejected("callback panicked".to_string()))
    }
}

/// Collects events in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct VecSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Messages of the alert events received so far, in order.
    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Alert { message, .. } => Some(message),
                EngineEvent::ScoreChanged { .. } => None,
            })
            .collect()
    }
}

impl EventSink for VecSink {
    fn send(&mut self, event: EngineEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .map_err(|_| SinkError::Rejected("event buffer poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}
