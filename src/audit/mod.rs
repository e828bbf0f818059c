//! Session audit module.
//!
//! Keeps running counts of what the engine decided over a session so a
//! reviewer (or the candidate) can see how often each kind of anomaly fired.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log_with_persistence, SessionLog, SessionStats, SharedSessionLog};
