//! Net off-zone counter.
//!
//! Off-zone frames push the counter up, on-screen frames pull it down by one.
//! Brief glances therefore drain away instead of accumulating, while a
//! sustained deviation crosses the threshold and trips once.

use serde::{Deserialize, Serialize};

/// Result of feeding one frame to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HysteresisStep {
    /// Off-zone, still under the threshold
    Rising(u32),
    /// Threshold exceeded; the counter has been reset
    Tripped,
    /// On-screen frame
    Falling(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteresisCounter {
    count: u32,
    threshold: u32,
}

impl HysteresisCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn observe_off_zone(&mut self) -> HysteresisStep {
        self.count = self.count.saturating_add(1);
        if self.count > self.threshold {
            self.count = 0;
            HysteresisStep::Tripped
        } else {
            HysteresisStep::Rising(self.count)
        }
    }

    pub fn observe_on_screen(&mut self) -> HysteresisStep {
        self.count = self.count.saturating_sub(1);
        HysteresisStep::Falling(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_after_threshold_exceeded() {
        let mut counter = HysteresisCounter::new(8);
        for expected in 1..=8 {
            assert_eq!(counter.observe_off_zone(), HysteresisStep::Rising(expected));
        }
        assert_eq!(counter.observe_off_zone(), HysteresisStep::Tripped);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_on_screen_decrements_instead_of_resetting() {
        let mut counter = HysteresisCounter::new(8);
        for _ in 0..5 {
            counter.observe_off_zone();
        }
        assert_eq!(counter.observe_on_screen(), HysteresisStep::Falling(4));

        // Four more off-zone frames reach 8, not enough to trip
        for _ in 0..4 {
            assert_ne!(counter.observe_off_zone(), HysteresisStep::Tripped);
        }
        assert_eq!(counter.observe_off_zone(), HysteresisStep::Tripped);
    }

    #[test]
    fn test_floor_at_zero() {
        let mut counter = HysteresisCounter::new(3);
        assert_eq!(counter.observe_on_screen(), HysteresisStep::Falling(0));
        assert_eq!(counter.observe_on_screen(), HysteresisStep::Falling(0));
    }

    #[test]
    fn test_zero_threshold_trips_every_frame() {
        let mut counter = HysteresisCounter::new(0);
        assert_eq!(counter.observe_off_zone(), HysteresisStep::Tripped);
        assert_eq!(counter.observe_off_zone(), HysteresisStep::Tripped);
    }
}
