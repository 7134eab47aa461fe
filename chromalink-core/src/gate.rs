//! Decision gate
//!
//! Sits between the classifier and the dispatcher. A classification only
//! becomes a data frame when its confidence is strictly above the
//! deployment threshold and the previous data frame left at least
//! `min_interval_ms` ago. Everything else is dropped on the floor: this is a
//! best-effort telemetry stream and flicker suppression matters more than
//! completeness.

use chromalink_protocol::{HostMessage, Rgb};

use crate::classifier::Classification;

/// Default minimum spacing between two data frames
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 100;

/// Outcome of one classification tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    /// Hand this message to the dispatcher
    Transmit(HostMessage),
    /// Confidence at or below threshold
    LowConfidence,
    /// Confident, but the send interval has not elapsed
    Throttled,
    /// Prediction is not running
    Idle,
}

/// Prediction flag plus threshold and throttle state
#[derive(Debug, Clone)]
pub struct DecisionGate {
    predicting: bool,
    threshold_percent: u8,
    min_interval_ms: u64,
    /// Timestamp of the last data frame handed out (monotonic ms)
    last_sent_ms: Option<u64>,
}

impl DecisionGate {
    /// Create a stopped gate
    pub fn new(threshold_percent: u8, min_interval_ms: u64) -> Self {
        Self {
            predicting: false,
            threshold_percent,
            min_interval_ms,
            last_sent_ms: None,
        }
    }

    pub fn is_predicting(&self) -> bool {
        self.predicting
    }

    pub fn threshold_percent(&self) -> u8 {
        self.threshold_percent
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Begin predicting
    ///
    /// The send window carries over from the previous run.
    pub fn start(&mut self) {
        self.predicting = true;
    }

    /// Stop predicting
    ///
    /// Always returns the `stop` control message, whether or not prediction
    /// was running and regardless of the send interval.
    pub fn stop(&mut self) -> HostMessage {
        self.predicting = false;
        HostMessage::Stop
    }

    /// Stop without producing a control message (classifier had no data)
    pub fn halt(&mut self) {
        self.predicting = false;
    }

    /// Decide what to do with one classification
    ///
    /// `color` is the color sampled this tick, not a training color.
    pub fn evaluate(&mut self, result: &Classification, color: Rgb, now_ms: u64) -> Decision {
        if !self.predicting {
            return Decision::Idle;
        }

        if !result.exceeds(self.threshold_percent) {
            return Decision::LowConfidence;
        }

        if let Some(last) = self.last_sent_ms {
            if now_ms.saturating_sub(last) <= self.min_interval_ms {
                return Decision::Throttled;
            }
        }

        self.last_sent_ms = Some(now_ms);
        Decision::Transmit(HostMessage::Data {
            label: result.label.id(),
            color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Label;

    fn confident(label: u32) -> Classification {
        Classification {
            label: Label::new(label),
            votes: 3,
            neighbors: 3,
        }
    }

    fn running_gate() -> DecisionGate {
        let mut gate = DecisionGate::new(70, DEFAULT_MIN_INTERVAL_MS);
        gate.start();
        gate
    }

    #[test]
    fn test_idle_when_not_predicting() {
        let mut gate = DecisionGate::new(70, 100);
        assert_eq!(
            gate.evaluate(&confident(1), Rgb::BLACK, 0),
            Decision::Idle
        );
    }

    #[test]
    fn test_first_confident_tick_transmits_current_color() {
        let mut gate = running_gate();
        let color = Rgb::new(240, 20, 10);
        let decision = gate.evaluate(&confident(1), color, 5);
        assert_eq!(
            decision,
            Decision::Transmit(HostMessage::Data { label: 1, color })
        );
    }

    #[test]
    fn test_low_confidence_not_sent() {
        let mut gate = running_gate();
        let weak = Classification {
            label: Label::new(1),
            votes: 2,
            neighbors: 3,
        };
        assert_eq!(gate.evaluate(&weak, Rgb::BLACK, 0), Decision::LowConfidence);
        // Low confidence does not stop prediction
        assert!(gate.is_predicting());
    }

    #[test]
    fn test_threshold_profile_matters() {
        let two_thirds = Classification {
            label: Label::new(1),
            votes: 2,
            neighbors: 3,
        };
        let mut gate = DecisionGate::new(60, 100);
        gate.start();
        assert!(matches!(
            gate.evaluate(&two_thirds, Rgb::BLACK, 0),
            Decision::Transmit(_)
        ));
    }

    #[test]
    fn test_throttle_window() {
        let mut gate = running_gate();
        assert!(matches!(
            gate.evaluate(&confident(1), Rgb::BLACK, 1000),
            Decision::Transmit(_)
        ));

        // Anything up to and including exactly 100ms later is suppressed
        for now in [1001, 1050, 1099, 1100] {
            assert_eq!(
                gate.evaluate(&confident(1), Rgb::BLACK, now),
                Decision::Throttled
            );
        }

        assert!(matches!(
            gate.evaluate(&confident(2), Rgb::BLACK, 1101),
            Decision::Transmit(HostMessage::Data { label: 2, .. })
        ));
    }

    #[test]
    fn test_at_most_one_frame_per_window() {
        let mut gate = running_gate();
        let mut sent = heapless::Vec::<u64, 64>::new();
        for now in (0..1000).step_by(7) {
            if let Decision::Transmit(_) = gate.evaluate(&confident(1), Rgb::BLACK, now) {
                sent.push(now).unwrap();
            }
        }
        for pair in sent.windows(2) {
            assert!(pair[1] - pair[0] > DEFAULT_MIN_INTERVAL_MS);
        }
        assert!(sent.len() >= 9);
    }

    #[test]
    fn test_restart_keeps_throttle_window() {
        let mut gate = running_gate();
        assert!(matches!(
            gate.evaluate(&confident(1), Rgb::BLACK, 1000),
            Decision::Transmit(_)
        ));

        gate.stop();
        gate.start();
        assert_eq!(
            gate.evaluate(&confident(1), Rgb::BLACK, 1050),
            Decision::Throttled
        );
        assert!(matches!(
            gate.evaluate(&confident(1), Rgb::BLACK, 1101),
            Decision::Transmit(_)
        ));
    }

    #[test]
    fn test_stop_is_unconditional() {
        let mut gate = running_gate();
        gate.evaluate(&confident(1), Rgb::BLACK, 10);

        assert_eq!(gate.stop(), HostMessage::Stop);
        assert!(!gate.is_predicting());
        // Stopping twice still yields the control message
        assert_eq!(gate.stop(), HostMessage::Stop);
    }

    #[test]
    fn test_halt_stops_silently() {
        let mut gate = running_gate();
        gate.halt();
        assert!(!gate.is_predicting());
    }
}
