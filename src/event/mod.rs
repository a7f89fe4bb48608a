//! Intent Lifecycle Events
//!
//! Self-contained event values delivered to subscribers. Events copy the
//! small data they need (position, timestamp, hand identity) instead of
//! referencing frames or instances, so consumers can hold them freely.

mod dispatch;

pub use dispatch::*;

use serde::{Deserialize, Serialize};

use crate::frame::Handedness;
use crate::spatial::{GridCell, Vec3};

/// Lifecycle phase of an intent instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentPhase {
    Start,
    Update,
    End,
}

impl IntentPhase {
    pub fn name(&self) -> &'static str {
        match self {
            IntentPhase::Start => "start",
            IntentPhase::Update => "update",
            IntentPhase::End => "end",
        }
    }
}

/// Why an instance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The pattern stopped matching while the hand stayed visible
    PatternLost,
    /// No match and the hand detection itself disappeared past the gap budget
    GapExceeded,
    /// Displaced by a conflict-resolution winner
    Superseded,
    /// Engine reset or reconfiguration
    Cleared,
}

impl EndReason {
    pub fn name(&self) -> &'static str {
        match self {
            EndReason::PatternLost => "pattern_lost",
            EndReason::GapExceeded => "gap_exceeded",
            EndReason::Superseded => "superseded",
            EndReason::Cleared => "cleared",
        }
    }
}

/// Phase-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Update {
        /// Normalised units per second, from the previous emitted position
        velocity: Vec3,
        duration_ms: u64,
    },
    End {
        reason: EndReason,
        duration_ms: u64,
    },
}

/// One lifecycle event of one intent instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentEvent {
    pub intent_id: String,
    /// Stable for the instance's lifetime
    pub instance_id: String,
    /// The originating frame's timestamp, milliseconds
    pub timestamp: u64,
    /// Primary hand at the most recent match
    pub hand: Handedness,
    /// Frame-local index of the primary hand at the most recent match
    pub hand_index: usize,
    /// (secondary, primary) handedness for two-hand patterns
    pub hand_pair: Option<(Handedness, Handedness)>,
    /// Primary position in normalised coordinates
    pub position: Vec3,
    /// The position's cell under every registered grid resolution
    pub cells: Vec<GridCell>,
    pub kind: EventKind,
}

impl IntentEvent {
    pub fn phase(&self) -> IntentPhase {
        match self.kind {
            EventKind::Start => IntentPhase::Start,
            EventKind::Update { .. } => IntentPhase::Update,
            EventKind::End { .. } => IntentPhase::End,
        }
    }

    /// Wire-level type tag, `"<intent_id>:<phase>"`
    pub fn type_tag(&self) -> String {
        format!("{}:{}", self.intent_id, self.phase().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag() {
        let event = IntentEvent {
            intent_id: "spawn".to_string(),
            instance_id: "spawn@right".to_string(),
            timestamp: 42,
            hand: Handedness::Right,
            hand_index: 0,
            hand_pair: None,
            position: Vec3::ZERO,
            cells: Vec::new(),
            kind: EventKind::Start,
        };
        assert_eq!(event.type_tag(), "spawn:start");
        assert_eq!(event.phase(), IntentPhase::Start);
    }

    #[test]
    fn test_end_reason_names() {
        assert_eq!(EndReason::PatternLost.name(), "pattern_lost");
        assert_eq!(EndReason::GapExceeded.name(), "gap_exceeded");
        assert_eq!(EndReason::Superseded.name(), "superseded");
        assert_eq!(EndReason::Cleared.name(), "cleared");
    }

    #[test]
    fn test_event_serialises() {
        let event = IntentEvent {
            intent_id: "g".to_string(),
            instance_id: "g@left".to_string(),
            timestamp: 100,
            hand: Handedness::Left,
            hand_index: 1,
            hand_pair: None,
            position: Vec3::new(0.5, 0.5, 0.0),
            cells: Vec::new(),
            kind: EventKind::Update {
                velocity: Vec3::ZERO,
                duration_ms: 50,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"hand\":\"left\""));
        assert!(json.contains("duration_ms"));
    }
}
