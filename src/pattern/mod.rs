//! Pattern Expressions
//!
//! Compositional predicates over frames. Leaves match a single hand
//! (a gesture label or a pinch); composites combine them:
//! - `AnyOf`: first matching alternative wins
//! - `AllOf`: every child must match, on distinct hands
//! - `bidirectional(a, b)`: a on one hand while b on the other, either way
//!
//! Each composite also selects a *primary* hand, whose identity and
//! position flow into the emitted events.

mod matcher;

pub use matcher::*;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::frame::{GestureLabel, Handedness, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP};

/// Default gesture confidence gate
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

/// Which hands a leaf may match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandFilter {
    Left,
    Right,
    #[default]
    Any,
}

impl HandFilter {
    pub fn accepts(&self, handedness: Handedness) -> bool {
        match self {
            HandFilter::Left => handedness == Handedness::Left,
            HandFilter::Right => handedness == Handedness::Right,
            HandFilter::Any => true,
        }
    }
}

/// Fingers that can pinch against the thumb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// Landmark index of this finger's tip
    pub fn tip_index(&self) -> usize {
        match self {
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Pinky => PINKY_TIP,
        }
    }

    /// Calibrated thumb-to-tip pinch threshold for this finger
    pub fn default_pinch_threshold(&self) -> f32 {
        match self {
            Finger::Index => 0.06,
            Finger::Middle => 0.055,
            Finger::Ring => 0.09,
            Finger::Pinky => 0.075,
        }
    }
}

/// A pattern expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// A hand showing the given gesture label at sufficient confidence
    Gesture {
        label: GestureLabel,
        hand: HandFilter,
        min_confidence: f32,
    },
    /// Thumb tip within `max_distance` of the given fingertip
    Pinch {
        finger: Finger,
        hand: HandFilter,
        max_distance: f32,
    },
    /// First matching alternative, in order
    AnyOf(Vec<Pattern>),
    /// Every child matches, each on a distinct hand
    AllOf(Vec<Pattern>),
    /// Marks the sub-expression whose hand the composite reports
    Primary(Box<Pattern>),
}

impl Pattern {
    /// Gesture leaf on any hand, default confidence gate
    pub fn gesture(label: GestureLabel) -> Self {
        Pattern::Gesture {
            label,
            hand: HandFilter::Any,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Pinch leaf on any hand, calibrated threshold for the finger
    pub fn pinch(finger: Finger) -> Self {
        Pattern::Pinch {
            finger,
            hand: HandFilter::Any,
            max_distance: finger.default_pinch_threshold(),
        }
    }

    pub fn any_of(children: Vec<Pattern>) -> Self {
        Pattern::AnyOf(children)
    }

    pub fn all_of(children: Vec<Pattern>) -> Self {
        Pattern::AllOf(children)
    }

    /// `a` on one hand while `b` on the other, in either assignment. The
    /// `b` side is primary: the reported hand is always the one matching `b`.
    pub fn bidirectional(a: Pattern, b: Pattern) -> Self {
        Pattern::AnyOf(vec![
            Pattern::AllOf(vec![
                a.clone().on_hand(HandFilter::Left),
                b.clone().on_hand(HandFilter::Right).primary(),
            ]),
            Pattern::AllOf(vec![
                a.on_hand(HandFilter::Right),
                b.on_hand(HandFilter::Left).primary(),
            ]),
        ])
    }

    /// Flag this sub-expression as the composite's primary
    pub fn primary(self) -> Self {
        Pattern::Primary(Box::new(self))
    }

    /// Rewrite the hand filter of every leaf in this subtree
    pub fn on_hand(self, filter: HandFilter) -> Self {
        match self {
            Pattern::Gesture {
                label,
                min_confidence,
                ..
            } => Pattern::Gesture {
                label,
                hand: filter,
                min_confidence,
            },
            Pattern::Pinch {
                finger,
                max_distance,
                ..
            } => Pattern::Pinch {
                finger,
                hand: filter,
                max_distance,
            },
            Pattern::AnyOf(children) => {
                Pattern::AnyOf(children.into_iter().map(|c| c.on_hand(filter)).collect())
            }
            Pattern::AllOf(children) => {
                Pattern::AllOf(children.into_iter().map(|c| c.on_hand(filter)).collect())
            }
            Pattern::Primary(inner) => Pattern::Primary(Box::new(inner.on_hand(filter))),
        }
    }

    /// Adjust the confidence gate of every gesture leaf in this subtree
    pub fn with_min_confidence(self, min_confidence: f32) -> Self {
        match self {
            Pattern::Gesture { label, hand, .. } => Pattern::Gesture {
                label,
                hand,
                min_confidence,
            },
            Pattern::Pinch { .. } => self,
            Pattern::AnyOf(children) => Pattern::AnyOf(
                children
                    .into_iter()
                    .map(|c| c.with_min_confidence(min_confidence))
                    .collect(),
            ),
            Pattern::AllOf(children) => Pattern::AllOf(
                children
                    .into_iter()
                    .map(|c| c.with_min_confidence(min_confidence))
                    .collect(),
            ),
            Pattern::Primary(inner) => {
                Pattern::Primary(Box::new(inner.with_min_confidence(min_confidence)))
            }
        }
    }

    /// Adjust the distance threshold of every pinch leaf in this subtree
    pub fn with_max_distance(self, max_distance: f32) -> Self {
        match self {
            Pattern::Pinch { finger, hand, .. } => Pattern::Pinch {
                finger,
                hand,
                max_distance,
            },
            Pattern::Gesture { .. } => self,
            Pattern::AnyOf(children) => Pattern::AnyOf(
                children
                    .into_iter()
                    .map(|c| c.with_max_distance(max_distance))
                    .collect(),
            ),
            Pattern::AllOf(children) => Pattern::AllOf(
                children
                    .into_iter()
                    .map(|c| c.with_max_distance(max_distance))
                    .collect(),
            ),
            Pattern::Primary(inner) => {
                Pattern::Primary(Box::new(inner.with_max_distance(max_distance)))
            }
        }
    }

    /// Whether this subtree carries a `Primary` flag
    pub(crate) fn has_primary(&self) -> bool {
        match self {
            Pattern::Primary(_) => true,
            Pattern::AnyOf(children) | Pattern::AllOf(children) => {
                children.iter().any(|c| c.has_primary())
            }
            _ => false,
        }
    }

    /// Structural validation, run at configure time
    pub fn validate(&self) -> Result<()> {
        match self {
            Pattern::Gesture { min_confidence, .. } => {
                if !min_confidence.is_finite() || !(0.0..=1.0).contains(min_confidence) {
                    bail!("gesture min_confidence {} outside [0,1]", min_confidence);
                }
            }
            Pattern::Pinch { max_distance, .. } => {
                if !max_distance.is_finite() || *max_distance <= 0.0 {
                    bail!("pinch max_distance {} must be positive", max_distance);
                }
            }
            Pattern::AnyOf(children) => {
                if children.is_empty() {
                    bail!("AnyOf requires at least one alternative");
                }
                for child in children {
                    child.validate()?;
                }
            }
            Pattern::AllOf(children) => {
                if children.is_empty() {
                    bail!("AllOf requires at least one child");
                }
                let primaries = children.iter().filter(|c| c.has_primary()).count();
                if primaries > 1 {
                    bail!("AllOf has {} primary children, at most one allowed", primaries);
                }
                for child in children {
                    child.validate()?;
                }
            }
            Pattern::Primary(inner) => inner.validate()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finger_thresholds() {
        assert!((Finger::Index.default_pinch_threshold() - 0.06).abs() < 1e-9);
        assert!((Finger::Middle.default_pinch_threshold() - 0.055).abs() < 1e-9);
        assert!((Finger::Ring.default_pinch_threshold() - 0.09).abs() < 1e-9);
        assert!((Finger::Pinky.default_pinch_threshold() - 0.075).abs() < 1e-9);
    }

    #[test]
    fn test_hand_filter_accepts() {
        assert!(HandFilter::Any.accepts(Handedness::Left));
        assert!(HandFilter::Left.accepts(Handedness::Left));
        assert!(!HandFilter::Left.accepts(Handedness::Right));
    }

    #[test]
    fn test_bidirectional_desugaring() {
        let pattern = Pattern::bidirectional(
            Pattern::pinch(Finger::Index),
            Pattern::gesture(GestureLabel::Victory),
        );
        let Pattern::AnyOf(branches) = &pattern else {
            panic!("expected AnyOf");
        };
        assert_eq!(branches.len(), 2);
        let Pattern::AllOf(children) = &branches[0] else {
            panic!("expected AllOf");
        };
        assert!(matches!(
            children[0],
            Pattern::Pinch { hand: HandFilter::Left, .. }
        ));
        // b-side is flagged primary and pinned to the opposite hand
        let Pattern::Primary(inner) = &children[1] else {
            panic!("expected Primary");
        };
        assert!(matches!(
            **inner,
            Pattern::Gesture { hand: HandFilter::Right, .. }
        ));
    }

    #[test]
    fn test_on_hand_rewrites_nested_leaves() {
        let pattern = Pattern::any_of(vec![
            Pattern::gesture(GestureLabel::OpenPalm),
            Pattern::pinch(Finger::Middle),
        ])
        .on_hand(HandFilter::Right);
        let Pattern::AnyOf(children) = pattern else {
            panic!("expected AnyOf");
        };
        assert!(matches!(
            children[0],
            Pattern::Gesture { hand: HandFilter::Right, .. }
        ));
        assert!(matches!(
            children[1],
            Pattern::Pinch { hand: HandFilter::Right, .. }
        ));
    }

    #[test]
    fn test_validation_rejects_empty_composites() {
        assert!(Pattern::any_of(Vec::new()).validate().is_err());
        assert!(Pattern::all_of(Vec::new()).validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_thresholds() {
        let pattern = Pattern::gesture(GestureLabel::Victory).with_min_confidence(1.5);
        assert!(pattern.validate().is_err());

        let pattern = Pattern::pinch(Finger::Index).with_max_distance(0.0);
        assert!(pattern.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_two_primaries() {
        let pattern = Pattern::all_of(vec![
            Pattern::gesture(GestureLabel::Victory).primary(),
            Pattern::pinch(Finger::Index).primary(),
        ]);
        assert!(pattern.validate().is_err());
    }

    #[test]
    fn test_bidirectional_validates() {
        let pattern = Pattern::bidirectional(
            Pattern::pinch(Finger::Index),
            Pattern::gesture(GestureLabel::Victory),
        );
        assert!(pattern.validate().is_ok());
    }
}
