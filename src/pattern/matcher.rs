//! Pattern Matcher
//!
//! Pure evaluation of a pattern expression against one frame. Besides the
//! match/no-match decision, evaluation extracts the primary hand and its
//! position, and records which hands the match consumed so that `AllOf`
//! siblings land on distinct hands.

use crate::frame::{Frame, Hand, HandRef, HandSelector};
use crate::pattern::Pattern;
use crate::spatial::Vec3;

/// A successful pattern evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// The hand reported to consumers
    pub primary: HandRef,
    /// Landmark-derived position of the primary sub-expression
    pub position: Vec3,
    /// Frame-local indices of every hand the match consumed
    pub consumed: Vec<usize>,
}

impl PatternMatch {
    /// Canonical selector of this match: single handedness, or the
    /// (secondary, primary) pair for multi-hand matches.
    pub fn selector(&self, frame: &Frame) -> HandSelector {
        let secondary = self
            .consumed
            .iter()
            .filter(|&&idx| idx != self.primary.hand_index)
            .find_map(|&idx| frame.hand(idx))
            .map(|h| h.handedness);
        match secondary {
            Some(secondary) => HandSelector::Pair {
                secondary,
                primary: self.primary.handedness,
            },
            None => HandSelector::Single(self.primary.handedness),
        }
    }
}

/// Evaluate a pattern against a frame. Hands listed in `excluded` are
/// treated as already consumed and cannot participate in the match.
pub fn match_pattern(pattern: &Pattern, frame: &Frame, excluded: &[usize]) -> Option<PatternMatch> {
    match pattern {
        Pattern::Gesture {
            label,
            hand,
            min_confidence,
        } => frame
            .hands
            .iter()
            .filter(|h| !excluded.contains(&h.hand_index))
            .filter(|h| hand.accepts(h.handedness))
            .filter(|h| h.gesture == *label && h.confidence >= *min_confidence)
            .find_map(|h| leaf_match(h, h.centroid())),
        Pattern::Pinch {
            finger,
            hand,
            max_distance,
        } => frame
            .hands
            .iter()
            .filter(|h| !excluded.contains(&h.hand_index))
            .filter(|h| hand.accepts(h.handedness))
            .filter(|h| {
                let distance = h.pinch_distance(finger.tip_index());
                distance.is_finite() && distance < *max_distance
            })
            .find_map(|h| leaf_match(h, h.pinch_midpoint(finger.tip_index()))),
        Pattern::AnyOf(children) => children
            .iter()
            .find_map(|child| match_pattern(child, frame, excluded)),
        Pattern::AllOf(children) => {
            let mut taken = excluded.to_vec();
            let mut matches = Vec::with_capacity(children.len());
            for child in children {
                let m = match_pattern(child, frame, &taken)?;
                taken.extend(m.consumed.iter().copied());
                matches.push(m);
            }
            let primary_idx = children
                .iter()
                .position(|c| c.has_primary())
                .unwrap_or(0);
            let consumed: Vec<usize> = matches.iter().flat_map(|m| m.consumed.clone()).collect();
            let lead = &matches[primary_idx];
            Some(PatternMatch {
                primary: lead.primary,
                position: lead.position,
                consumed,
            })
        }
        Pattern::Primary(inner) => match_pattern(inner, frame, excluded),
    }
}

/// Enumerate all candidate matches a pattern produces on one frame, one per
/// distinct hand binding. A single-hand pattern with an `Any` filter yields
/// one candidate per matching hand; bindings that reduce to a selector
/// already seen are dropped.
pub fn enumerate_candidates(pattern: &Pattern, frame: &Frame) -> Vec<PatternMatch> {
    let mut out = Vec::new();
    let mut seen: Vec<HandSelector> = Vec::new();
    let mut excluded: Vec<usize> = Vec::new();
    while excluded.len() < frame.hands.len() {
        let Some(m) = match_pattern(pattern, frame, &excluded) else {
            break;
        };
        excluded.push(m.primary.hand_index);
        let selector = m.selector(frame);
        if !seen.contains(&selector) {
            seen.push(selector);
            out.push(m);
        }
    }
    out
}

// A NaN position means the detection was degenerate; treat as non-match.
fn leaf_match(hand: &Hand, position: Vec3) -> Option<PatternMatch> {
    if !position.is_finite() {
        return None;
    }
    Some(PatternMatch {
        primary: HandRef {
            handedness: hand.handedness,
            hand_index: hand.hand_index,
        },
        position,
        consumed: vec![hand.hand_index],
    })
}
