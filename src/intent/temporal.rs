//! Temporal Filter
//!
//! Translates raw per-frame matches into instance state transitions:
//! - A new hand binding must hold its pattern for `min_duration_ms`
//!   of history before it may start.
//! - An active instance missing a match is kept while the gap stays within
//!   `max_gap_ms`, then marked for ending.
//!
//! The filter holds no state of its own; it reads the frame history and the
//! engine's active-instance map.

use std::collections::BTreeMap;

use crate::event::EndReason;
use crate::frame::{Frame, FrameHistory, HandRef, HandSelector};
use crate::intent::{ActiveInstance, IntentDefinition};
use crate::pattern::{PatternMatch, enumerate_candidates};
use crate::spatial::Vec3;

/// One qualifying match of one intent on the current frame
#[derive(Debug, Clone)]
pub(crate) struct FrameCandidate {
    pub intent_id: String,
    pub instance_id: String,
    pub selector: HandSelector,
    pub primary: HandRef,
    pub secondary: Option<HandRef>,
    pub position: Vec3,
}

/// State transitions the current frame calls for
#[derive(Debug, Default)]
pub(crate) struct TemporalOutcome {
    /// Candidates that passed the hold gate and may start
    pub to_start: Vec<FrameCandidate>,
    /// Matches refreshing an already-active instance
    pub to_refresh: Vec<FrameCandidate>,
    /// Active instances whose gap budget ran out, with the end reason
    pub to_end: Vec<(String, EndReason)>,
}

pub(crate) fn filter_frame(
    definitions: &[IntentDefinition],
    history: &FrameHistory,
    actives: &BTreeMap<String, ActiveInstance>,
) -> TemporalOutcome {
    let mut outcome = TemporalOutcome::default();
    let Some(latest) = history.latest() else {
        return outcome;
    };
    let now = latest.timestamp;

    for definition in definitions {
        for m in enumerate_candidates(&definition.pattern, latest) {
            let candidate = candidate_from_match(&definition.id, &m, latest);
            if actives.contains_key(&candidate.instance_id) {
                outcome.to_refresh.push(candidate);
            } else if meets_hold_gate(definition, &candidate.selector, history) {
                outcome.to_start.push(candidate);
            }
        }
    }

    let refreshed: Vec<&str> = outcome
        .to_refresh
        .iter()
        .map(|c| c.instance_id.as_str())
        .collect();
    for (instance_id, instance) in actives {
        if refreshed.contains(&instance_id.as_str()) {
            continue;
        }
        let Some(definition) = definitions.iter().find(|d| d.id == instance.intent_id) else {
            continue;
        };
        let gap = now.saturating_sub(instance.last_match_at);
        if gap > definition.temporal.max_gap_ms {
            outcome
                .to_end
                .push((instance_id.clone(), end_reason_for(instance, latest)));
        }
    }

    outcome
}

/// Whether this selector's binding has matched the pattern continuously for
/// the intent's minimum hold duration. Continuity matters: a match landing
/// right after a long silence must not start instantly just because the
/// silent frames fell outside the hold window.
fn meets_hold_gate(
    definition: &IntentDefinition,
    selector: &HandSelector,
    history: &FrameHistory,
) -> bool {
    history.continuous_duration(|frame| {
        enumerate_candidates(&definition.pattern, frame)
            .iter()
            .any(|m| m.selector(frame) == *selector)
    }) >= definition.temporal.min_duration_ms
}

/// Classify why a gap-expired instance ends. When every hand the instance
/// is bound to is still visible, the pattern affirmatively stopped matching
/// (`PatternLost`); when detection itself disappeared, the gap ran out
/// (`GapExceeded`).
fn end_reason_for(instance: &ActiveInstance, latest: &Frame) -> EndReason {
    let all_present = instance
        .selector
        .hands()
        .iter()
        .all(|&handedness| latest.has_hand(handedness));
    if all_present {
        EndReason::PatternLost
    } else {
        EndReason::GapExceeded
    }
}

fn candidate_from_match(intent_id: &str, m: &PatternMatch, frame: &Frame) -> FrameCandidate {
    let selector = m.selector(frame);
    let secondary = m
        .consumed
        .iter()
        .filter(|&&idx| idx != m.primary.hand_index)
        .find_map(|&idx| frame.hand(idx))
        .map(|h| HandRef {
            handedness: h.handedness,
            hand_index: h.hand_index,
        });
    FrameCandidate {
        intent_id: intent_id.to_string(),
        instance_id: ActiveInstance::instance_id_for(intent_id, &selector),
        selector,
        primary: m.primary,
        secondary,
        position: m.position,
    }
}
