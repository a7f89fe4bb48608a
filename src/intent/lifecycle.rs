//! Instance Lifecycle
//!
//! The engine's record of currently firing intents and the construction of
//! their start/update/end events. Events copy everything they need; no
//! instance or frame reference escapes through them.

use serde::{Deserialize, Serialize};

use crate::event::{EndReason, EventKind, IntentEvent};
use crate::frame::{HandRef, HandSelector, Handedness};
use crate::spatial::{GridCell, GridSpec, Vec3};

/// A currently firing intent instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveInstance {
    pub intent_id: String,
    /// `"<intent_id>@<selector>"`, stable for the instance's lifetime
    pub instance_id: String,
    pub selector: HandSelector,
    /// Primary hand at the most recent match (index refreshed every match)
    pub primary: HandRef,
    pub secondary: Option<HandRef>,
    pub started_at: u64,
    pub last_match_at: u64,
    pub last_position: Vec3,
    /// Position and timestamp of the previous emitted event, for velocity
    pub(crate) prev_position: Vec3,
    pub(crate) prev_timestamp: u64,
}

impl ActiveInstance {
    pub fn instance_id_for(intent_id: &str, selector: &HandSelector) -> String {
        format!("{}@{}", intent_id, selector.canonical())
    }

    pub(crate) fn start(
        intent_id: &str,
        selector: HandSelector,
        primary: HandRef,
        secondary: Option<HandRef>,
        position: Vec3,
        now: u64,
    ) -> Self {
        Self {
            intent_id: intent_id.to_string(),
            instance_id: Self::instance_id_for(intent_id, &selector),
            selector,
            primary,
            secondary,
            started_at: now,
            last_match_at: now,
            last_position: position,
            prev_position: position,
            prev_timestamp: now,
        }
    }

    /// Record a fresh match on this instance
    pub(crate) fn refresh(
        &mut self,
        primary: HandRef,
        secondary: Option<HandRef>,
        position: Vec3,
        now: u64,
    ) {
        self.primary = primary;
        self.secondary = secondary;
        self.last_position = position;
        self.last_match_at = now;
    }

    fn hand_pair(&self) -> Option<(Handedness, Handedness)> {
        match &self.selector {
            HandSelector::Single(_) => None,
            HandSelector::Pair { secondary, primary } => Some((*secondary, *primary)),
        }
    }
}

/// Read-only snapshot of one active instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAction {
    pub intent_id: String,
    pub instance_id: String,
    pub hand: Handedness,
    pub hand_index: usize,
    pub position: Vec3,
    pub started_at: u64,
    pub last_match_at: u64,
}

impl From<&ActiveInstance> for ActiveAction {
    fn from(instance: &ActiveInstance) -> Self {
        Self {
            intent_id: instance.intent_id.clone(),
            instance_id: instance.instance_id.clone(),
            hand: instance.primary.handedness,
            hand_index: instance.primary.hand_index,
            position: instance.last_position,
            started_at: instance.started_at,
            last_match_at: instance.last_match_at,
        }
    }
}

pub(crate) fn build_start(instance: &ActiveInstance, now: u64, grids: &[GridSpec]) -> IntentEvent {
    event_base(instance, now, grids, EventKind::Start)
}

/// Build an update event, computing velocity from the previous emitted
/// position and rolling the instance's velocity anchor forward.
pub(crate) fn build_update(
    instance: &mut ActiveInstance,
    now: u64,
    grids: &[GridSpec],
) -> IntentEvent {
    let position = instance.last_position;
    let dt_ms = now.saturating_sub(instance.prev_timestamp);
    let velocity = if dt_ms == 0 {
        Vec3::ZERO
    } else {
        (position - instance.prev_position)
            .scale(1000.0 / dt_ms as f32)
            .clamped_finite()
    };
    instance.prev_position = position;
    instance.prev_timestamp = now;
    let duration_ms = now.saturating_sub(instance.started_at);
    event_base(instance, now, grids, EventKind::Update { velocity, duration_ms })
}

pub(crate) fn build_end(
    instance: &ActiveInstance,
    now: u64,
    reason: EndReason,
    grids: &[GridSpec],
) -> IntentEvent {
    let duration_ms = now.saturating_sub(instance.started_at);
    event_base(instance, now, grids, EventKind::End { reason, duration_ms })
}

fn event_base(
    instance: &ActiveInstance,
    now: u64,
    grids: &[GridSpec],
    kind: EventKind,
) -> IntentEvent {
    IntentEvent {
        intent_id: instance.intent_id.clone(),
        instance_id: instance.instance_id.clone(),
        timestamp: now,
        hand: instance.primary.handedness,
        hand_index: instance.primary.hand_index,
        hand_pair: instance.hand_pair(),
        position: instance.last_position,
        cells: cells_for(&instance.last_position, grids),
        kind,
    }
}

fn cells_for(position: &Vec3, grids: &[GridSpec]) -> Vec<GridCell> {
    grids.iter().map(|g| g.cell_of(position)).collect()
}
