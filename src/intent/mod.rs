//! Intent Definitions
//!
//! An intent is a named pattern plus the temporal and conflict-resolution
//! policy that governs its instances:
//! - Temporal: minimum hold before starting, gap tolerance before ending
//! - Resolution: group membership, priority, concurrency scope
//!
//! Defaults match the calibrated runtime: 100 ms hold, 200 ms gap,
//! group "default", priority 0, global scope.

mod lifecycle;
mod resolver;
mod temporal;

pub use lifecycle::*;
pub use resolver::*;
pub(crate) use temporal::*;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// Default minimum continuous match before an instance starts
pub const DEFAULT_MIN_DURATION_MS: u64 = 100;

/// Default tolerated gap in matches before an instance ends
pub const DEFAULT_MAX_GAP_MS: u64 = 200;

/// Group an intent belongs to when none is set
pub const DEFAULT_GROUP: &str = "default";

/// Debounce policy of one intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalPolicy {
    pub min_duration_ms: u64,
    pub max_gap_ms: u64,
}

impl Default for TemporalPolicy {
    fn default() -> Self {
        Self {
            min_duration_ms: DEFAULT_MIN_DURATION_MS,
            max_gap_ms: DEFAULT_MAX_GAP_MS,
        }
    }
}

/// Whether a group cap counts instances across all hands or per hand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyScope {
    #[default]
    Global,
    PerHand,
}

/// Conflict-resolution policy of one intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    pub group: String,
    pub priority: i32,
    pub scope: ConcurrencyScope,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            priority: 0,
            scope: ConcurrencyScope::Global,
        }
    }
}

/// A registered intent: id, pattern, policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub id: String,
    pub pattern: Pattern,
    pub temporal: TemporalPolicy,
    pub resolution: ResolutionPolicy,
}

impl IntentDefinition {
    pub fn new(id: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            id: id.into(),
            pattern,
            temporal: TemporalPolicy::default(),
            resolution: ResolutionPolicy::default(),
        }
    }

    pub fn with_min_duration_ms(mut self, min_duration_ms: u64) -> Self {
        self.temporal.min_duration_ms = min_duration_ms;
        self
    }

    pub fn with_max_gap_ms(mut self, max_gap_ms: u64) -> Self {
        self.temporal.max_gap_ms = max_gap_ms;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.resolution.group = group.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.resolution.priority = priority;
        self
    }

    pub fn with_scope(mut self, scope: ConcurrencyScope) -> Self {
        self.resolution.scope = scope;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            bail!("intent id must not be empty");
        }
        if self.resolution.group.is_empty() {
            bail!("intent '{}' has an empty group name", self.id);
        }
        self.pattern
            .validate()
            .map_err(|err| err.context(format!("intent '{}'", self.id)))?;
        Ok(())
    }
}
