//! Conflict Resolver
//!
//! Across the candidate activations of one frame, enforces per-group and
//! global concurrency caps. Selection is priority-ordered with hysteresis:
//! at equal priority an already-active instance always beats a newcomer,
//! and remaining ties fall back to stable keys so resolution is
//! deterministic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::frame::Handedness;
use crate::intent::ConcurrencyScope;

/// How a group sheds candidates past its cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupStrategy {
    /// Keep the best `max` under the resolver ordering
    #[default]
    TopK,
}

/// Concurrency cap of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLimit {
    pub max: usize,
    pub strategy: GroupStrategy,
}

impl GroupLimit {
    pub fn top_k(max: usize) -> Self {
        Self {
            max,
            strategy: GroupStrategy::TopK,
        }
    }
}

/// Engine-wide conflict-resolution configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Cap across every group; `None` is unlimited
    pub max_concurrent_intents: Option<usize>,
    pub group_limits: HashMap<String, GroupLimit>,
}

impl ResolverConfig {
    pub fn with_global_cap(mut self, max: usize) -> Self {
        self.max_concurrent_intents = Some(max);
        self
    }

    pub fn with_group_limit(mut self, group: impl Into<String>, max: usize) -> Self {
        self.group_limits.insert(group.into(), GroupLimit::top_k(max));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_intents == Some(0) {
            bail!("max_concurrent_intents of 0 would reject every intent");
        }
        for (group, limit) in &self.group_limits {
            if limit.max == 0 {
                bail!("group '{}' has a zero concurrency limit", group);
            }
        }
        Ok(())
    }
}

/// One candidate activation competing for a slot this frame
#[derive(Debug, Clone)]
pub(crate) struct Contender {
    pub instance_id: String,
    pub intent_id: String,
    pub selector_key: String,
    pub group: String,
    pub scope: ConcurrencyScope,
    pub priority: i32,
    pub already_active: bool,
    pub started_at: u64,
    pub primary_hand: Handedness,
}

/// Which contenders keep their slot and which are displaced
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    pub kept: Vec<String>,
    pub superseded: Vec<String>,
}

impl Resolution {
    pub fn keeps(&self, instance_id: &str) -> bool {
        self.kept.iter().any(|id| id == instance_id)
    }
}

/// Apply group caps, then the global cap, with the shared ordering.
pub(crate) fn resolve(contenders: Vec<Contender>, config: &ResolverConfig) -> Resolution {
    let mut resolution = Resolution::default();

    // Bucket by group; per-hand scoped intents get an independent bucket
    // per primary hand so the same limit applies to each hand separately.
    let mut buckets: BTreeMap<(String, Option<Handedness>), Vec<Contender>> = BTreeMap::new();
    for contender in contenders {
        let hand_key = match contender.scope {
            ConcurrencyScope::Global => None,
            ConcurrencyScope::PerHand => Some(contender.primary_hand),
        };
        buckets
            .entry((contender.group.clone(), hand_key))
            .or_default()
            .push(contender);
    }

    let mut survivors: Vec<Contender> = Vec::new();
    for ((group, _), mut bucket) in buckets {
        if let Some(limit) = config.group_limits.get(&group) {
            if bucket.len() > limit.max {
                bucket.sort_by(compare);
                for loser in bucket.split_off(limit.max) {
                    resolution.superseded.push(loser.instance_id);
                }
            }
        }
        survivors.extend(bucket);
    }

    if let Some(cap) = config.max_concurrent_intents {
        if survivors.len() > cap {
            survivors.sort_by(compare);
            for loser in survivors.split_off(cap) {
                resolution.superseded.push(loser.instance_id);
            }
        }
    }

    resolution.kept = survivors.into_iter().map(|c| c.instance_id).collect();
    resolution.superseded.sort();
    resolution
}

// Priority desc, then already-active (hysteresis), then older instances,
// then stable keys for determinism.
fn compare(a: &Contender, b: &Contender) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.already_active.cmp(&a.already_active))
        .then_with(|| a.started_at.cmp(&b.started_at))
        .then_with(|| a.intent_id.cmp(&b.intent_id))
        .then_with(|| a.selector_key.cmp(&b.selector_key))
}
