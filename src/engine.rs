//! Intent Engine
//!
//! The facade owning all engine state. Frames enter through `on_frame`,
//! which runs the full per-frame pipeline synchronously:
//! match → temporal filter → conflict resolution → lifecycle diff → dispatch.
//!
//! Between frames the engine keeps only the frame history, the active
//! instance map, the last processed timestamp and the subscriber lists;
//! everything else is recomputed per frame.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use log::{debug, warn};

use crate::event::{
    EndReason, ErrorHook, EventBus, IntentEvent, IntentPhase, SubscriptionHandle,
};
use crate::frame::{DEFAULT_HISTORY_CAPACITY, Frame, FrameHistory};
use crate::intent::{
    ActiveAction, ActiveInstance, Contender, FrameCandidate, IntentDefinition, Resolution,
    ResolverConfig, build_end, build_start, build_update, filter_frame, resolve,
};
use crate::spatial::{GridSpec, default_grids};

/// Engine-level tunables
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Frame history ring capacity
    pub history_capacity: usize,
    /// Grid resolutions stamped onto every event
    pub grids: Vec<GridSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            grids: default_grids(),
        }
    }
}

/// The intent engine. Single-threaded: one frame is fully processed, and
/// its events dispatched, before the next is accepted.
pub struct IntentEngine {
    config: EngineConfig,
    definitions: Vec<IntentDefinition>,
    resolver_config: ResolverConfig,
    history: FrameHistory,
    actives: BTreeMap<String, ActiveInstance>,
    last_timestamp: Option<u64>,
    bus: EventBus,
}

impl IntentEngine {
    pub fn new(config: EngineConfig) -> Self {
        let history = FrameHistory::new(config.history_capacity);
        Self {
            config,
            definitions: Vec::new(),
            resolver_config: ResolverConfig::default(),
            history,
            actives: BTreeMap::new(),
            last_timestamp: None,
            bus: EventBus::new(),
        }
    }

    /// Atomically replace the intent set. Validation failures leave the
    /// engine untouched. Active instances whose definition disappeared or
    /// changed structurally end with reason `cleared`; unchanged
    /// definitions keep their instances. A `None` resolver config keeps
    /// the current one.
    pub fn configure(
        &mut self,
        definitions: Vec<IntentDefinition>,
        resolver: Option<ResolverConfig>,
    ) -> Result<()> {
        for definition in &definitions {
            definition.validate()?;
            let same_id = definitions.iter().filter(|d| d.id == definition.id).count();
            if same_id > 1 {
                bail!("duplicate intent id '{}'", definition.id);
            }
        }
        if let Some(config) = &resolver {
            config.validate()?;
        }

        let now = self.last_timestamp.unwrap_or(0);
        let previous = std::mem::take(&mut self.definitions);
        let mut cleared: Vec<ActiveInstance> = Vec::new();
        self.actives.retain(|_, instance| {
            let old = previous.iter().find(|d| d.id == instance.intent_id);
            let new = definitions.iter().find(|d| d.id == instance.intent_id);
            let unchanged = matches!((old, new), (Some(o), Some(n)) if o == n);
            if !unchanged {
                cleared.push(instance.clone());
            }
            unchanged
        });

        self.definitions = definitions;
        if let Some(config) = resolver {
            self.resolver_config = config;
        }
        debug!(
            "configured {} intents, cleared {} instances",
            self.definitions.len(),
            cleared.len()
        );

        let events: Vec<IntentEvent> = cleared
            .iter()
            .map(|instance| build_end(instance, now, EndReason::Cleared, &self.config.grids))
            .collect();
        for event in &events {
            self.bus.publish(event);
        }
        Ok(())
    }

    /// Ingest one frame and dispatch the resulting events before returning.
    /// Duplicate timestamps are idempotent no-ops; strictly earlier
    /// timestamps are dropped.
    pub fn on_frame(&mut self, frame: Frame) {
        let now = frame.timestamp;
        if let Some(last) = self.last_timestamp {
            if now < last {
                warn!("dropping out-of-order frame {} (newest {})", now, last);
                return;
            }
            if now == last {
                return;
            }
        }
        if !self.history.append(frame) {
            return;
        }
        self.last_timestamp = Some(now);

        let outcome = filter_frame(&self.definitions, &self.history, &self.actives);

        let mut ended: Vec<(ActiveInstance, EndReason)> = Vec::new();
        for (instance_id, reason) in &outcome.to_end {
            if let Some(instance) = self.actives.remove(instance_id) {
                ended.push((instance, *reason));
            }
        }
        for candidate in &outcome.to_refresh {
            if let Some(instance) = self.actives.get_mut(&candidate.instance_id) {
                instance.refresh(
                    candidate.primary,
                    candidate.secondary,
                    candidate.position,
                    now,
                );
            }
        }

        let resolution = self.resolve_frame(&outcome.to_start, now);
        for instance_id in &resolution.superseded {
            if let Some(instance) = self.actives.remove(instance_id) {
                ended.push((instance, EndReason::Superseded));
            }
        }

        // Ends, then starts, then updates, all stamped with this frame
        let mut events: Vec<IntentEvent> = Vec::new();
        ended.sort_by(|a, b| a.0.instance_id.cmp(&b.0.instance_id));
        for (instance, reason) in &ended {
            debug!("{} ended: {}", instance.instance_id, reason.name());
            events.push(build_end(instance, now, *reason, &self.config.grids));
        }

        let mut starting: Vec<&FrameCandidate> = outcome
            .to_start
            .iter()
            .filter(|c| resolution.keeps(&c.instance_id))
            .collect();
        starting.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        for candidate in starting {
            let instance = ActiveInstance::start(
                &candidate.intent_id,
                candidate.selector.clone(),
                candidate.primary,
                candidate.secondary,
                candidate.position,
                now,
            );
            debug!("{} started", instance.instance_id);
            events.push(build_start(&instance, now, &self.config.grids));
            self.actives.insert(instance.instance_id.clone(), instance);
        }

        for instance in self.actives.values_mut() {
            if instance.started_at < now {
                events.push(build_update(instance, now, &self.config.grids));
            }
        }

        for event in &events {
            self.bus.publish(event);
        }
    }

    /// Drop all history and end every active instance with `cleared`.
    /// Subscriptions and configuration survive.
    pub fn reset(&mut self) {
        let now = self.last_timestamp.unwrap_or(0);
        let cleared: Vec<ActiveInstance> = self.actives.values().cloned().collect();
        self.actives.clear();
        self.history.clear();
        self.last_timestamp = None;

        let events: Vec<IntentEvent> = cleared
            .iter()
            .map(|instance| build_end(instance, now, EndReason::Cleared, &self.config.grids))
            .collect();
        for event in &events {
            self.bus.publish(event);
        }
    }

    pub fn subscribe<F>(
        &mut self,
        intent_id: &str,
        phase: IntentPhase,
        callback: F,
    ) -> SubscriptionHandle
    where
        F: FnMut(&IntentEvent) -> Result<()> + 'static,
    {
        self.bus.subscribe(intent_id, phase, callback)
    }

    /// One callback across start, update and end of an intent
    pub fn subscribe_all<F>(&mut self, intent_id: &str, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&IntentEvent) -> Result<()> + 'static,
    {
        self.bus.subscribe_all(intent_id, callback)
    }

    pub fn unsubscribe(&mut self, handle: &SubscriptionHandle) {
        self.bus.unsubscribe(handle);
    }

    pub fn set_error_hook(&mut self, hook: ErrorHook) {
        self.bus.set_error_hook(hook);
    }

    /// Snapshot of the currently active instances
    pub fn active_actions(&self) -> Vec<ActiveAction> {
        self.actives.values().map(ActiveAction::from).collect()
    }

    /// Snapshot of the conflict-resolution configuration
    pub fn current_config(&self) -> ResolverConfig {
        self.resolver_config.clone()
    }

    pub fn definitions(&self) -> &[IntentDefinition] {
        &self.definitions
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.last_timestamp
    }

    fn resolve_frame(&self, to_start: &[FrameCandidate], now: u64) -> Resolution {
        let mut contenders: Vec<Contender> = Vec::new();
        for instance in self.actives.values() {
            if let Some(definition) = self.definition(&instance.intent_id) {
                contenders.push(Contender {
                    instance_id: instance.instance_id.clone(),
                    intent_id: instance.intent_id.clone(),
                    selector_key: instance.selector.canonical(),
                    group: definition.resolution.group.clone(),
                    scope: definition.resolution.scope,
                    priority: definition.resolution.priority,
                    already_active: true,
                    started_at: instance.started_at,
                    primary_hand: instance.primary.handedness,
                });
            }
        }
        for candidate in to_start {
            if let Some(definition) = self.definition(&candidate.intent_id) {
                contenders.push(Contender {
                    instance_id: candidate.instance_id.clone(),
                    intent_id: candidate.intent_id.clone(),
                    selector_key: candidate.selector.canonical(),
                    group: definition.resolution.group.clone(),
                    scope: definition.resolution.scope,
                    priority: definition.resolution.priority,
                    already_active: false,
                    started_at: now,
                    primary_hand: candidate.primary.handedness,
                });
            }
        }
        resolve(contenders, &self.resolver_config)
    }

    fn definition(&self, intent_id: &str) -> Option<&IntentDefinition> {
        self.definitions.iter().find(|d| d.id == intent_id)
    }
}

impl Default for IntentEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
