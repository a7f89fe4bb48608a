//! Event Dispatch
//!
//! Typed subscription bus keyed by (intent id, phase). Delivery is
//! synchronous and in subscription order; a failing callback is reported to
//! the error hook and never blocks the remaining deliveries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;

use crate::event::{IntentEvent, IntentPhase};

/// Subscriber callback. Errors are routed to the bus error hook.
pub type SubscriberCallback = Box<dyn FnMut(&IntentEvent) -> Result<()>>;

/// Invoked with the event and the error a subscriber returned
pub type ErrorHook = Box<dyn Fn(&IntentEvent, &anyhow::Error)>;

/// Handle returned by `subscribe`; pass back to `unsubscribe` to remove
/// every registration it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    entries: Vec<(String, IntentPhase, u64)>,
}

struct Subscriber {
    id: u64,
    callback: SubscriberCallback,
}

/// Per-intent, per-phase subscription table
pub struct EventBus {
    subscribers: HashMap<(String, IntentPhase), Vec<Subscriber>>,
    next_id: u64,
    error_hook: Option<ErrorHook>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 0,
            error_hook: None,
        }
    }

    /// Register a callback for one intent and phase
    pub fn subscribe<F>(&mut self, intent_id: &str, phase: IntentPhase, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&IntentEvent) -> Result<()> + 'static,
    {
        let id = self.insert(intent_id, phase, Box::new(callback));
        SubscriptionHandle {
            entries: vec![(intent_id.to_string(), phase, id)],
        }
    }

    /// Register one callback across all three phases of an intent
    pub fn subscribe_all<F>(&mut self, intent_id: &str, callback: F) -> SubscriptionHandle
    where
        F: FnMut(&IntentEvent) -> Result<()> + 'static,
    {
        let shared = Rc::new(RefCell::new(callback));
        let mut entries = Vec::with_capacity(3);
        for phase in [IntentPhase::Start, IntentPhase::Update, IntentPhase::End] {
            let cb = Rc::clone(&shared);
            let id = self.insert(
                intent_id,
                phase,
                Box::new(move |event| (cb.borrow_mut())(event)),
            );
            entries.push((intent_id.to_string(), phase, id));
        }
        SubscriptionHandle { entries }
    }

    /// Remove every registration the handle covers
    pub fn unsubscribe(&mut self, handle: &SubscriptionHandle) {
        for (intent_id, phase, id) in &handle.entries {
            let key = (intent_id.clone(), *phase);
            if let Some(list) = self.subscribers.get_mut(&key) {
                list.retain(|s| s.id != *id);
                if list.is_empty() {
                    self.subscribers.remove(&key);
                }
            }
        }
    }

    /// Replace the error hook. The default hook logs a warning.
    pub fn set_error_hook(&mut self, hook: ErrorHook) {
        self.error_hook = Some(hook);
    }

    /// Deliver one event to its subscribers, in subscription order
    pub fn publish(&mut self, event: &IntentEvent) {
        let key = (event.intent_id.clone(), event.phase());
        let Some(list) = self.subscribers.get_mut(&key) else {
            return;
        };
        for subscriber in list.iter_mut() {
            if let Err(err) = (subscriber.callback)(event) {
                match &self.error_hook {
                    Some(hook) => hook(event, &err),
                    None => log::warn!(
                        "subscriber error on {}: {err:#}",
                        event.type_tag()
                    ),
                }
            }
        }
    }

    /// Number of registrations for one intent and phase
    pub fn subscriber_count(&self, intent_id: &str, phase: IntentPhase) -> usize {
        self.subscribers
            .get(&(intent_id.to_string(), phase))
            .map_or(0, |list| list.len())
    }

    fn insert(&mut self, intent_id: &str, phase: IntentPhase, callback: SubscriberCallback) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers
            .entry((intent_id.to_string(), phase))
            .or_default()
            .push(Subscriber { id, callback });
        id
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
