//! # Mudra Core
//!
//! Real-time intent engine for hand/face landmark streams.
//!
//! Mudra sits between a vision front-end (which produces per-frame landmark
//! detections) and application code (which reacts to semantic gestures). It
//! turns noisy per-frame detections into stable intent lifecycle events:
//! - Declarative pattern expressions (gesture, pinch, AND/OR, two-hand)
//! - Temporal gating (minimum hold, gap tolerance)
//! - Cross-intent conflict resolution (group caps, priority, hysteresis)
//! - Typed per-intent event subscriptions
//!
//! The engine performs no landmark inference and renders nothing; it is a
//! library-style component owned by host code.

// Vector math and the spatial cell grid
pub mod spatial;

// Frame data model and the bounded frame history
pub mod frame;

// Pattern expressions and the compositional matcher
pub mod pattern;

// Intent definitions, temporal filtering, conflict resolution, lifecycles
pub mod intent;

// Lifecycle events and the subscription bus
pub mod event;

// The engine facade
pub mod engine;

pub use engine::{EngineConfig, IntentEngine};
