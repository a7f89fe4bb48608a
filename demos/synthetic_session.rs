//! Synthetic Session Demo
//!
//! Feeds a scripted-but-jittered stream of hand frames through the intent
//! engine and prints every emitted event as JSON.
//! Run with: cargo run --example synthetic_session

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mudra_core::IntentEngine;
use mudra_core::frame::{
    Frame, GestureLabel, Hand, Handedness, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP,
};
use mudra_core::intent::{IntentDefinition, ResolverConfig};
use mudra_core::pattern::{Finger, Pattern};
use mudra_core::spatial::Vec3;

const FRAME_INTERVAL_MS: u64 = 33;

fn jittered_landmarks(center: Vec3, rng: &mut StdRng) -> [Vec3; LANDMARK_COUNT] {
    let mut landmarks = [Vec3::ZERO; LANDMARK_COUNT];
    for lm in landmarks.iter_mut() {
        *lm = Vec3::new(
            center.x + rng.gen_range(-0.02..0.02),
            center.y + rng.gen_range(-0.02..0.02),
            center.z + rng.gen_range(-0.005..0.005),
        );
    }
    // Keep thumb and index tips apart so nothing reads as a pinch
    landmarks[THUMB_TIP] = Vec3::new(center.x, center.y - 0.1, center.z);
    landmarks[INDEX_TIP] = Vec3::new(center.x, center.y + 0.1, center.z);
    landmarks
}

fn pinching_landmarks(center: Vec3, rng: &mut StdRng) -> [Vec3; LANDMARK_COUNT] {
    let mut landmarks = jittered_landmarks(center, rng);
    landmarks[THUMB_TIP] = Vec3::new(center.x - 0.01, center.y, center.z);
    landmarks[INDEX_TIP] = Vec3::new(center.x + 0.01, center.y, center.z);
    landmarks
}

fn main() {
    env_logger::init();

    println!();
    println!("  mudra-core synthetic session");
    println!("  ────────────────────────────");
    println!();

    let mut engine = IntentEngine::default();
    engine
        .configure(
            vec![
                IntentDefinition::new("wave", Pattern::gesture(GestureLabel::OpenPalm))
                    .with_group("spawn"),
                IntentDefinition::new("grab", Pattern::pinch(Finger::Index))
                    .with_group("spawn")
                    .with_priority(5),
                IntentDefinition::new(
                    "conduct",
                    Pattern::bidirectional(
                        Pattern::pinch(Finger::Index),
                        Pattern::gesture(GestureLabel::Victory),
                    ),
                ),
            ],
            Some(ResolverConfig::default().with_group_limit("spawn", 1)),
        )
        .expect("intent set is valid");

    for intent_id in ["wave", "grab", "conduct"] {
        engine.subscribe_all(intent_id, |event| {
            println!("  {}", serde_json::to_string(event)?);
            Ok(())
        });
    }

    let mut rng = StdRng::seed_from_u64(7);
    let mut drift = Vec3::new(0.5, 0.5, 0.0);

    for i in 0..240u64 {
        let ts = i * FRAME_INTERVAL_MS;
        drift.x = (drift.x + rng.gen_range(-0.01..0.012)).clamp(0.1, 0.9);
        drift.y = (drift.y + rng.gen_range(-0.01..0.01)).clamp(0.1, 0.9);

        // Scripted phases: open palm, then a pinch takeover, then the
        // two-hand pattern, with short dropouts in between.
        let hands = match i {
            0..=60 => vec![Hand::new(
                0,
                Handedness::Right,
                GestureLabel::OpenPalm,
                0.93,
                jittered_landmarks(drift, &mut rng),
            )],
            61..=70 => Vec::new(),
            71..=140 => vec![
                Hand::new(
                    0,
                    Handedness::Right,
                    GestureLabel::OpenPalm,
                    0.91,
                    jittered_landmarks(drift, &mut rng),
                ),
                Hand::new(
                    1,
                    Handedness::Left,
                    GestureLabel::None,
                    0.2,
                    pinching_landmarks(Vec3::new(0.3, 0.6, 0.0), &mut rng),
                ),
            ],
            _ => vec![
                Hand::new(
                    0,
                    Handedness::Right,
                    GestureLabel::Victory,
                    0.95,
                    jittered_landmarks(drift, &mut rng),
                ),
                Hand::new(
                    1,
                    Handedness::Left,
                    GestureLabel::None,
                    0.2,
                    pinching_landmarks(Vec3::new(0.3, 0.6, 0.0), &mut rng),
                ),
            ],
        };
        engine.on_frame(Frame::new(ts, hands));
    }

    println!();
    println!("  frames ingested : {}", engine.history_len());
    println!("  still active    : {}", engine.active_actions().len());
    for action in engine.active_actions() {
        println!(
            "    {} on {} since {} ms",
            action.instance_id,
            action.hand.name(),
            action.started_at
        );
    }
    println!();
}
