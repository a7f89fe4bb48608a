//! Frame Data Model
//!
//! Timestamped snapshots of hand (and optionally face) detections as
//! delivered by the upstream vision pipeline:
//! - 21 skeletal landmarks per hand (MediaPipe compatible indices)
//! - Top-1 gesture label with confidence
//! - Handedness and a frame-local hand index
//!
//! Landmark x,y are normalised to [0,1]; z is a small signed depth.

mod history;

pub use history::*;

use serde::{Deserialize, Serialize};

use crate::spatial::Vec3;

/// Landmarks per detected hand
pub const LANDMARK_COUNT: usize = 21;

/// Fixed landmark indices of the upstream hand model
pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

/// Which physical hand a detection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn name(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// Top-1 gesture label emitted by the upstream gesture model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureLabel {
    None,
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    ILoveYou,
    /// Label outside the canned set (custom-trained models)
    Custom(String),
}

impl GestureLabel {
    pub fn name(&self) -> String {
        match self {
            GestureLabel::None => "None".to_string(),
            GestureLabel::ClosedFist => "Closed_Fist".to_string(),
            GestureLabel::OpenPalm => "Open_Palm".to_string(),
            GestureLabel::PointingUp => "Pointing_Up".to_string(),
            GestureLabel::ThumbDown => "Thumb_Down".to_string(),
            GestureLabel::ThumbUp => "Thumb_Up".to_string(),
            GestureLabel::Victory => "Victory".to_string(),
            GestureLabel::ILoveYou => "ILoveYou".to_string(),
            GestureLabel::Custom(name) => name.clone(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "None" => GestureLabel::None,
            "Closed_Fist" => GestureLabel::ClosedFist,
            "Open_Palm" => GestureLabel::OpenPalm,
            "Pointing_Up" => GestureLabel::PointingUp,
            "Thumb_Down" => GestureLabel::ThumbDown,
            "Thumb_Up" => GestureLabel::ThumbUp,
            "Victory" => GestureLabel::Victory,
            "ILoveYou" => GestureLabel::ILoveYou,
            other => GestureLabel::Custom(other.to_string()),
        }
    }
}

/// One detected hand within a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    /// Stable-within-frame index assigned by the vision pipeline
    pub hand_index: usize,
    pub handedness: Handedness,
    /// Top-1 gesture label for this hand
    pub gesture: GestureLabel,
    /// Gesture confidence in [0,1]
    pub confidence: f32,
    /// 21 landmarks, indices fixed by the upstream model
    pub landmarks: [Vec3; LANDMARK_COUNT],
}

impl Hand {
    pub fn new(
        hand_index: usize,
        handedness: Handedness,
        gesture: GestureLabel,
        confidence: f32,
        landmarks: [Vec3; LANDMARK_COUNT],
    ) -> Self {
        Self {
            hand_index,
            handedness,
            gesture,
            confidence,
            landmarks,
        }
    }

    /// Center of mass of all 21 landmarks
    pub fn centroid(&self) -> Vec3 {
        let mut sum = Vec3::ZERO;
        for lm in &self.landmarks {
            sum = sum + *lm;
        }
        sum.scale(1.0 / LANDMARK_COUNT as f32)
    }

    /// Distance between the thumb tip and the given fingertip landmark
    pub fn pinch_distance(&self, finger_tip: usize) -> f32 {
        self.landmarks[THUMB_TIP].distance_to(&self.landmarks[finger_tip])
    }

    /// Midpoint of the thumb tip and the given fingertip landmark
    pub fn pinch_midpoint(&self, finger_tip: usize) -> Vec3 {
        Vec3::midpoint(&self.landmarks[THUMB_TIP], &self.landmarks[finger_tip])
    }
}

/// Lightweight reference to one hand within one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandRef {
    pub handedness: Handedness,
    pub hand_index: usize,
}

/// Canonical hand selector of an intent instance. Handedness (rather than
/// the frame-local index) is the part of hand identity that survives index
/// reshuffling across frames, so instance keys are built from it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandSelector {
    Single(Handedness),
    /// Two-hand pattern; `primary` is the hand reported to consumers
    Pair {
        secondary: Handedness,
        primary: Handedness,
    },
}

impl HandSelector {
    /// The hand whose identity and position events report
    pub fn primary(&self) -> Handedness {
        match self {
            HandSelector::Single(h) => *h,
            HandSelector::Pair { primary, .. } => *primary,
        }
    }

    /// Every handedness this selector names
    pub fn hands(&self) -> Vec<Handedness> {
        match self {
            HandSelector::Single(h) => vec![*h],
            HandSelector::Pair { secondary, primary } => vec![*secondary, *primary],
        }
    }

    /// Canonical text form, used in instance ids
    pub fn canonical(&self) -> String {
        match self {
            HandSelector::Single(h) => h.name().to_string(),
            HandSelector::Pair { secondary, primary } => {
                format!("{}+{}", secondary.name(), primary.name())
            }
        }
    }
}

/// One timestamped snapshot from the vision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Milliseconds; non-decreasing across a session
    pub timestamp: u64,
    /// Detected hands, in pipeline order
    pub hands: Vec<Hand>,
    /// Face landmarks when the face model ran on this frame
    pub face: Option<Vec<Vec3>>,
}

impl Frame {
    pub fn new(timestamp: u64, hands: Vec<Hand>) -> Self {
        Self {
            timestamp,
            hands,
            face: None,
        }
    }

    pub fn with_face(mut self, face: Vec<Vec3>) -> Self {
        self.face = Some(face);
        self
    }

    /// Hand with the given frame-local index
    pub fn hand(&self, hand_index: usize) -> Option<&Hand> {
        self.hands.iter().find(|h| h.hand_index == hand_index)
    }

    /// Whether any detected hand has the given handedness
    pub fn has_hand(&self, handedness: Handedness) -> bool {
        self.hands.iter().any(|h| h.handedness == handedness)
    }
}
