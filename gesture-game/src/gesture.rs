//! Gesture catalogue and the input classification contract.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every gesture a challenge can prompt for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureType {
    Tap,
    DoubleTap,
    LongPress,
    SwipeUp,
    SwipeDown,
    SwipeLeft,
    SwipeRight,
    Pinch,
    Rotate,
    Drag,
}

impl GestureType {
    /// All gestures in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Tap,
        Self::DoubleTap,
        Self::LongPress,
        Self::SwipeUp,
        Self::SwipeDown,
        Self::SwipeLeft,
        Self::SwipeRight,
        Self::Pinch,
        Self::Rotate,
        Self::Drag,
    ];

    /// Fixed difficulty tier (1-4) used for scoring and eligibility.
    #[must_use]
    pub const fn difficulty(self) -> u32 {
        match self {
            Self::Tap | Self::DoubleTap => 1,
            Self::LongPress | Self::SwipeUp | Self::SwipeDown | Self::SwipeLeft | Self::SwipeRight => 2,
            Self::Drag | Self::Pinch => 3,
            Self::Rotate => 4,
        }
    }

    /// Stable storage key, identical to the serialized form.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::DoubleTap => "double_tap",
            Self::LongPress => "long_press",
            Self::SwipeUp => "swipe_up",
            Self::SwipeDown => "swipe_down",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::Pinch => "pinch",
            Self::Rotate => "rotate",
            Self::Drag => "drag",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Tap => "Tap",
            Self::DoubleTap => "Double Tap",
            Self::LongPress => "Long Press",
            Self::SwipeUp => "Swipe Up",
            Self::SwipeDown => "Swipe Down",
            Self::SwipeLeft => "Swipe Left",
            Self::SwipeRight => "Swipe Right",
            Self::Pinch => "Pinch",
            Self::Rotate => "Rotate",
            Self::Drag => "Drag",
        }
    }

    /// Icon tag understood by the presentation layer.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Tap => "hand.tap",
            Self::DoubleTap => "hand.tap.fill",
            Self::LongPress => "hand.point.up",
            Self::SwipeUp => "arrow.up",
            Self::SwipeDown => "arrow.down",
            Self::SwipeLeft => "arrow.left",
            Self::SwipeRight => "arrow.right",
            Self::Pinch => "hand.pinch",
            Self::Rotate => "rotate.3d",
            Self::Drag => "hand.draw",
        }
    }

    /// Parse a storage key back into a gesture.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gesture| gesture.key() == key)
    }

    /// Gestures whose difficulty does not exceed `max_difficulty`.
    pub fn eligible(max_difficulty: u32) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |gesture| gesture.difficulty() <= max_difficulty)
    }
}

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Classify the translation of a finished drag in screen space (y grows downward).
///
/// Translations no longer than `drag_threshold` are a plain drag; longer ones
/// become a swipe bucketed into four 90 degree sectors centred on the axes.
#[must_use]
pub fn classify_drag(dx: f64, dy: f64, drag_threshold: f64) -> GestureType {
    let distance = dx.hypot(dy);
    if distance <= drag_threshold {
        return GestureType::Drag;
    }

    let degrees = dy.atan2(dx).to_degrees();
    if (-45.0..=45.0).contains(&degrees) {
        GestureType::SwipeRight
    } else if (45.0..=135.0).contains(&degrees) {
        GestureType::SwipeDown
    } else if (-135.0..=-45.0).contains(&degrees) {
        GestureType::SwipeUp
    } else {
        GestureType::SwipeLeft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_tiers_cover_one_through_four() {
        assert_eq!(GestureType::Tap.difficulty(), 1);
        assert_eq!(GestureType::DoubleTap.difficulty(), 1);
        assert_eq!(GestureType::SwipeLeft.difficulty(), 2);
        assert_eq!(GestureType::LongPress.difficulty(), 2);
        assert_eq!(GestureType::Pinch.difficulty(), 3);
        assert_eq!(GestureType::Drag.difficulty(), 3);
        assert_eq!(GestureType::Rotate.difficulty(), 4);
    }

    #[test]
    fn eligibility_grows_with_difficulty() {
        assert_eq!(GestureType::eligible(1).count(), 2);
        assert_eq!(GestureType::eligible(2).count(), 7);
        assert_eq!(GestureType::eligible(3).count(), 9);
        assert_eq!(GestureType::eligible(4).count(), 10);
    }

    #[test]
    fn keys_match_serialized_form() {
        for gesture in GestureType::ALL {
            let json = serde_json::to_string(&gesture).unwrap();
            assert_eq!(json, format!("\"{}\"", gesture.key()));
            assert_eq!(GestureType::from_key(gesture.key()), Some(gesture));
        }
        assert_eq!(GestureType::from_key("wave"), None);
    }

    #[test]
    fn short_translation_is_a_drag() {
        assert_eq!(classify_drag(30.0, 40.0, 50.0), GestureType::Drag);
        assert_eq!(classify_drag(0.0, 0.0, 50.0), GestureType::Drag);
    }

    #[test]
    fn long_translation_buckets_by_angle() {
        assert_eq!(classify_drag(120.0, 10.0, 50.0), GestureType::SwipeRight);
        assert_eq!(classify_drag(-120.0, 10.0, 50.0), GestureType::SwipeLeft);
        assert_eq!(classify_drag(5.0, 120.0, 50.0), GestureType::SwipeDown);
        assert_eq!(classify_drag(5.0, -120.0, 50.0), GestureType::SwipeUp);
        assert_eq!(classify_drag(-80.0, -90.0, 50.0), GestureType::SwipeUp);
        assert_eq!(classify_drag(-90.0, -80.0, 50.0), GestureType::SwipeLeft);
    }
}
