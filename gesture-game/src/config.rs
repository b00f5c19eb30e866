//! Tunable game configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::gesture::{self, GestureType};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("challenge count window invalid (base {base} > max {max})")]
    ChallengeCountBounds { base: u32, max: u32 },
    #[error("time limit floor {floor:.2} exceeds base limit {base:.2}")]
    TimeLimitBounds { floor: f64, base: f64 },
    #[error("promotion thresholds out of order (one level {one:.2} > two levels {two:.2})")]
    PromotionOrder { one: f64, two: f64 },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Difficulty curve, history and pacing parameters shared by every engine component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_base_challenge_count")]
    pub base_challenge_count: u32,
    #[serde(default = "GameConfig::default_max_challenge_count")]
    pub max_challenge_count: u32,
    #[serde(default = "GameConfig::default_max_eligible_difficulty")]
    pub max_eligible_difficulty: u32,
    #[serde(default = "GameConfig::default_base_time_limit")]
    pub base_time_limit: f64,
    #[serde(default = "GameConfig::default_time_limit_decay")]
    pub time_limit_decay: f64,
    #[serde(default = "GameConfig::default_min_time_limit")]
    pub min_time_limit: f64,
    #[serde(default = "GameConfig::default_max_level")]
    pub max_level: u32,
    #[serde(default = "GameConfig::default_recent_session_cap")]
    pub recent_session_cap: usize,
    #[serde(default = "GameConfig::default_recommendation_window")]
    pub recommendation_window: usize,
    #[serde(default = "GameConfig::default_promote_two_accuracy")]
    pub promote_two_accuracy: f64,
    #[serde(default = "GameConfig::default_promote_one_accuracy")]
    pub promote_one_accuracy: f64,
    /// Countdown tick length in seconds.
    #[serde(default = "GameConfig::default_tick_interval")]
    pub tick_interval: f64,
    /// Pause between a completed challenge and the next prompt, in seconds.
    #[serde(default = "GameConfig::default_advance_delay")]
    pub advance_delay: f64,
    /// Translations at or below this distance classify as a drag, not a swipe.
    #[serde(default = "GameConfig::default_drag_threshold")]
    pub drag_threshold: f64,
}

impl GameConfig {
    const fn default_base_challenge_count() -> u32 {
        constants::BASE_CHALLENGE_COUNT
    }

    const fn default_max_challenge_count() -> u32 {
        constants::MAX_CHALLENGE_COUNT
    }

    const fn default_max_eligible_difficulty() -> u32 {
        constants::MAX_ELIGIBLE_DIFFICULTY
    }

    const fn default_base_time_limit() -> f64 {
        constants::BASE_TIME_LIMIT_SECS
    }

    const fn default_time_limit_decay() -> f64 {
        constants::TIME_LIMIT_DECAY_PER_LEVEL
    }

    const fn default_min_time_limit() -> f64 {
        constants::MIN_TIME_LIMIT_SECS
    }

    const fn default_max_level() -> u32 {
        constants::MAX_LEVEL
    }

    const fn default_recent_session_cap() -> usize {
        constants::RECENT_SESSION_CAP
    }

    const fn default_recommendation_window() -> usize {
        constants::RECOMMENDATION_WINDOW
    }

    const fn default_promote_two_accuracy() -> f64 {
        constants::PROMOTE_TWO_ACCURACY
    }

    const fn default_promote_one_accuracy() -> f64 {
        constants::PROMOTE_ONE_ACCURACY
    }

    const fn default_tick_interval() -> f64 {
        constants::TICK_INTERVAL_SECS
    }

    const fn default_advance_delay() -> f64 {
        constants::ADVANCE_DELAY_SECS
    }

    const fn default_drag_threshold() -> f64 {
        constants::DRAG_DISTANCE_THRESHOLD
    }

    /// Classify a finished pan by its translation, using `drag_threshold`.
    #[must_use]
    pub fn classify_drag(&self, dx: f64, dy: f64) -> GestureType {
        gesture::classify_drag(dx, dy, self.drag_threshold)
    }

    /// Parse configuration from JSON; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the parsed values fail validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants every component relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_challenge_count < 1 {
            return Err(ConfigError::MinViolation {
                field: "base_challenge_count",
                min: 1.0,
                value: f64::from(self.base_challenge_count),
            });
        }
        if self.base_challenge_count > self.max_challenge_count {
            return Err(ConfigError::ChallengeCountBounds {
                base: self.base_challenge_count,
                max: self.max_challenge_count,
            });
        }
        if self.max_eligible_difficulty < 1 {
            return Err(ConfigError::MinViolation {
                field: "max_eligible_difficulty",
                min: 1.0,
                value: f64::from(self.max_eligible_difficulty),
            });
        }
        if self.max_level < 1 {
            return Err(ConfigError::MinViolation {
                field: "max_level",
                min: 1.0,
                value: f64::from(self.max_level),
            });
        }
        if !(self.min_time_limit > 0.0) {
            return Err(ConfigError::MinViolation {
                field: "min_time_limit",
                min: 0.0,
                value: self.min_time_limit,
            });
        }
        if self.min_time_limit > self.base_time_limit {
            return Err(ConfigError::TimeLimitBounds {
                floor: self.min_time_limit,
                base: self.base_time_limit,
            });
        }
        if !(self.time_limit_decay >= 0.0) {
            return Err(ConfigError::MinViolation {
                field: "time_limit_decay",
                min: 0.0,
                value: self.time_limit_decay,
            });
        }
        if self.recent_session_cap < 1 {
            return Err(ConfigError::MinViolation {
                field: "recent_session_cap",
                min: 1.0,
                value: 0.0,
            });
        }
        for (field, value) in [
            ("promote_two_accuracy", self.promote_two_accuracy),
            ("promote_one_accuracy", self.promote_one_accuracy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RangeViolation {
                    field,
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }
        if self.promote_one_accuracy > self.promote_two_accuracy {
            return Err(ConfigError::PromotionOrder {
                one: self.promote_one_accuracy,
                two: self.promote_two_accuracy,
            });
        }
        for (field, value) in [
            ("tick_interval", self.tick_interval),
            ("advance_delay", self.advance_delay),
            ("drag_threshold", self.drag_threshold),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        if !(self.tick_interval > 0.0) {
            return Err(ConfigError::MinViolation {
                field: "tick_interval",
                min: 0.0,
                value: self.tick_interval,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_challenge_count: Self::default_base_challenge_count(),
            max_challenge_count: Self::default_max_challenge_count(),
            max_eligible_difficulty: Self::default_max_eligible_difficulty(),
            base_time_limit: Self::default_base_time_limit(),
            time_limit_decay: Self::default_time_limit_decay(),
            min_time_limit: Self::default_min_time_limit(),
            max_level: Self::default_max_level(),
            recent_session_cap: Self::default_recent_session_cap(),
            recommendation_window: Self::default_recommendation_window(),
            promote_two_accuracy: Self::default_promote_two_accuracy(),
            promote_one_accuracy: Self::default_promote_one_accuracy(),
            tick_interval: Self::default_tick_interval(),
            advance_delay: Self::default_advance_delay(),
            drag_threshold: Self::default_drag_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_challenge_count, 15);
        assert!((cfg.min_time_limit - 3.0).abs() < f64::EPSILON);
        assert_eq!(cfg.recent_session_cap, 50);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = GameConfig::from_json(r#"{ "max_level": 12 }"#).unwrap();
        assert_eq!(cfg.max_level, 12);
        assert_eq!(cfg.base_challenge_count, 5);
        assert!((cfg.tick_interval - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = GameConfig::from_json(r#"{ "base_challenge_count": 20 }"#).unwrap_err();
        assert_eq!(err, ConfigError::ChallengeCountBounds { base: 20, max: 15 });

        let err = GameConfig::from_json(r#"{ "min_time_limit": 12.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::TimeLimitBounds { .. }));

        let err = GameConfig::from_json(r#"{ "promote_one_accuracy": 0.95 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::PromotionOrder { .. }));
    }

    #[test]
    fn classify_drag_uses_configured_threshold() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.classify_drag(30.0, 0.0), GestureType::Drag);
        assert_eq!(cfg.classify_drag(80.0, 0.0), GestureType::SwipeRight);

        let loose = GameConfig {
            drag_threshold: 100.0,
            ..GameConfig::default()
        };
        assert_eq!(loose.classify_drag(80.0, 0.0), GestureType::Drag);
        assert_eq!(loose.classify_drag(0.0, -150.0), GestureType::SwipeUp);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let cfg = GameConfig {
            tick_interval: 0.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "tick_interval",
                ..
            })
        ));
    }
}
