//! Gesture challenges and their per-level generator.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::gesture::GestureType;

/// Completion state of a challenge.
///
/// A completed challenge always carries both its time and accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChallengeStatus {
    #[default]
    Pending,
    Completed {
        /// Seconds from prompt to completion (or time-up).
        time: f64,
        /// Achieved repetitions over target, in `[0, 1]`.
        accuracy: f64,
    },
}

/// One prompted gesture with a repetition target and a time limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub gesture: GestureType,
    pub target_count: u32,
    /// Seconds allowed before the challenge times out.
    pub time_limit: f64,
    pub level: u32,
    #[serde(default)]
    pub status: ChallengeStatus,
}

impl Challenge {
    #[must_use]
    pub const fn new(gesture: GestureType, target_count: u32, time_limit: f64, level: u32) -> Self {
        Self {
            gesture,
            target_count,
            time_limit,
            level,
            status: ChallengeStatus::Pending,
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, ChallengeStatus::Completed { .. })
    }

    #[must_use]
    pub const fn completion_time(&self) -> Option<f64> {
        match self.status {
            ChallengeStatus::Completed { time, .. } => Some(time),
            ChallengeStatus::Pending => None,
        }
    }

    #[must_use]
    pub const fn accuracy(&self) -> Option<f64> {
        match self.status {
            ChallengeStatus::Completed { accuracy, .. } => Some(accuracy),
            ChallengeStatus::Pending => None,
        }
    }

    #[must_use]
    pub const fn difficulty(&self) -> u32 {
        self.gesture.difficulty()
    }
}

/// Number of challenges in a session at `level`.
#[must_use]
pub fn challenge_count(level: u32, config: &GameConfig) -> u32 {
    // The cap wins over the base when a config inverts them.
    config
        .base_challenge_count
        .saturating_add(level)
        .max(config.base_challenge_count)
        .min(config.max_challenge_count)
}

/// Seconds allowed per challenge at `level`.
#[must_use]
pub fn time_limit_for(level: u32, config: &GameConfig) -> f64 {
    (config.base_time_limit - config.time_limit_decay * f64::from(level)).max(config.min_time_limit)
}

/// Repetitions required for the challenge at `index` (0-based) within a `level` session.
#[must_use]
pub const fn target_count_for(level: u32, index: u32) -> u32 {
    let target = level.saturating_add(index / 2);
    if target < 1 { 1 } else { target }
}

/// Produce the ordered challenge list for `level`.
///
/// Level 0 is treated as level 1. Gestures are drawn uniformly from every
/// type whose difficulty does not exceed `min(level, max_eligible_difficulty)`.
pub fn generate_challenges<R: Rng + ?Sized>(
    level: u32,
    config: &GameConfig,
    rng: &mut R,
) -> Vec<Challenge> {
    let level = level.max(1);
    let ceiling = level.min(config.max_eligible_difficulty).max(1);
    let eligible: Vec<GestureType> = GestureType::eligible(ceiling).collect();
    let time_limit = time_limit_for(level, config);

    (0..challenge_count(level, config))
        .map(|index| {
            let gesture = eligible.choose(rng).copied().unwrap_or(GestureType::Tap);
            Challenge::new(gesture, target_count_for(level, index), time_limit, level)
        })
        .collect()
}
