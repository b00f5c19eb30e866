//! Session state machine: progression through a level's challenges.
use chrono::{DateTime, Utc};
use log::debug;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::challenge::{Challenge, ChallengeStatus, generate_challenges};
use crate::clock::seconds_between;
use crate::config::GameConfig;
use crate::numbers::usize_to_f64;
use crate::scoring::score_challenge;

/// Coarse lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Completed,
}

/// Result of completing one challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeOutcome {
    /// Index of the challenge that was just completed.
    pub index: usize,
    pub points: u32,
    /// Whether this completion consumed the final challenge.
    pub session_completed: bool,
}

/// One playthrough of a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: u64,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    current_index: usize,
    #[serde(default)]
    score: u32,
    pub level: u32,
    #[serde(default)]
    total_gestures: u32,
    #[serde(default)]
    correct_gestures: u32,
    #[serde(default)]
    is_completed: bool,
}

impl Session {
    /// Start a session at `level` with freshly generated challenges.
    pub fn new<R: Rng + ?Sized>(
        level: u32,
        config: &GameConfig,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        let level = level.max(1);
        let id = rng.next_u64();
        let challenges = generate_challenges(level, config, rng);
        Self::with_challenges(id, level, challenges, now)
    }

    /// Build a session around an explicit challenge list.
    #[must_use]
    pub fn with_challenges(
        id: u64,
        level: u32,
        challenges: Vec<Challenge>,
        now: DateTime<Utc>,
    ) -> Self {
        let is_completed = challenges.is_empty();
        Self {
            id,
            start_time: now,
            end_time: is_completed.then_some(now),
            challenges,
            current_index: 0,
            score: 0,
            level,
            total_gestures: 0,
            correct_gestures: 0,
            is_completed,
        }
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn total_gestures(&self) -> u32 {
        self.total_gestures
    }

    #[must_use]
    pub const fn correct_gestures(&self) -> u32 {
        self.correct_gestures
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_completed {
            SessionPhase::Completed
        } else if self.current_index == 0 && self.total_gestures == 0 {
            SessionPhase::NotStarted
        } else {
            SessionPhase::InProgress
        }
    }

    /// Count one classified gesture. Does not advance the challenge.
    pub const fn record_gesture(&mut self, is_correct: bool) {
        self.total_gestures = self.total_gestures.saturating_add(1);
        if is_correct {
            self.correct_gestures = self.correct_gestures.saturating_add(1);
        }
    }

    /// Complete the current challenge, stamping the end time from the system clock.
    pub fn complete_current_challenge(
        &mut self,
        completion_time: f64,
        accuracy: f64,
    ) -> Option<ChallengeOutcome> {
        self.complete_current_challenge_at(completion_time, accuracy, Utc::now())
    }

    /// Complete the current challenge and advance.
    ///
    /// Returns `None` without touching any state when every challenge is
    /// already consumed. Time is clamped to be non-negative and accuracy to
    /// `[0, 1]` before scoring.
    pub fn complete_current_challenge_at(
        &mut self,
        completion_time: f64,
        accuracy: f64,
        now: DateTime<Utc>,
    ) -> Option<ChallengeOutcome> {
        let index = self.current_index;
        let Some(challenge) = self.challenges.get_mut(index) else {
            debug!(
                "session {}: completion ignored, all {} challenges consumed",
                self.id,
                self.challenges.len()
            );
            return None;
        };

        let time = if completion_time.is_nan() {
            0.0
        } else {
            completion_time.max(0.0)
        };
        let accuracy = if accuracy.is_nan() {
            0.0
        } else {
            accuracy.clamp(0.0, 1.0)
        };
        challenge.status = ChallengeStatus::Completed { time, accuracy };
        let points = score_challenge(challenge.difficulty(), challenge.time_limit, time, accuracy);

        self.score = self.score.saturating_add(points);
        self.current_index += 1;
        if self.current_index == self.challenges.len() {
            self.is_completed = true;
            self.end_time = Some(now);
        }

        debug!(
            "session {}: challenge {} done (+{points}, total {})",
            self.id,
            index + 1,
            self.score
        );

        Some(ChallengeOutcome {
            index,
            points,
            session_completed: self.is_completed,
        })
    }

    /// Seconds since start, frozen at the end time once completed.
    #[must_use]
    pub fn duration_at(&self, now: DateTime<Utc>) -> f64 {
        seconds_between(self.start_time, self.end_time.unwrap_or(now))
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration_at(Utc::now())
    }

    /// Correct gestures over all gestures; 0 before any gesture.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_gestures == 0 {
            return 0.0;
        }
        f64::from(self.correct_gestures) / f64::from(self.total_gestures)
    }

    #[must_use]
    pub fn current_challenge(&self) -> Option<&Challenge> {
        self.challenges.get(self.current_index)
    }

    /// Fraction of challenges consumed; 0 for an empty session.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.challenges.is_empty() {
            return 0.0;
        }
        usize_to_f64(self.current_index) / usize_to_f64(self.challenges.len())
    }

    pub fn completed_challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|challenge| challenge.is_completed())
    }
}
