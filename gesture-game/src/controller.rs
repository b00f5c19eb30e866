//! Countdown controller: the single mutation path for the active session.
//!
//! Timer ticks and gesture events both arrive here and are applied in call
//! order. Hosts that receive them on different threads must funnel them
//! through one owner (see `runtime` for a tokio driver).
use chrono::{DateTime, Utc};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::challenge::Challenge;
use crate::config::GameConfig;
use crate::gesture::GestureType;
use crate::session::{ChallengeOutcome, Session};

/// Remaining time at or below this counts as expired.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    Menu,
    Playing,
    Paused,
    /// Between challenges; the next one starts once the pacing delay elapses.
    Advancing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// No challenge is accepting input.
    Ignored,
    /// Wrong gesture; counted against accuracy only.
    Missed,
    Counted { count: u32, target: u32 },
    /// The gesture reached the target count.
    Completed(ChallengeOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    Running { remaining: f64 },
    TimeUp(ChallengeOutcome),
    Waiting { remaining: f64 },
    NextChallenge { index: usize },
}

#[derive(Debug, Clone)]
pub struct GameController {
    config: GameConfig,
    phase: ControllerPhase,
    resume_phase: ControllerPhase,
    session: Option<Session>,
    level: u32,
    time_remaining: f64,
    challenge_elapsed: f64,
    gesture_count: u32,
    advance_remaining: f64,
}

impl GameController {
    #[must_use]
    pub const fn new(config: GameConfig) -> Self {
        Self {
            config,
            phase: ControllerPhase::Menu,
            resume_phase: ControllerPhase::Playing,
            session: None,
            level: 1,
            time_remaining: 0.0,
            challenge_elapsed: 0.0,
            gesture_count: 0,
            advance_remaining: 0.0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Active session, or the finished one until it is taken.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn current_challenge(&self) -> Option<&Challenge> {
        self.session.as_ref().and_then(Session::current_challenge)
    }

    #[must_use]
    pub const fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    #[must_use]
    pub const fn gesture_count(&self) -> u32 {
        self.gesture_count
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Fraction of the session's challenges consumed.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.session.as_ref().map_or(0.0, Session::progress)
    }

    /// Correct gestures over the current challenge's target.
    #[must_use]
    pub fn challenge_progress(&self) -> f64 {
        self.current_challenge().map_or(0.0, |challenge| {
            f64::from(self.gesture_count) / f64::from(challenge.target_count.max(1))
        })
    }

    /// Begin a fresh session at `level`, discarding any previous one.
    pub fn start_game<R: Rng + ?Sized>(&mut self, level: u32, rng: &mut R, now: DateTime<Utc>) {
        let session = Session::new(level, &self.config, rng, now);
        self.level = session.level;
        debug!(
            "starting session {} at level {} with {} challenges",
            session.id,
            session.level,
            session.challenges.len()
        );
        self.session = Some(session);
        self.start_current_challenge();
    }

    /// Start again at the level of the last session.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R, now: DateTime<Utc>) {
        self.start_game(self.level, rng, now);
    }

    /// Drop the session and any pending advance.
    pub fn return_to_menu(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("session {} abandoned", session.id);
        }
        self.phase = ControllerPhase::Menu;
        self.reset_challenge_state();
    }

    /// Suspend the countdown or the pending advance. Elapsed state is kept.
    pub fn pause(&mut self) -> bool {
        match self.phase {
            ControllerPhase::Playing | ControllerPhase::Advancing => {
                self.resume_phase = self.phase;
                self.phase = ControllerPhase::Paused;
                true
            }
            _ => false,
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != ControllerPhase::Paused {
            return false;
        }
        self.phase = self.resume_phase;
        true
    }

    /// Apply one classified gesture to the current challenge.
    pub fn handle_gesture(&mut self, gesture: GestureType, now: DateTime<Utc>) -> GestureOutcome {
        if self.phase != ControllerPhase::Playing {
            return GestureOutcome::Ignored;
        }
        let Some(session) = self.session.as_mut() else {
            return GestureOutcome::Ignored;
        };
        let Some(target) = session
            .current_challenge()
            .map(|challenge| (challenge.gesture, challenge.target_count))
        else {
            return GestureOutcome::Ignored;
        };
        let (expected, target_count) = target;

        let is_correct = gesture == expected;
        session.record_gesture(is_correct);
        if !is_correct {
            return GestureOutcome::Missed;
        }

        self.gesture_count = self.gesture_count.saturating_add(1);
        if self.gesture_count >= target_count {
            return self
                .finish_challenge(now)
                .map_or(GestureOutcome::Ignored, GestureOutcome::Completed);
        }
        GestureOutcome::Counted {
            count: self.gesture_count,
            target: target_count,
        }
    }

    /// Advance the countdown or the pacing delay by `dt` seconds.
    pub fn tick(&mut self, dt: f64, now: DateTime<Utc>) -> TickOutcome {
        if !dt.is_finite() || dt <= 0.0 {
            return TickOutcome::Idle;
        }
        match self.phase {
            ControllerPhase::Playing => {
                self.time_remaining -= dt;
                self.challenge_elapsed += dt;
                if self.time_remaining <= TIME_EPSILON {
                    self.time_remaining = 0.0;
                    debug!("time up after {:.2}s", self.challenge_elapsed);
                    return self
                        .finish_challenge(now)
                        .map_or(TickOutcome::Idle, TickOutcome::TimeUp);
                }
                TickOutcome::Running {
                    remaining: self.time_remaining,
                }
            }
            ControllerPhase::Advancing => {
                self.advance_remaining -= dt;
                if self.advance_remaining <= TIME_EPSILON {
                    self.advance_remaining = 0.0;
                    self.start_current_challenge();
                    let index = self.session.as_ref().map_or(0, Session::current_index);
                    return TickOutcome::NextChallenge { index };
                }
                TickOutcome::Waiting {
                    remaining: self.advance_remaining,
                }
            }
            ControllerPhase::Menu | ControllerPhase::Paused | ControllerPhase::Finished => {
                TickOutcome::Idle
            }
        }
    }

    /// Hand over the finished session. Yields it exactly once.
    pub fn take_finished_session(&mut self) -> Option<Session> {
        if self.phase != ControllerPhase::Finished {
            return None;
        }
        self.session.take()
    }

    /// Shared completion path for both the gesture target and the timer.
    fn finish_challenge(&mut self, now: DateTime<Utc>) -> Option<ChallengeOutcome> {
        let session = self.session.as_mut()?;
        let challenge = session.current_challenge()?;
        let accuracy =
            (f64::from(self.gesture_count) / f64::from(challenge.target_count.max(1))).min(1.0);
        let elapsed = self.challenge_elapsed.min(challenge.time_limit);

        let outcome = session.complete_current_challenge_at(elapsed, accuracy, now)?;
        if outcome.session_completed {
            debug!("session {} finished with {}", session.id, session.score());
            self.phase = ControllerPhase::Finished;
            self.reset_challenge_state();
        } else if self.config.advance_delay > 0.0 {
            self.phase = ControllerPhase::Advancing;
            self.advance_remaining = self.config.advance_delay;
        } else {
            self.start_current_challenge();
        }
        Some(outcome)
    }

    fn start_current_challenge(&mut self) {
        let time_limit = self
            .session
            .as_ref()
            .and_then(Session::current_challenge)
            .map(|challenge| challenge.time_limit);
        match time_limit {
            Some(limit) => {
                self.phase = ControllerPhase::Playing;
                self.time_remaining = limit;
                self.challenge_elapsed = 0.0;
                self.gesture_count = 0;
                self.advance_remaining = 0.0;
            }
            None => {
                self.phase = ControllerPhase::Finished;
                self.reset_challenge_state();
            }
        }
    }

    const fn reset_challenge_state(&mut self) {
        self.time_remaining = 0.0;
        self.challenge_elapsed = 0.0;
        self.gesture_count = 0;
        self.advance_remaining = 0.0;
    }
}
