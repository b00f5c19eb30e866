use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use gesture_game::{
    ControllerPhase, GameConfig, GameEngine, GestureOutcome, GestureStorage, ManualClock,
    PlayerStats, Session, TickOutcome, unlocked_achievements,
};
use log::{debug, warn};

use crate::logic::policy::PlayerPolicy;

/// Hard stop for a single session that never finishes.
const MAX_TICKS_PER_SESSION: u32 = 100_000;

/// Configuration for a simulated play-through of several sessions.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub policy: PlayerPolicy,
    pub first_level: u32,
    pub sessions: u32,
    /// Follow the store's recommendation instead of climbing one level per session.
    pub follow_recommendation: bool,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(policy: PlayerPolicy, seed: u64) -> Self {
        Self {
            seed,
            policy,
            first_level: 1,
            sessions: 1,
            follow_recommendation: false,
        }
    }

    #[must_use]
    pub const fn with_levels(mut self, first_level: u32, sessions: u32) -> Self {
        self.first_level = first_level;
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub const fn following_recommendation(mut self) -> Self {
        self.follow_recommendation = true;
        self
    }
}

/// Snapshot of one finished session.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub level: u32,
    pub score: u32,
    pub completed: bool,
    pub challenges: usize,
    pub completed_challenges: usize,
    pub total_gestures: u32,
    pub correct_gestures: u32,
    pub accuracy: f64,
    pub ticks: u32,
    /// Score accumulated from `ChallengeOutcome` points as they arrived.
    pub points_observed: u32,
    pub timeouts: u32,
    pub invariant_held: bool,
    pub achievements_after: usize,
    pub recommended_after: u32,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub policy: PlayerPolicy,
    pub sessions: Vec<SessionRecord>,
    pub final_stats: PlayerStats,
    pub recent_len: usize,
    pub recent_cap: usize,
    pub achievements: Vec<&'static str>,
    pub persist_failures: u32,
}

impl SimulationSummary {
    #[must_use]
    pub fn total_score(&self) -> u64 {
        self.sessions.iter().map(|s| u64::from(s.score)).sum()
    }
}

/// Deterministic driver that plays sessions through a `GameEngine`.
pub struct SimulationSession<S: GestureStorage> {
    engine: GameEngine<S, ManualClock>,
    config: SimulationConfig,
}

impl<S: GestureStorage> SimulationSession<S> {
    pub fn new(
        storage: S,
        game_config: GameConfig,
        config: SimulationConfig,
        start: DateTime<Utc>,
    ) -> Self {
        let engine =
            GameEngine::with_clock(storage, game_config, config.seed, ManualClock::new(start));
        Self { engine, config }
    }

    /// Play every configured session.
    ///
    /// # Errors
    ///
    /// Returns an error if a session never finishes.
    pub fn run(mut self) -> Result<SimulationSummary> {
        let mut records = Vec::new();
        let mut persist_failures = 0;
        let mut level = self.config.first_level;

        for index in 0..self.config.sessions {
            if self.config.follow_recommendation && index > 0 {
                level = self.engine.store().recommended_level();
            }
            let seed = self.config.seed.wrapping_add(u64::from(index));
            let (record, failures) = self.play_one(level, seed)?;
            persist_failures += failures;
            records.push(record);
            if !self.config.follow_recommendation {
                level = level.saturating_add(1);
            }
        }

        let store = self.engine.store();
        Ok(SimulationSummary {
            seed: self.config.seed,
            policy: self.config.policy,
            sessions: records,
            final_stats: store.stats().clone(),
            recent_len: store.recent_sessions().len(),
            recent_cap: store.config().recent_session_cap,
            achievements: store.achievements().into_iter().map(|a| a.id).collect(),
            persist_failures,
        })
    }

    fn play_one(&mut self, level: u32, seed: u64) -> Result<(SessionRecord, u32)> {
        let mut player = self.config.policy.create_player(seed);
        let dt = self.engine.config().tick_interval;
        let mut persist_failures = 0;
        let mut ticks = 0;
        let mut points_observed = 0u32;
        let mut timeouts = 0;
        let mut invariant_held = true;
        let mut elapsed = 0.0;

        self.engine.start_game(level);
        debug!("simulating level {level} with {} player", player.name());

        while self.engine.controller().phase() != ControllerPhase::Finished {
            if ticks >= MAX_TICKS_PER_SESSION {
                bail!(
                    "session at level {level} did not finish within {MAX_TICKS_PER_SESSION} ticks"
                );
            }
            ticks += 1;

            self.engine.clock().advance_secs(dt);
            match self.engine.tick(dt) {
                Ok(TickOutcome::TimeUp(outcome)) => {
                    timeouts += 1;
                    points_observed = points_observed.saturating_add(outcome.points);
                    elapsed = 0.0;
                }
                Ok(TickOutcome::NextChallenge { .. }) => elapsed = 0.0,
                Ok(TickOutcome::Running { .. }) => elapsed += dt,
                Ok(_) => {}
                Err(err) => {
                    warn!("persisting session failed: {err}");
                    persist_failures += 1;
                }
            }

            if self.engine.controller().phase() != ControllerPhase::Playing {
                continue;
            }
            let Some(gesture) = self
                .engine
                .controller()
                .current_challenge()
                .and_then(|challenge| player.react(challenge, elapsed))
            else {
                continue;
            };
            match self.engine.handle_gesture(gesture) {
                Ok(GestureOutcome::Completed(outcome)) => {
                    points_observed = points_observed.saturating_add(outcome.points);
                    elapsed = 0.0;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("persisting session failed: {err}");
                    persist_failures += 1;
                }
            }

            if let Some(session) = self.engine.controller().session() {
                invariant_held &= index_matches_completion(session);
            }
        }

        let Some(report) = self.engine.last_report() else {
            bail!("finished session at level {level} was not reported");
        };
        let session = &report.session;
        invariant_held &= index_matches_completion(session);

        let record = SessionRecord {
            level: session.level,
            score: session.score(),
            completed: session.is_completed(),
            challenges: session.challenges.len(),
            completed_challenges: session.completed_challenges().count(),
            total_gestures: session.total_gestures(),
            correct_gestures: session.correct_gestures(),
            accuracy: session.accuracy(),
            ticks,
            points_observed,
            timeouts,
            invariant_held,
            achievements_after: unlocked_achievements(self.engine.store().stats()).len(),
            recommended_after: self.engine.store().recommended_level(),
        };
        Ok((record, persist_failures))
    }
}

fn index_matches_completion(session: &Session) -> bool {
    session.is_completed() == (session.current_index() == session.challenges.len())
}
