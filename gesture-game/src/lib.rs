//! Gesture Quest Game Engine
//!
//! Platform-agnostic core logic for a casual gesture-matching game: challenge
//! generation, the session state machine, scoring, lifetime statistics,
//! recommendations and achievements. Rendering and raw touch capture live in
//! the host; this crate only consumes classified gestures and timer ticks.

pub mod achievements;
pub mod analysis;
pub mod challenge;
pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod gesture;
pub mod numbers;
#[cfg(feature = "async")]
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Re-export commonly used types
pub use achievements::{Achievement, all_achievements, find_achievement, unlocked_achievements};
pub use analysis::{
    AccuracyRating, ChallengeResult, DailyProgress, GesturePerformance, PerformanceAnalysis,
    PerformancePoint, PerformanceRating, SpeedRating, challenge_breakdown, format_duration,
    gesture_performance, is_level_unlocked, performance_analysis, performance_trend,
    recommended_level, share_text, weekly_progress,
};
pub use challenge::{Challenge, ChallengeStatus, generate_challenges};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use constants::{PLAYER_STATS_KEY, RECENT_SESSIONS_KEY};
pub use controller::{ControllerPhase, GameController, GestureOutcome, TickOutcome};
pub use gesture::{GestureType, classify_drag};
pub use scoring::score_challenge;
pub use session::{ChallengeOutcome, Session, SessionPhase};
pub use stats::{GestureStats, PlayerStats};
pub use storage::{FileStorage, MemoryStorage};
pub use store::{PlayerStore, StoreError};

/// Key-value persistence for the two player blobs.
/// Platform-specific implementations should provide this
pub trait GestureStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a blob, `None` if it was never written
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace a blob in full
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn save_blob(&self, key: &str, json: &str) -> Result<(), Self::Error>;
}

/// A finished session together with the feedback computed before it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session: Session,
    pub analysis: PerformanceAnalysis,
}

/// Main game engine: one controller, one player store, one seeded RNG.
///
/// Every finished session is analysed and then recorded into the store
/// exactly once, whichever input finished it.
pub struct GameEngine<S, C = SystemClock>
where
    S: GestureStorage,
    C: Clock,
{
    controller: GameController,
    store: PlayerStore<S>,
    rng: ChaCha8Rng,
    clock: C,
    last_report: Option<SessionReport>,
}

impl<S> GameEngine<S, SystemClock>
where
    S: GestureStorage,
{
    /// Create an engine on the system clock, loading any saved player data
    #[must_use]
    pub fn new(storage: S, config: GameConfig, seed: u64) -> Self {
        Self::with_clock(storage, config, seed, SystemClock)
    }
}

impl<S, C> GameEngine<S, C>
where
    S: GestureStorage,
    C: Clock,
{
    #[must_use]
    pub fn with_clock(storage: S, config: GameConfig, seed: u64, clock: C) -> Self {
        let controller = GameController::new(config.clone());
        Self {
            controller,
            store: PlayerStore::load(storage, config),
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock,
            last_report: None,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &GameController {
        &self.controller
    }

    #[must_use]
    pub const fn store(&self) -> &PlayerStore<S> {
        &self.store
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        self.controller.config()
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Report for the most recently finished session.
    #[must_use]
    pub const fn last_report(&self) -> Option<&SessionReport> {
        self.last_report.as_ref()
    }

    pub fn start_game(&mut self, level: u32) {
        self.last_report = None;
        let now = self.clock.now();
        self.controller.start_game(level, &mut self.rng, now);
    }

    /// Start at the store's recommended level and return it.
    pub fn start_recommended(&mut self) -> u32 {
        let level = self.store.recommended_level();
        self.start_game(level);
        level
    }

    pub fn restart(&mut self) {
        self.last_report = None;
        let now = self.clock.now();
        self.controller.restart(&mut self.rng, now);
    }

    pub fn pause(&mut self) -> bool {
        self.controller.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.controller.resume()
    }

    pub fn return_to_menu(&mut self) {
        self.controller.return_to_menu();
    }

    /// Feed one classified gesture.
    ///
    /// # Errors
    ///
    /// Returns an error if this gesture finished the session and it could not
    /// be persisted.
    pub fn handle_gesture(&mut self, gesture: GestureType) -> Result<GestureOutcome, StoreError> {
        let now = self.clock.now();
        let outcome = self.controller.handle_gesture(gesture, now);
        self.collect_finished()?;
        Ok(outcome)
    }

    /// Advance the countdown by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if a time-up finished the session and it could not
    /// be persisted.
    pub fn tick(&mut self, dt: f64) -> Result<TickOutcome, StoreError> {
        let now = self.clock.now();
        let outcome = self.controller.tick(dt, now);
        self.collect_finished()?;
        Ok(outcome)
    }

    /// Clear all player data. Any session in play is abandoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleared blobs cannot be written.
    pub fn reset_all_data(&mut self) -> Result<(), StoreError> {
        self.controller.return_to_menu();
        self.last_report = None;
        self.store.reset_all_data()
    }

    /// # Errors
    ///
    /// Returns an error if the export bundle cannot be serialized.
    pub fn export_data(&self) -> Result<String, StoreError> {
        self.store.export_data(self.clock.now())
    }

    fn collect_finished(&mut self) -> Result<(), StoreError> {
        let Some(session) = self.controller.take_finished_session() else {
            return Ok(());
        };
        let now = self.clock.now();
        // Personal best compares against the stats before this session; the
        // recommendation must already count it.
        let mut analysis = self.store.performance_analysis(&session, now);
        let recorded = self.store.record_session(session.clone(), now);
        analysis.next_recommended_level = self.store.recommended_level();
        self.last_report = Some(SessionReport { session, analysis });
        recorded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn engine(storage: MemoryStorage) -> GameEngine<MemoryStorage, ManualClock> {
        GameEngine::with_clock(
            storage,
            GameConfig::default(),
            0xABCD,
            ManualClock::new(DateTime::<Utc>::UNIX_EPOCH),
        )
    }

    fn play_perfectly(engine: &mut GameEngine<MemoryStorage, ManualClock>) {
        while engine.controller().phase() != ControllerPhase::Finished {
            match engine.controller().current_challenge() {
                Some(challenge) if engine.controller().phase() == ControllerPhase::Playing => {
                    let gesture = challenge.gesture;
                    engine.clock().advance_secs(0.1);
                    engine.tick(0.1).unwrap();
                    engine.handle_gesture(gesture).unwrap();
                }
                _ => {
                    engine.clock().advance_secs(0.1);
                    engine.tick(0.1).unwrap();
                }
            }
        }
    }

    #[test]
    fn finished_session_is_recorded_once_and_persisted() {
        let storage = MemoryStorage::new();
        let mut engine = engine(storage.clone());
        engine.start_game(1);
        play_perfectly(&mut engine);

        let report = engine.last_report().unwrap();
        assert!(report.session.is_completed());
        assert!(report.analysis.is_personal_best);
        assert_eq!(engine.store().stats().total_sessions, 1);
        assert_eq!(engine.store().stats().levels_completed, 1);

        // Further input after the finish must not record again.
        engine.tick(0.1).unwrap();
        engine.handle_gesture(GestureType::Tap).unwrap();
        assert_eq!(engine.store().stats().total_sessions, 1);

        let reloaded = PlayerStore::load(storage, GameConfig::default());
        assert_eq!(reloaded.stats(), engine.store().stats());
        assert_eq!(reloaded.recent_sessions().len(), 1);
    }

    #[test]
    fn report_recommendation_counts_the_finished_session() {
        let mut engine = engine(MemoryStorage::new());
        engine.start_game(1);
        play_perfectly(&mut engine);

        let report = engine.last_report().unwrap();
        assert!(report.analysis.is_personal_best);
        assert_eq!(
            report.analysis.next_recommended_level,
            engine.store().recommended_level()
        );
        assert_eq!(report.analysis.next_recommended_level, 3);
        assert_eq!(engine.start_recommended(), 3);
    }

    #[test]
    fn same_seed_generates_same_sessions() {
        let mut a = engine(MemoryStorage::new());
        let mut b = engine(MemoryStorage::new());
        a.start_game(6);
        b.start_game(6);
        assert_eq!(a.controller().session(), b.controller().session());
    }

    #[test]
    fn recommended_start_uses_store_history() {
        let mut engine = engine(MemoryStorage::new());
        assert_eq!(engine.start_recommended(), 1);
        play_perfectly(&mut engine);
        // One flawless level-one session: accuracy 1.0 promotes two levels.
        assert_eq!(engine.store().recommended_level(), 3);
    }

    #[test]
    fn reset_abandons_play_and_clears_blobs() {
        let storage = MemoryStorage::new();
        let mut engine = engine(storage.clone());
        engine.start_game(1);
        play_perfectly(&mut engine);
        engine.start_game(2);
        engine.reset_all_data().unwrap();

        assert_eq!(engine.controller().phase(), ControllerPhase::Menu);
        assert!(engine.last_report().is_none());
        assert_eq!(engine.store().stats().total_sessions, 0);
        assert_eq!(storage.get(RECENT_SESSIONS_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn export_uses_engine_clock() {
        let mut engine = engine(MemoryStorage::new());
        engine.clock().advance_secs(90.0);
        let exported = engine.export_data().unwrap();
        assert!(exported.contains("\"exportDate\": \"1970-01-01T00:01:30Z\""));
    }
}
