//! Centralized balance and tuning defaults for Gesture Quest game logic.
//!
//! These values seed `GameConfig::default()`. Keeping them together means the
//! default difficulty curve can only change through reviewed code, while
//! hosts may still override individual fields through JSON configuration.

// Challenge generation -----------------------------------------------------
pub(crate) const BASE_CHALLENGE_COUNT: u32 = 5;
pub(crate) const MAX_CHALLENGE_COUNT: u32 = 15;
pub(crate) const MAX_ELIGIBLE_DIFFICULTY: u32 = 4;
pub(crate) const BASE_TIME_LIMIT_SECS: f64 = 10.0;
pub(crate) const TIME_LIMIT_DECAY_PER_LEVEL: f64 = 0.5;
pub(crate) const MIN_TIME_LIMIT_SECS: f64 = 3.0;
pub(crate) const MAX_LEVEL: u32 = 20;

// Scoring ------------------------------------------------------------------
pub(crate) const POINTS_PER_DIFFICULTY: u32 = 100;
pub(crate) const TIME_BONUS_PER_SECOND: f64 = 10.0;
pub(crate) const ACCURACY_BONUS_SCALE: f64 = 100.0;

// History and recommendations ---------------------------------------------
pub(crate) const RECENT_SESSION_CAP: usize = 50;
pub(crate) const RECOMMENDATION_WINDOW: usize = 5;
pub(crate) const PROMOTE_TWO_ACCURACY: f64 = 0.90;
pub(crate) const PROMOTE_ONE_ACCURACY: f64 = 0.70;

// Analysis ratings ---------------------------------------------------------
pub(crate) const ACCURACY_EXCELLENT: f64 = 0.9;
pub(crate) const ACCURACY_GOOD: f64 = 0.7;
pub(crate) const ACCURACY_AVERAGE: f64 = 0.5;
pub(crate) const SPEED_FAST_SECS: f64 = 3.0;
pub(crate) const SPEED_MODERATE_SECS: f64 = 5.0;
pub(crate) const BEGINNER_LEVEL_CEILING: u32 = 5;

// Controller pacing --------------------------------------------------------
pub(crate) const TICK_INTERVAL_SECS: f64 = 0.1;
pub(crate) const ADVANCE_DELAY_SECS: f64 = 1.0;

// Input classification -----------------------------------------------------
pub(crate) const DRAG_DISTANCE_THRESHOLD: f64 = 50.0;

// Persistence --------------------------------------------------------------
/// Blob key holding the serialized `PlayerStats`.
pub const PLAYER_STATS_KEY: &str = "PlayerStats";
/// Blob key holding the serialized recent-session list.
pub const RECENT_SESSIONS_KEY: &str = "RecentSessions";
