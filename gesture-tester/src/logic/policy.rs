use std::fmt;

use gesture_game::{Challenge, GestureType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Scripted player interface: decides what, if anything, to perform on a tick.
pub trait ScriptedPlayer {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// React to the prompt `challenge` after `elapsed` seconds on it.
    fn react(&mut self, challenge: &Challenge, elapsed: f64) -> Option<GestureType>;
}

/// Built-in player scripts for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerPolicy {
    /// Performs the prompted gesture on every tick.
    Perfect,
    /// Mostly right, but mixes in wrong gestures.
    Sloppy,
    /// Correct but slow; often runs out the clock on later levels.
    Sluggish,
    /// Never gestures; every challenge times out.
    Idle,
}

impl PlayerPolicy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Sloppy => "Sloppy",
            Self::Sluggish => "Sluggish",
            Self::Idle => "Idle",
        }
    }

    #[must_use]
    pub fn create_player(self, seed: u64) -> Box<dyn ScriptedPlayer> {
        match self {
            Self::Perfect => Box::new(PerfectPlayer),
            Self::Sloppy => Box::new(SloppyPlayer::new(seed)),
            Self::Sluggish => Box::new(SluggishPlayer::default()),
            Self::Idle => Box::new(IdlePlayer),
        }
    }
}

impl fmt::Display for PlayerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct PerfectPlayer;

impl ScriptedPlayer for PerfectPlayer {
    fn name(&self) -> &'static str {
        "Perfect"
    }

    fn react(&mut self, challenge: &Challenge, _elapsed: f64) -> Option<GestureType> {
        Some(challenge.gesture)
    }
}

const SLOPPY_MISS_RATE: f64 = 0.3;

struct SloppyPlayer {
    rng: ChaCha8Rng,
}

impl SloppyPlayer {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed ^ 0x5EED_5105),
        }
    }
}

impl ScriptedPlayer for SloppyPlayer {
    fn name(&self) -> &'static str {
        "Sloppy"
    }

    fn react(&mut self, challenge: &Challenge, _elapsed: f64) -> Option<GestureType> {
        if !self.rng.gen_bool(SLOPPY_MISS_RATE) {
            return Some(challenge.gesture);
        }
        let wrong: Vec<GestureType> = GestureType::ALL
            .into_iter()
            .filter(|&gesture| gesture != challenge.gesture)
            .collect();
        let pick = self.rng.gen_range(0..wrong.len());
        wrong.get(pick).copied()
    }
}

/// Seconds between the sluggish player's gestures.
const SLUGGISH_GAP_SECS: f64 = 1.5;

#[derive(Default)]
struct SluggishPlayer {
    next_at: f64,
}

impl ScriptedPlayer for SluggishPlayer {
    fn name(&self) -> &'static str {
        "Sluggish"
    }

    fn react(&mut self, challenge: &Challenge, elapsed: f64) -> Option<GestureType> {
        // A fresh prompt restarts the schedule.
        if elapsed < self.next_at - SLUGGISH_GAP_SECS {
            self.next_at = 0.0;
        }
        if elapsed + 1e-9 < self.next_at.max(SLUGGISH_GAP_SECS) {
            return None;
        }
        self.next_at = elapsed + SLUGGISH_GAP_SECS;
        Some(challenge.gesture)
    }
}

struct IdlePlayer;

impl ScriptedPlayer for IdlePlayer {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn react(&mut self, _challenge: &Challenge, _elapsed: f64) -> Option<GestureType> {
        None
    }
}
