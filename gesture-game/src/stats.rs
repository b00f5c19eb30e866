//! Cumulative player statistics folded from finished sessions.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gesture::GestureType;
use crate::numbers::{u64_to_f64, usize_to_f64};
use crate::session::Session;

/// Running aggregate for one gesture type. Updated incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureStats {
    pub times_performed: u32,
    pub total_accuracy: f64,
    pub average_accuracy: f64,
    /// Fastest completion in seconds; infinite until the first completion.
    #[serde(with = "best_time_serde")]
    pub best_time: f64,
    pub total_time: f64,
    pub average_time: f64,
}

impl Default for GestureStats {
    fn default() -> Self {
        Self {
            times_performed: 0,
            total_accuracy: 0.0,
            average_accuracy: 0.0,
            best_time: f64::INFINITY,
            total_time: 0.0,
            average_time: 0.0,
        }
    }
}

impl GestureStats {
    /// Fold one completed challenge's time and accuracy.
    pub fn record(&mut self, completion_time: f64, accuracy: f64) {
        self.times_performed = self.times_performed.saturating_add(1);
        let performed = f64::from(self.times_performed);

        self.total_accuracy += accuracy;
        self.average_accuracy = self.total_accuracy / performed;

        self.best_time = self.best_time.min(completion_time);
        self.total_time += completion_time;
        self.average_time = self.total_time / performed;
    }

    /// Best time, or `None` if never performed.
    #[must_use]
    pub fn best_time(&self) -> Option<f64> {
        self.best_time.is_finite().then_some(self.best_time)
    }
}

/// Lifetime statistics for the player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub total_sessions: u32,
    pub total_score: u64,
    pub best_score: u32,
    /// Seconds across every recorded session.
    pub total_play_time: f64,
    /// Unweighted mean of the per-gesture average accuracies.
    pub average_accuracy: f64,
    pub levels_completed: u32,
    pub gesture_stats: BTreeMap<GestureType, GestureStats>,
    pub last_played_date: Option<DateTime<Utc>>,
}

impl PlayerStats {
    /// Fold a terminal session into the aggregates.
    ///
    /// Only completed sessions raise `levels_completed`; only completed
    /// challenges touch `gesture_stats`.
    pub fn update_with(&mut self, session: &Session, now: DateTime<Utc>) {
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.total_score = self.total_score.saturating_add(u64::from(session.score()));
        self.best_score = self.best_score.max(session.score());
        self.total_play_time += session.duration_at(now);
        self.last_played_date = Some(now);

        if session.is_completed() {
            self.levels_completed = self.levels_completed.max(session.level);
        }

        for challenge in &session.challenges {
            if let (Some(time), Some(accuracy)) = (challenge.completion_time(), challenge.accuracy())
            {
                self.gesture_stats
                    .entry(challenge.gesture)
                    .or_default()
                    .record(time, accuracy);
            }
        }

        self.average_accuracy = if self.gesture_stats.is_empty() {
            0.0
        } else {
            let sum: f64 = self
                .gesture_stats
                .values()
                .map(|stats| stats.average_accuracy)
                .sum();
            sum / usize_to_f64(self.gesture_stats.len())
        };
    }

    /// Mean score per session; 0 before the first session.
    #[must_use]
    pub fn average_score(&self) -> f64 {
        if self.total_sessions == 0 {
            return 0.0;
        }
        u64_to_f64(self.total_score) / f64::from(self.total_sessions)
    }

    #[must_use]
    pub fn gesture(&self, gesture: GestureType) -> Option<&GestureStats> {
        self.gesture_stats.get(&gesture)
    }
}

mod best_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(best_time: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        best_time
            .is_finite()
            .then_some(*best_time)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::INFINITY))
    }
}
