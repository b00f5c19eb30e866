//! Read-only analysis over sessions and statistics: level recommendation,
//! post-session feedback, per-challenge breakdowns and history views.
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::GameConfig;
use crate::constants::{
    ACCURACY_AVERAGE, ACCURACY_EXCELLENT, ACCURACY_GOOD, BEGINNER_LEVEL_CEILING,
    SPEED_FAST_SECS, SPEED_MODERATE_SECS,
};
use crate::gesture::GestureType;
use crate::numbers::{floor_f64_to_i64, usize_to_f64, usize_to_u32};
use crate::session::Session;
use crate::stats::PlayerStats;

const WEEK_DAYS: i64 = 7;

/// Level to suggest next, from recent accuracy and completed levels.
///
/// Averages session accuracy over the configured window of most recent
/// sessions (0 with no history). Always within `1..=max_level`.
#[must_use]
pub fn recommended_level(stats: &PlayerStats, recent: &[Session], config: &GameConfig) -> u32 {
    let window = &recent[..recent.len().min(config.recommendation_window)];
    let mean_accuracy = if window.is_empty() {
        0.0
    } else {
        window.iter().map(Session::accuracy).sum::<f64>() / usize_to_f64(window.len())
    };

    let completed = stats.levels_completed;
    let level = if mean_accuracy > config.promote_two_accuracy {
        completed.saturating_add(2)
    } else if mean_accuracy > config.promote_one_accuracy {
        completed.saturating_add(1)
    } else {
        completed.max(1)
    };
    level.clamp(1, config.max_level.max(1))
}

/// Ordinal accuracy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyRating {
    NeedsImprovement,
    Average,
    Good,
    Excellent,
}

impl AccuracyRating {
    #[must_use]
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= ACCURACY_EXCELLENT {
            Self::Excellent
        } else if accuracy >= ACCURACY_GOOD {
            Self::Good
        } else if accuracy >= ACCURACY_AVERAGE {
            Self::Average
        } else {
            Self::NeedsImprovement
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Excellent => "star.fill",
            Self::Good => "checkmark.circle.fill",
            Self::Average => "minus.circle.fill",
            Self::NeedsImprovement => "exclamationmark.triangle.fill",
        }
    }
}

impl fmt::Display for AccuracyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket for mean seconds spent per challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedRating {
    Fast,
    Moderate,
    Slow,
}

impl SpeedRating {
    #[must_use]
    pub fn from_mean_time(seconds: f64) -> Self {
        if seconds <= SPEED_FAST_SECS {
            Self::Fast
        } else if seconds <= SPEED_MODERATE_SECS {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast",
            Self::Moderate => "Moderate",
            Self::Slow => "Slow",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Fast => "bolt.fill",
            Self::Moderate => "gauge.medium",
            Self::Slow => "tortoise.fill",
        }
    }
}

impl fmt::Display for SpeedRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Post-session feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    pub is_personal_best: bool,
    /// Session score beat the whole-number mean score of prior sessions.
    pub score_improvement: bool,
    pub accuracy_rating: AccuracyRating,
    pub speed_rating: SpeedRating,
    pub recommendations: Vec<String>,
    pub next_recommended_level: u32,
}

/// Analyse `session` against `stats` and `recent`.
///
/// Call this before the session is folded into the stats, otherwise the
/// personal-best comparison is against the session itself.
#[must_use]
pub fn performance_analysis(
    session: &Session,
    stats: &PlayerStats,
    recent: &[Session],
    config: &GameConfig,
    now: DateTime<Utc>,
) -> PerformanceAnalysis {
    let score = session.score();
    let accuracy = session.accuracy();
    let mean_time = mean_time_per_challenge(session, now);
    let mean_score = floor_f64_to_i64(stats.average_score());

    PerformanceAnalysis {
        is_personal_best: score > stats.best_score,
        score_improvement: i64::from(score) > mean_score,
        accuracy_rating: AccuracyRating::from_accuracy(accuracy),
        speed_rating: SpeedRating::from_mean_time(mean_time),
        recommendations: recommendations(accuracy, mean_time, session.level),
        next_recommended_level: recommended_level(stats, recent, config),
    }
}

fn mean_time_per_challenge(session: &Session, now: DateTime<Utc>) -> f64 {
    if session.challenges.is_empty() {
        return 0.0;
    }
    session.duration_at(now) / usize_to_f64(session.challenges.len())
}

fn recommendations(accuracy: f64, mean_time: f64, level: u32) -> Vec<String> {
    let mut tips: Vec<&str> = Vec::new();
    if accuracy < ACCURACY_GOOD {
        tips.push("Focus on accuracy over speed");
        tips.push("Take time to identify the correct gesture");
    }
    if mean_time > SPEED_MODERATE_SECS {
        tips.push("Try to respond faster to challenges");
        tips.push("Practice gesture recognition");
    }
    if accuracy > ACCURACY_EXCELLENT && mean_time < SPEED_FAST_SECS {
        tips.push("Excellent performance! Try a higher level");
        tips.push("Challenge yourself with more complex gestures");
    }
    if level < BEGINNER_LEVEL_CEILING {
        tips.push("Keep practicing to unlock new gesture types");
    }
    if tips.is_empty() {
        tips.push("Great job! Keep up the good work");
        tips.push("Try different gesture combinations");
    }
    tips.into_iter().map(str::to_string).collect()
}

/// Per-challenge label, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceRating {
    Perfect,
    Excellent,
    Good,
    NeedsPractice,
    Incomplete,
}

impl PerformanceRating {
    /// Rate one completed challenge; `None` for the time/accuracy pair means incomplete.
    #[must_use]
    pub fn rate(completed: Option<(f64, f64)>, time_limit: f64) -> Self {
        let Some((time, accuracy)) = completed else {
            return Self::Incomplete;
        };
        if accuracy >= 1.0 && time <= time_limit * 0.5 {
            Self::Perfect
        } else if accuracy >= 0.8 && time <= time_limit * 0.7 {
            Self::Excellent
        } else if accuracy >= 0.6 {
            Self::Good
        } else {
            Self::NeedsPractice
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsPractice => "Needs Practice",
            Self::Incomplete => "Incomplete",
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResult {
    /// 1-based position in the session.
    pub challenge_number: u32,
    pub gesture: GestureType,
    pub is_completed: bool,
    /// 0 when incomplete.
    pub completion_time: f64,
    /// 0 when incomplete.
    pub accuracy: f64,
    pub time_limit: f64,
    pub target_count: u32,
    pub rating: PerformanceRating,
}

#[must_use]
pub fn challenge_breakdown(session: &Session) -> Vec<ChallengeResult> {
    session
        .challenges
        .iter()
        .enumerate()
        .map(|(index, challenge)| {
            let completed = challenge.completion_time().zip(challenge.accuracy());
            let (completion_time, accuracy) = completed.unwrap_or((0.0, 0.0));
            ChallengeResult {
                challenge_number: usize_to_u32(index + 1),
                gesture: challenge.gesture,
                is_completed: challenge.is_completed(),
                completion_time,
                accuracy,
                time_limit: challenge.time_limit,
                target_count: challenge.target_count,
                rating: PerformanceRating::rate(completed, challenge.time_limit),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub session_number: u32,
    pub score: u32,
    pub accuracy: f64,
    pub date: DateTime<Utc>,
}

/// Recent sessions in chronological order, numbered from 1.
#[must_use]
pub fn performance_trend(recent: &[Session]) -> Vec<PerformancePoint> {
    let mut ordered: Vec<&Session> = recent.iter().collect();
    ordered.sort_by_key(|session| session.start_time);
    ordered
        .into_iter()
        .enumerate()
        .map(|(index, session)| PerformancePoint {
            session_number: usize_to_u32(index + 1),
            score: session.score(),
            accuracy: session.accuracy(),
            date: session.start_time,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GesturePerformance {
    pub gesture: GestureType,
    pub accuracy: f64,
    pub average_time: f64,
    pub times_performed: u32,
}

/// Per-gesture aggregates, most accurate first. Ties keep declaration order.
#[must_use]
pub fn gesture_performance(stats: &PlayerStats) -> Vec<GesturePerformance> {
    let mut rows: Vec<GesturePerformance> = GestureType::ALL
        .iter()
        .filter_map(|&gesture| {
            stats.gesture(gesture).map(|entry| GesturePerformance {
                gesture,
                accuracy: entry.average_accuracy,
                average_time: entry.average_time,
                times_performed: entry.times_performed,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub sessions_played: u32,
    pub total_score: u64,
    pub total_play_time: f64,
}

/// Seven UTC-day buckets ending today, oldest first.
#[must_use]
pub fn weekly_progress(recent: &[Session], now: DateTime<Utc>) -> Vec<DailyProgress> {
    let today = now.date_naive();
    (0..WEEK_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - TimeDelta::days(days_ago);
            let mut bucket = DailyProgress {
                date,
                sessions_played: 0,
                total_score: 0,
                total_play_time: 0.0,
            };
            for session in recent
                .iter()
                .filter(|session| session.start_time.date_naive() == date)
            {
                bucket.sessions_played = bucket.sessions_played.saturating_add(1);
                bucket.total_score = bucket
                    .total_score
                    .saturating_add(u64::from(session.score()));
                bucket.total_play_time += session.duration_at(now);
            }
            bucket
        })
        .collect()
}

/// Levels up to one past the furthest completed level are playable.
#[must_use]
pub fn is_level_unlocked(stats: &PlayerStats, level: u32) -> bool {
    level <= stats.levels_completed.saturating_add(1).max(1)
}

/// Shareable plain-text summary of a session.
#[must_use]
pub fn share_text(session: &Session, now: DateTime<Utc>) -> String {
    let percent = floor_f64_to_i64(session.accuracy() * 100.0);
    format!(
        "Just completed a Gesture Quest challenge! 🎮\n\n\
         🎯 Score: {}\n\
         🎪 Accuracy: {percent}%\n\
         🏆 Level: {}\n\
         ⏱️ Time: {}\n\n\
         Can you beat my score? #GestureQuest",
        session.score(),
        session.level,
        format_duration(session.duration_at(now)),
    )
}

/// Whole seconds as `m:ss`; negative and non-finite input reads as zero.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let whole = if seconds.is_finite() {
        floor_f64_to_i64(seconds).max(0)
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}
