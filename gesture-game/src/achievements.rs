//! Achievement catalogue. Recomputed from `PlayerStats` on demand, never persisted.
use serde::Serialize;

use crate::stats::PlayerStats;

/// Stat an achievement threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gate {
    BestScore(u32),
    TotalSessions(u32),
    AverageAccuracy(f64),
    LevelsCompleted(u32),
}

impl Gate {
    fn passes(self, stats: &PlayerStats) -> bool {
        match self {
            Self::BestScore(min) => stats.best_score >= min,
            Self::TotalSessions(min) => stats.total_sessions >= min,
            Self::AverageAccuracy(min) => stats.average_accuracy >= min,
            Self::LevelsCompleted(min) => stats.levels_completed >= min,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    #[serde(skip)]
    gate: Gate,
}

impl Achievement {
    #[must_use]
    pub fn is_unlocked(&self, stats: &PlayerStats) -> bool {
        self.gate.passes(stats)
    }
}

const CATALOGUE: [Achievement; 7] = [
    Achievement {
        id: "score_master",
        title: "Score Master",
        description: "Achieved a score of 1000+",
        icon: "star.fill",
        gate: Gate::BestScore(1000),
    },
    Achievement {
        id: "gesture_legend",
        title: "Gesture Legend",
        description: "Achieved a score of 5000+",
        icon: "crown.fill",
        gate: Gate::BestScore(5000),
    },
    Achievement {
        id: "dedicated_player",
        title: "Dedicated Player",
        description: "Completed 10 game sessions",
        icon: "gamecontroller.fill",
        gate: Gate::TotalSessions(10),
    },
    Achievement {
        id: "gesture_enthusiast",
        title: "Gesture Enthusiast",
        description: "Completed 50 game sessions",
        icon: "hand.raised.fill",
        gate: Gate::TotalSessions(50),
    },
    Achievement {
        id: "precision_master",
        title: "Precision Master",
        description: "Maintained 90%+ accuracy",
        icon: "target",
        gate: Gate::AverageAccuracy(0.9),
    },
    Achievement {
        id: "level_explorer",
        title: "Level Explorer",
        description: "Completed 5 levels",
        icon: "map.fill",
        gate: Gate::LevelsCompleted(5),
    },
    Achievement {
        id: "challenge_conqueror",
        title: "Challenge Conqueror",
        description: "Completed 15 levels",
        icon: "mountain.2.fill",
        gate: Gate::LevelsCompleted(15),
    },
];

/// Every achievement in display order.
#[must_use]
pub fn all_achievements() -> &'static [Achievement] {
    &CATALOGUE
}

#[must_use]
pub fn unlocked_achievements(stats: &PlayerStats) -> Vec<&'static Achievement> {
    CATALOGUE
        .iter()
        .filter(|achievement| achievement.is_unlocked(stats))
        .collect()
}

#[must_use]
pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    CATALOGUE.iter().find(|achievement| achievement.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(stats: &PlayerStats) -> Vec<&'static str> {
        unlocked_achievements(stats)
            .into_iter()
            .map(|achievement| achievement.id)
            .collect()
    }

    #[test]
    fn fresh_player_has_nothing() {
        assert!(ids(&PlayerStats::default()).is_empty());
        assert_eq!(all_achievements().len(), 7);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let stats = PlayerStats {
            best_score: 1000,
            total_sessions: 10,
            average_accuracy: 0.9,
            levels_completed: 5,
            ..PlayerStats::default()
        };
        assert_eq!(
            ids(&stats),
            vec!["score_master", "dedicated_player", "precision_master", "level_explorer"]
        );
    }

    #[test]
    fn veteran_unlocks_everything_in_catalogue_order() {
        let stats = PlayerStats {
            best_score: 7200,
            total_sessions: 80,
            average_accuracy: 0.97,
            levels_completed: 20,
            ..PlayerStats::default()
        };
        let unlocked = ids(&stats);
        let catalogue: Vec<_> = all_achievements().iter().map(|a| a.id).collect();
        assert_eq!(unlocked, catalogue);
    }

    #[test]
    fn lookup_by_id() {
        let legend = find_achievement("gesture_legend").unwrap();
        assert_eq!(legend.icon, "crown.fill");
        assert!(!legend.is_unlocked(&PlayerStats {
            best_score: 4999,
            ..PlayerStats::default()
        }));
        assert!(find_achievement("nope").is_none());
    }

    #[test]
    fn serializes_without_internal_gate() {
        let json = serde_json::to_value(all_achievements()[4].clone()).unwrap();
        assert_eq!(json["title"], "Precision Master");
        assert!(json.get("gate").is_none());
    }
}
