use anyhow::{Result, ensure};
use std::sync::Arc;

use crate::logic::policy::PlayerPolicy;
use crate::logic::simulation::{SimulationConfig, SimulationSummary};

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn = Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// What to play and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub policy: PlayerPolicy,
    pub first_level: u32,
    pub sessions: u32,
    pub follow_recommendation: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(policy: PlayerPolicy) -> Self {
        Self {
            policy,
            first_level: 1,
            sessions: 1,
            follow_recommendation: false,
            expectations: Vec::new(),
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

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    #[must_use]
    pub const fn simulation_config(&self, seed: u64) -> SimulationConfig {
        let config =
            SimulationConfig::new(self.policy, seed).with_levels(self.first_level, self.sessions);
        if self.follow_recommendation {
            config.following_recommendation()
        } else {
            config
        }
    }

    /// First failing expectation, if any.
    #[must_use]
    pub fn evaluate(&self, summary: &SimulationSummary) -> Option<String> {
        self.expectations
            .iter()
            .find_map(|expectation| expectation.evaluate(summary).err())
            .map(|err| format!("{err:#}"))
    }
}

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

const CATALOG: [(&str, &str, &str); 5] = [
    ("smoke", "Smoke", "One flawless level-1 session"),
    (
        "perfect",
        "Perfect Climb",
        "Flawless player climbs levels 1-5 one at a time",
    ),
    (
        "sloppy",
        "Sloppy Player",
        "Player mixing in wrong gestures over levels 1-5",
    ),
    ("timeout", "Timeouts", "Idle player lets every challenge expire"),
    (
        "marathon",
        "Marathon",
        "Sixty slow sessions following the level recommendation",
    ),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|&(key, _, description)| (key, description))
        .collect()
}

#[must_use]
pub fn scenario_keys() -> Vec<&'static str> {
    CATALOG.iter().map(|&(key, _, _)| key).collect()
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let &(key, name, description) = CATALOG.iter().find(|(k, _, _)| *k == key)?;
    let plan = match key {
        "smoke" => smoke_plan(),
        "perfect" => perfect_plan(),
        "sloppy" => sloppy_plan(),
        "timeout" => timeout_plan(),
        "marathon" => marathon_plan(),
        _ => return None,
    };
    Some(TestScenario {
        key,
        name,
        description,
        plan: plan
            .with_expectation(core_invariants_expectation)
            .with_expectation(stats_fold_expectation),
    })
}

fn smoke_plan() -> SimulationPlan {
    SimulationPlan::new(PlayerPolicy::Perfect).with_expectation(|summary: &SimulationSummary| {
        let record = summary
            .sessions
            .first()
            .ok_or_else(|| anyhow::anyhow!("no session was played"))?;
        ensure!(record.completed, "smoke session did not complete");
        ensure!(record.challenges == 6, "level 1 should have 6 challenges");
        ensure!(record.score > 0, "smoke session scored nothing");
        ensure!(
            summary.final_stats.total_sessions == 1,
            "expected one recorded session, found {}",
            summary.final_stats.total_sessions
        );
        Ok(())
    })
}

fn perfect_plan() -> SimulationPlan {
    SimulationPlan::new(PlayerPolicy::Perfect)
        .with_levels(1, 5)
        .with_expectation(|summary: &SimulationSummary| {
            for record in &summary.sessions {
                ensure!(
                    record.timeouts == 0,
                    "level {} timed out {} times",
                    record.level,
                    record.timeouts
                );
                ensure!(
                    (record.accuracy - 1.0).abs() < f64::EPSILON,
                    "level {} accuracy {:.2}",
                    record.level,
                    record.accuracy
                );
            }
            ensure!(
                summary.final_stats.levels_completed == 5,
                "levels completed {}",
                summary.final_stats.levels_completed
            );
            ensure!(
                summary.achievements.contains(&"level_explorer"),
                "level explorer not unlocked"
            );
            ensure!(
                summary.achievements.contains(&"precision_master"),
                "precision master not unlocked"
            );
            Ok(())
        })
}

fn sloppy_plan() -> SimulationPlan {
    SimulationPlan::new(PlayerPolicy::Sloppy)
        .with_levels(1, 5)
        .with_expectation(|summary: &SimulationSummary| {
            let (correct, total) = summary.sessions.iter().fold((0u32, 0u32), |acc, r| {
                (acc.0 + r.correct_gestures, acc.1 + r.total_gestures)
            });
            ensure!(total > correct, "sloppy player never missed");
            ensure!(correct > 0, "sloppy player never hit");
            Ok(())
        })
}

fn timeout_plan() -> SimulationPlan {
    SimulationPlan::new(PlayerPolicy::Idle)
        .with_levels(3, 2)
        .with_expectation(|summary: &SimulationSummary| {
            for record in &summary.sessions {
                ensure!(
                    usize::try_from(record.timeouts).ok() == Some(record.challenges),
                    "level {}: {} timeouts for {} challenges",
                    record.level,
                    record.timeouts,
                    record.challenges
                );
                ensure!(record.total_gestures == 0, "idle player gestured");
                ensure!(
                    record.accuracy.abs() < f64::EPSILON,
                    "idle player accuracy {:.2}",
                    record.accuracy
                );
                ensure!(
                    record.recommended_after <= summary.final_stats.levels_completed.max(1),
                    "idle player was promoted to level {}",
                    record.recommended_after
                );
            }
            Ok(())
        })
}

fn marathon_plan() -> SimulationPlan {
    SimulationPlan::new(PlayerPolicy::Sluggish)
        .with_levels(1, 60)
        .following_recommendation()
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.final_stats.total_sessions == 60,
                "expected 60 sessions, found {}",
                summary.final_stats.total_sessions
            );
            ensure!(
                summary.recent_len == summary.recent_cap.min(60),
                "recent list holds {} sessions (cap {})",
                summary.recent_len,
                summary.recent_cap
            );
            ensure!(
                summary.sessions.iter().any(|record| record.timeouts > 0),
                "sluggish player never ran out of time"
            );
            ensure!(
                summary.achievements.contains(&"dedicated_player"),
                "dedicated player not unlocked"
            );
            Ok(())
        })
}

fn core_invariants_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.persist_failures == 0, "persisting failed");
    ensure!(
        summary.recent_len <= summary.recent_cap,
        "recent list exceeded its cap"
    );
    for record in &summary.sessions {
        ensure!(
            record.invariant_held,
            "level {}: completion flag diverged from challenge index",
            record.level
        );
        ensure!(
            record.completed && record.completed_challenges == record.challenges,
            "level {}: session ended with {}/{} challenges",
            record.level,
            record.completed_challenges,
            record.challenges
        );
        ensure!(
            record.points_observed == record.score,
            "level {}: outcomes summed to {} but score is {}",
            record.level,
            record.points_observed,
            record.score
        );
        let floor = u32::try_from(record.challenges)
            .unwrap_or(u32::MAX)
            .saturating_mul(100);
        ensure!(
            record.score >= floor,
            "level {}: score {} below difficulty floor {floor}",
            record.level,
            record.score
        );
    }
    Ok(())
}

/// Aggregates must agree with the sessions that were played.
fn stats_fold_expectation(summary: &SimulationSummary) -> Result<()> {
    let stats = &summary.final_stats;
    let played = u32::try_from(summary.sessions.len()).unwrap_or(u32::MAX);
    ensure!(
        stats.total_sessions == played,
        "recorded {} sessions but played {played}",
        stats.total_sessions
    );
    let best = summary.sessions.iter().map(|r| r.score).max().unwrap_or(0);
    ensure!(
        stats.best_score == best,
        "best score {} but highest session scored {best}",
        stats.best_score
    );
    ensure!(
        stats.total_score == summary.total_score(),
        "total score {} but sessions sum to {}",
        stats.total_score,
        summary.total_score()
    );
    let highest = summary
        .sessions
        .iter()
        .filter(|r| r.completed)
        .map(|r| r.level)
        .max()
        .unwrap_or(0);
    ensure!(
        stats.levels_completed == highest,
        "levels completed {} but highest finished level is {highest}",
        stats.levels_completed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_resolve() {
        for key in scenario_keys() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.key, key);
            assert!(scenario.plan.expectations.len() >= 3);
        }
        assert!(get_scenario("nope").is_none());
        assert_eq!(list_scenarios().len(), 5);
    }

    #[test]
    fn plan_carries_levels_into_config() {
        let plan = get_scenario("marathon").unwrap().plan;
        let config = plan.simulation_config(9);
        assert_eq!(config.sessions, 60);
        assert!(config.follow_recommendation);
        assert_eq!(config.seed, 9);
    }
}
