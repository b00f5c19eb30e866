use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use gesture_game::{FileStorage, GameConfig, MemoryStorage};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::logic::scenarios::{SimulationPlan, TestScenario};
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{SimulationSession, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_key: String,
    pub scenario_name: String,
    pub seed: u64,
    pub policy: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Mean per-session score across passing iterations.
    pub mean_score: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    game_config: GameConfig,
    data_dir: Option<PathBuf>,
}

impl LogicTester {
    #[must_use]
    pub const fn new(verbose: bool, game_config: GameConfig) -> Self {
        Self {
            verbose,
            game_config,
            data_dir: None,
        }
    }

    /// Persist each iteration to JSON files under `dir` instead of memory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (policy: {} seed: {})",
                        scenario.name.bright_white(),
                        scenario.plan.policy,
                        seed.display_name()
                    );
                }
                self.run_single_scenario(scenario, seed.seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut scores = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = self
                .run_plan(scenario, iteration_seed, i)
                .and_then(|summary| match scenario.plan.evaluate(&summary) {
                    Some(err) => Err(anyhow::anyhow!(
                        "{err} | {}",
                        summarize_sessions(&summary)
                    )),
                    None => Ok(summary),
                });

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    scores.push(mean_session_score(&summary));
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) sessions:{} total score:{}",
                            i + 1,
                            iterations,
                            summary.sessions.len(),
                            summary.total_score()
                        );
                    }
                }
                Err(err) => {
                    let message = format!(
                        "Iteration {} (policy {}, seed {iteration_seed}): {err:#}",
                        i + 1,
                        scenario.plan.policy
                    );
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.clone().red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };
        let mean_score = if scores.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = scores.len() as f64;
            scores.iter().sum::<f64>() / count
        };

        ScenarioResult {
            scenario_key: scenario.key.to_string(),
            scenario_name: scenario.name.to_string(),
            seed,
            policy: scenario.plan.policy.label().to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            mean_score,
            average_duration,
            performance_data,
        }
    }

    fn run_plan(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iteration: usize,
    ) -> Result<SimulationSummary> {
        let plan: &SimulationPlan = &scenario.plan;
        let config = plan.simulation_config(seed);
        let start = Utc::now();
        match &self.data_dir {
            Some(root) => {
                let dir = root
                    .join(scenario.key)
                    .join(format!("seed-{seed}-iter-{iteration}"));
                let storage = fresh_file_storage(&dir)?;
                info!("persisting {} to {}", scenario.key, dir.display());
                SimulationSession::new(storage, self.game_config.clone(), config, start).run()
            }
            None => SimulationSession::new(
                MemoryStorage::new(),
                self.game_config.clone(),
                config,
                start,
            )
            .run(),
        }
    }
}

/// Open `dir` as storage after discarding whatever an earlier run left there.
fn fresh_file_storage(dir: &Path) -> Result<FileStorage> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("failed to clear {}", dir.display()))?;
    }
    FileStorage::open(dir).with_context(|| format!("failed to open storage at {}", dir.display()))
}

fn mean_session_score(summary: &SimulationSummary) -> f64 {
    if summary.sessions.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = summary.total_score() as f64 / summary.sessions.len() as f64;
    mean
}

fn summarize_sessions(summary: &SimulationSummary) -> String {
    if summary.sessions.is_empty() {
        return "no sessions played".to_string();
    }

    let tail = summary
        .sessions
        .iter()
        .rev()
        .take(3)
        .map(|record| {
            format!(
                "level {} score {} acc {:.2} timeouts {} ticks {} achievements {} next {}",
                record.level,
                record.score,
                record.accuracy,
                record.timeouts,
                record.ticks,
                record.achievements_after,
                record.recommended_after
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");
    format!(
        "{} player, seed {}, {} session(s): {tail}",
        summary.policy,
        summary.seed,
        summary.sessions.len()
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;

    #[test]
    fn smoke_scenario_passes_in_memory() {
        let tester = LogicTester::new(false, GameConfig::default());
        let scenario = get_scenario("smoke").unwrap();
        let results = tester.run_scenario(&scenario, &[SeedInfo::from_numeric(7)], 2);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.successful_iterations, 2);
        assert_eq!(result.performance_data.len(), 2);
        assert!(result.mean_score >= 600.0);
    }

    #[test]
    fn timeout_scenario_passes_on_disk() {
        let dir = std::env::temp_dir().join(format!(
            "gesture-tester-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let tester = LogicTester::new(false, GameConfig::default()).with_data_dir(&dir);
        let scenario = get_scenario("timeout").unwrap();
        let results = tester.run_scenario(&scenario, &[SeedInfo::from_numeric(3)], 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
        assert!(dir.join("timeout").join("seed-3-iter-0").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn failed_expectation_is_reported() {
        let tester = LogicTester::new(false, GameConfig::default());
        let mut scenario = get_scenario("smoke").unwrap();
        scenario.plan = scenario
            .plan
            .with_expectation(|_: &SimulationSummary| anyhow::bail!("forced failure"));
        let results = tester.run_scenario(&scenario, &[SeedInfo::from_numeric(1)], 1);
        assert!(!results[0].passed);
        assert!(results[0].failures[0].contains("forced failure"));
    }

    #[test]
    fn result_durations_serialize_as_millis() {
        let result = ScenarioResult {
            scenario_key: "smoke".into(),
            scenario_name: "Smoke".into(),
            seed: 1,
            policy: "Perfect".into(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            mean_score: 1710.0,
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
    }
}
