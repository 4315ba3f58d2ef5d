use casualty_sim::Mechanism;
use casualty_sim::numbers::usize_to_f64;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{SimulationPlan, TestScenario};
use super::simulation::{RunSummary, run_case};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub mechanism: Mechanism,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub deaths: usize,
    /// Mean seconds survived across iterations; survivors count as the run length.
    pub mean_survival_s: f64,
    pub mean_score: f64,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct LogicTester {
    verbose: bool,
    ticks: u32,
}

impl LogicTester {
    pub const fn new(verbose: bool, ticks: u32) -> Self {
        Self { verbose, ticks }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        mechanisms: &[Mechanism],
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &mechanism in mechanisms {
            for &seed in seeds {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (mechanism: {} seed: {})",
                        scenario.name.bright_white(),
                        mechanism,
                        seed
                    );
                }
                results.push(self.run_single_scenario(scenario, mechanism, seed, iterations));
            }
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        mechanism: Mechanism,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut deaths = 0;
        let mut survival_total = 0.0;
        let mut score_total = 0.0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match run_case(&scenario.plan, mechanism, iteration_seed, self.ticks) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!("Iteration {} (seed {iteration_seed}): {err}", i + 1));
                    continue;
                }
            };
            performance_data.push(start_time.elapsed());
            if summary.died_at_s.is_some() {
                deaths += 1;
            }
            survival_total += f64::from(summary.survival_s().min(self.ticks));
            score_total += f64::from(summary.score);

            if let Some(err) = evaluate_expectations(&scenario.plan, &summary) {
                failures.push(format!(
                    "Iteration {} ({mechanism}, seed {}, {}): {err}",
                    i + 1,
                    summary.seed,
                    describe_outcome(&summary)
                ));
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({:?}) {}",
                        i + 1,
                        iterations,
                        start_time.elapsed(),
                        describe_outcome(&summary)
                    );
                }
            }
        }

        let runs = usize_to_f64(performance_data.len().max(1));
        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            mechanism,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            deaths,
            mean_survival_s: survival_total / runs,
            mean_score: score_total / runs,
            failures,
            average_duration,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &RunSummary) -> Option<String> {
    plan.expectations
        .iter()
        .find_map(|expectation| expectation(summary).err())
}

fn describe_outcome(summary: &RunSummary) -> String {
    let vitals = &summary.final_vitals;
    let status = match (summary.died_at_s, summary.cause) {
        (Some(at), Some(cause)) => format!("died {at}s ({cause})"),
        _ => "alive".to_string(),
    };
    format!(
        "{status} | score {} | actions {} | HR {:.0} MAP {:.0} SpO2 {:.0} GCS {:.0}",
        summary.score,
        summary.interventions_applied,
        vitals.heart_rate,
        vitals.map,
        vitals.spo2,
        vitals.gcs
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;

    #[test]
    fn results_cover_every_mechanism_and_seed() {
        let tester = LogicTester::new(false, 60);
        let scenario = get_scenario("fuzz").unwrap();
        let results =
            tester.run_scenario(&scenario, &[Mechanism::Blast, Mechanism::Mvc], &[1, 2], 2);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|result| result.passed));
        assert!(results.iter().all(|result| result.iterations_run == 2));
    }

    #[test]
    fn short_untreated_runs_do_not_demand_death() {
        let tester = LogicTester::new(false, 120);
        let scenario = get_scenario("untreated").unwrap();
        let results = tester.run_scenario(&scenario, &[Mechanism::GswChest], &[4], 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
        assert_eq!(results[0].deaths, 0);
        assert!((results[0].mean_survival_s - 120.0).abs() < f64::EPSILON);
    }
}
