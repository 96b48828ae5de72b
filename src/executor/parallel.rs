//! Parallel test execution
//!
//! Runs suites concurrently. Cases inside a suite stay sequential and each
//! keeps its own fixture tracker, so no state is shared between tasks.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::runner::TestRunner;
use crate::models::{Suite, TestResult, TestRoundSummary, TestStatus};
use crate::suites::Case;
use crate::utils::Timer;

/// Parallel test executor
pub struct ParallelExecutor {
    max_concurrent: usize,
}

impl ParallelExecutor {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `cases` grouped by suite, one task per suite.
    ///
    /// Results keep catalogue order.
    pub async fn run_tests_parallel(&self, runner: &TestRunner, cases: &[Case]) -> Vec<TestResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::new();

        for (suite, group) in group_by_suite(cases) {
            let semaphore = semaphore.clone();
            let runner = runner.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await.ok();

                debug!("Starting parallel execution of {} suite", suite);
                runner.run_cases(&group).await
            });

            handles.push((suite, handle));
        }

        let mut results = Vec::new();
        let (suites, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for (suite, joined) in suites.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(suite_results) => results.extend(suite_results),
                Err(e) => error!("{} suite task failed: {}", suite, e),
            }
        }

        let order: HashMap<&str, usize> = cases
            .iter()
            .enumerate()
            .map(|(i, c)| (c.info.name, i))
            .collect();
        results.sort_by_key(|r| order.get(r.test_case.name).copied().unwrap_or(usize::MAX));
        results
    }

    /// Run several rounds, each with suites in parallel
    pub async fn run_rounds(
        &self,
        runner: &TestRunner,
        cases: &[Case],
        rounds: u32,
    ) -> Vec<TestRoundSummary> {
        let mut summaries = Vec::new();

        for round in 1..=rounds {
            info!("=== Round {}/{} ===", round, rounds);

            let timer = Timer::start(format!("parallel round {round}"));
            let results = self.run_tests_parallel(runner, cases).await;
            let summary = TestRoundSummary::new(round, runner.target(), results);

            info!(
                "Round {} completed in {}ms (max {} concurrent): {}/{} passed ({:.1}%)",
                round,
                timer.stop(),
                self.max_concurrent(),
                summary.passed,
                summary.total,
                summary.pass_rate()
            );

            summaries.push(summary);
        }

        summaries
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Split cases by suite, preserving first-seen suite order
fn group_by_suite(cases: &[Case]) -> Vec<(Suite, Vec<Case>)> {
    let mut groups: Vec<(Suite, Vec<Case>)> = Vec::new();
    for case in cases {
        match groups.iter_mut().find(|(suite, _)| *suite == case.info.suite) {
            Some((_, group)) => group.push(*case),
            None => groups.push((case.info.suite, vec![*case])),
        }
    }
    groups
}

/// Statistics for a single test case across rounds
#[derive(Clone, Debug, Default)]
pub struct TestStats {
    pub passes: u32,
    pub failures: u32,
    pub skips: u32,
    pub errors: u32,
    pub total_duration_ms: u64,
}

impl TestStats {
    pub fn avg_duration_ms(&self) -> u64 {
        let total = self.passes + self.failures + self.errors;
        if total > 0 {
            self.total_duration_ms / total as u64
        } else {
            0
        }
    }
}

/// Aggregate results across multiple test rounds
#[derive(Clone, Debug)]
pub struct AggregateResult {
    pub total_rounds: u32,
    pub test_stats: HashMap<&'static str, TestStats>,
    pub test_pass_rates: HashMap<&'static str, f64>,
    pub overall_pass_rate: f64,
}

impl AggregateResult {
    pub fn from_rounds(summaries: &[TestRoundSummary]) -> Self {
        let mut test_stats: HashMap<&'static str, TestStats> = HashMap::new();

        for summary in summaries {
            for result in &summary.results {
                let stats = test_stats.entry(result.test_case.name).or_default();

                match result.status {
                    TestStatus::Pass => stats.passes += 1,
                    TestStatus::Fail => stats.failures += 1,
                    TestStatus::Skip => stats.skips += 1,
                    TestStatus::Error => stats.errors += 1,
                }
                stats.total_duration_ms += result.duration_ms;
            }
        }

        let test_pass_rates = test_stats
            .iter()
            .map(|(name, stats)| {
                let total = stats.passes + stats.failures + stats.errors;
                let rate = if total > 0 {
                    (stats.passes as f64 / total as f64) * 100.0
                } else {
                    0.0
                };
                (*name, rate)
            })
            .collect();

        let overall_pass_rate = if summaries.is_empty() {
            0.0
        } else {
            summaries.iter().map(|s| s.pass_rate()).sum::<f64>() / summaries.len() as f64
        };

        Self {
            total_rounds: summaries.len() as u32,
            test_stats,
            test_pass_rates,
            overall_pass_rate,
        }
    }

    /// Cases that passed in some rounds but not all, lowest pass rate first
    pub fn flaky_tests(&self) -> Vec<(&'static str, f64)> {
        let mut tests: Vec<_> = self
            .test_pass_rates
            .iter()
            .filter(|(_, rate)| **rate > 0.0 && **rate < 100.0)
            .map(|(name, rate)| (*name, *rate))
            .collect();
        tests.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(b.0)));
        tests
    }

    /// Cases that passed in every round
    pub fn stable_tests(&self) -> Vec<&'static str> {
        let mut tests: Vec<_> = self
            .test_pass_rates
            .iter()
            .filter(|(_, rate)| **rate >= 100.0)
            .map(|(name, _)| *name)
            .collect();
        tests.sort_unstable();
        tests
    }
}
