//! Test execution runner
//!
//! Runs catalogued cases one after another. Each case gets a fresh
//! [`TestContext`]; its fixtures are drained once the body finishes,
//! whether it passed, failed, errored or panicked.

use anyhow::Result;
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

use crate::assertions::AssertionFailure;
use crate::config::SuiteConfig;
use crate::fixtures::TrackerState;
use crate::http::HttpClient;
use crate::models::{TestResult, TestRoundSummary};
use crate::suites::{Case, TestContext};
use crate::utils::Timer;

/// Sequential runner bound to one target service
#[derive(Clone)]
pub struct TestRunner {
    config: SuiteConfig,
    client: HttpClient,
}

impl TestRunner {
    /// Create a new test runner
    pub fn new(config: SuiteConfig) -> Result<Self> {
        let client = HttpClient::from_config(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Base URL every case talks to
    pub fn target(&self) -> &str {
        self.client.base_url()
    }

    /// Run a single test case
    pub async fn run_test(&self, case: &Case) -> TestResult {
        let test_case = case.info;

        if self.config.is_skipped(test_case.name) {
            return TestResult::skip(test_case, "Skipped by configuration");
        }

        info!("Running {}", test_case);

        let mut ctx = TestContext::new(self.client.clone());
        let timer = Timer::start(test_case.name);
        let outcome = AssertUnwindSafe((case.run)(&mut ctx)).catch_unwind().await;
        let duration_ms = timer.stop();

        if ctx.fixtures.state() == TrackerState::Tracking {
            debug!(
                "{}: removing {} fixture(s): {}",
                test_case,
                ctx.fixtures.len(),
                ctx.fixtures.ids().join(", ")
            );
        }
        let cleanup = ctx.cleanup().await;
        if cleanup.failed > 0 {
            warn!(
                "{}: {} of {} fixture deletes failed",
                test_case, cleanup.failed, cleanup.attempted
            );
        }

        let result = match outcome {
            Ok(Ok(())) => TestResult::pass(test_case, duration_ms),
            Ok(Err(e)) if is_assertion_failure(&e) => {
                TestResult::fail(test_case, duration_ms, format!("{e:#}"))
            }
            Ok(Err(e)) => {
                error!("Test {} failed with error: {:#}", test_case, e);
                TestResult::error(test_case, duration_ms, format!("{e:#}"))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Test {} panicked: {}", test_case, message);
                TestResult::error(test_case, duration_ms, format!("panicked: {message}"))
            }
        };

        result.with_details(json!({
            "notes": ctx.notes(),
            "cleanup": cleanup,
        }))
    }

    /// Run cases in order
    pub async fn run_cases(&self, cases: &[Case]) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let result = self.run_test(case).await;
            info!("  {}", result);
            results.push(result);
        }
        results
    }

    /// Run the same cases several times
    pub async fn run_rounds(&self, cases: &[Case], num_rounds: u32) -> Vec<TestRoundSummary> {
        info!("Running {} rounds against {}", num_rounds, self.target());

        let mut summaries = Vec::new();

        for round in 1..=num_rounds {
            info!("=== Round {}/{} ===", round, num_rounds);

            let timer = Timer::start(format!("round {round}"));
            let results = self.run_cases(cases).await;
            let summary = TestRoundSummary::new(round, self.target(), results);

            info!(
                "Round {} completed in {}ms: {}/{} passed ({:.1}%)",
                round,
                timer.stop(),
                summary.passed,
                summary.total,
                summary.pass_rate()
            );

            summaries.push(summary);
        }

        summaries
    }
}

/// An assertion mismatch anywhere in the error chain
fn is_assertion_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<AssertionFailure>())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
