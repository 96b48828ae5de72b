//! Output formatters for test results
//!
//! Provides JSON, CSV, table, and summary output formats.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::executor::AggregateResult;
use crate::models::{TestResult, TestRoundSummary, TestStatus};

const CSV_HEADER: [&str; 7] = ["round", "suite", "test_name", "title", "status", "duration_ms", "message"];

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_default()
    }

    fn status_label(&self, status: TestStatus) -> &'static str {
        if self.colorize {
            match status {
                TestStatus::Pass => "\x1b[32m✓ PASS\x1b[0m",
                TestStatus::Fail => "\x1b[31m✗ FAIL\x1b[0m",
                TestStatus::Skip => "\x1b[33m○ SKIP\x1b[0m",
                TestStatus::Error => "\x1b[31m! ERROR\x1b[0m",
            }
        } else {
            match status {
                TestStatus::Pass => "✓ PASS",
                TestStatus::Fail => "✗ FAIL",
                TestStatus::Skip => "○ SKIP",
                TestStatus::Error => "! ERROR",
            }
        }
    }

    fn format_result_table(&self, result: &TestResult) -> String {
        format!(
            "{:9} {:40} {} [{:>6}ms]",
            result.test_case.suite.name(),
            result.test_case.name,
            self.status_label(result.status),
            result.duration_ms
        )
    }

    fn format_result_summary(&self, result: &TestResult) -> String {
        format!(
            "{} {} ({}ms)",
            result.status.symbol(),
            result.test_case.title,
            result.duration_ms
        )
    }

    /// Format test round summary
    pub fn format_summary(&self, summary: &TestRoundSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json | OutputFormat::JsonPretty => self.to_json(summary),
            OutputFormat::Csv => csv_rows(summary.round, &summary.results, true),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &TestRoundSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║  Round {:3} - {:54} ║\n",
            summary.round, summary.target
        ));
        output.push_str("╠══════════════════════════════════════════════════════════════════════╣\n");

        for result in &summary.results {
            output.push_str(&format!("║  {}\n", self.format_result_table(result)));
            if result.status.is_failure() {
                if let Some(message) = &result.message {
                    for line in message.lines() {
                        output.push_str(&format!("║      {line}\n"));
                    }
                }
            }
        }

        output.push_str("╠══════════════════════════════════════════════════════════════════════╣\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed)
        } else {
            summary.passed.to_string()
        };
        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.failed)
        } else {
            summary.failed.to_string()
        };

        output.push_str(&format!(
            "║  Total: {:2} | Pass: {} | Fail: {} | Skip: {:2} | Error: {:2}\n",
            summary.total, pass_str, fail_str, summary.skipped, summary.errors
        ));
        output.push_str(&format!(
            "║  Pass Rate: {:5.1}% | Duration: {:6}ms\n",
            summary.pass_rate(),
            summary.total_duration_ms
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════════════╝\n");

        output
    }

    /// One headline, then one line per failed or errored case
    fn format_summary_brief(&self, summary: &TestRoundSummary) -> String {
        let mut output = format!(
            "{} - Round {}: {}/{} passed ({:.1}%) in {}ms",
            summary.target,
            summary.round,
            summary.passed,
            summary.total,
            summary.pass_rate(),
            summary.total_duration_ms
        );
        for result in summary.results.iter().filter(|r| r.status.is_failure()) {
            output.push_str("\n  ");
            output.push_str(&self.format_result_summary(result));
        }
        output
    }

    /// Format aggregate results
    pub fn format_aggregate(&self, aggregate: &AggregateResult, target: &str) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct AggregateJson<'a> {
                    target: &'a str,
                    total_rounds: u32,
                    overall_pass_rate: f64,
                    test_pass_rates: &'a HashMap<&'static str, f64>,
                }

                self.to_json(&AggregateJson {
                    target,
                    total_rounds: aggregate.total_rounds,
                    overall_pass_rate: aggregate.overall_pass_rate,
                    test_pass_rates: &aggregate.test_pass_rates,
                })
            }
            _ => self.format_aggregate_table(aggregate, target),
        }
    }

    fn format_aggregate_table(&self, aggregate: &AggregateResult, target: &str) -> String {
        let mut output = String::new();

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " Aggregate Results: {} ({} rounds)\n",
            target, aggregate.total_rounds
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        output.push_str(&format!(
            " Overall Pass Rate: {:.1}%\n\n",
            aggregate.overall_pass_rate
        ));

        output.push_str(" Test Pass Rates:\n");
        output.push_str(" ───────────────────────────────────────────────────────────\n");

        let mut tests: Vec<_> = aggregate.test_pass_rates.iter().collect();
        tests.sort_by_key(|(name, _)| **name);

        for (name, rate) in tests {
            let bar_len = ((*rate / 5.0) as usize).min(20);
            let bar = "█".repeat(bar_len);
            let empty = "░".repeat(20 - bar_len);

            let rate_str = if self.colorize {
                if *rate >= 90.0 {
                    format!("\x1b[32m{rate:5.1}%\x1b[0m")
                } else if *rate >= 50.0 {
                    format!("\x1b[33m{rate:5.1}%\x1b[0m")
                } else {
                    format!("\x1b[31m{rate:5.1}%\x1b[0m")
                }
            } else {
                format!("{rate:5.1}%")
            };

            let avg_ms = aggregate
                .test_stats
                .get(*name)
                .map(|stats| stats.avg_duration_ms())
                .unwrap_or_default();
            output.push_str(&format!(" {name:40} {bar}{empty} {rate_str} {avg_ms:>6}ms\n"));
        }

        output.push_str(" ───────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            " Stable: {}/{} cases passed every round\n",
            aggregate.stable_tests().len(),
            aggregate.test_pass_rates.len()
        ));

        let flaky = aggregate.flaky_tests();
        if !flaky.is_empty() {
            output.push_str("\n Flaky Tests (< 100% pass rate):\n");
            for (name, rate) in flaky.iter().take(5) {
                output.push_str(&format!("   - {name} ({rate:.1}%)\n"));
            }
        }

        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Render results as CSV rows
fn csv_rows(round: u32, results: &[TestResult], header: bool) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut write = || -> csv::Result<()> {
        if header {
            writer.write_record(CSV_HEADER)?;
        }
        for result in results {
            writer.write_record([
                round.to_string(),
                result.test_case.suite.id().to_string(),
                result.test_case.name.to_string(),
                result.test_case.title.to_string(),
                result.status.to_string(),
                result.duration_ms.to_string(),
                result.message.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    };

    if write().is_err() {
        return String::new();
    }

    writer
        .into_inner()
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Write every round to a file
pub fn write_results_to_file(
    path: impl AsRef<Path>,
    summaries: &[TestRoundSummary],
    format: OutputFormat,
) -> Result<()> {
    let path = path.as_ref();
    let formatter = ResultFormatter::new(format).no_color();

    let content = match format {
        OutputFormat::Json | OutputFormat::JsonPretty => formatter.to_json(&summaries),
        OutputFormat::Csv => summaries
            .iter()
            .enumerate()
            .map(|(i, s)| csv_rows(s.round, &s.results, i == 0))
            .collect(),
        _ => summaries
            .iter()
            .map(|s| formatter.format_summary(s))
            .collect::<Vec<_>>()
            .join("\n"),
    };

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create results file: {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Suite, TestCase};
    use tempfile::tempdir;

    const CREATE: TestCase = TestCase::new(Suite::Users, "create_user", "Create a new user");
    const LOGIN: TestCase = TestCase::new(Suite::Login, "login_success", "Log in");

    fn summary() -> TestRoundSummary {
        TestRoundSummary::new(
            1,
            "http://localhost:3000",
            vec![
                TestResult::pass(CREATE, 100),
                TestResult::fail(LOGIN, 40, "Expected status 200 but was 401, \"quoted\""),
            ],
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_formatter_creation() {
        let formatter = ResultFormatter::new(OutputFormat::Json).no_color();
        assert_eq!(formatter.format, OutputFormat::Json);
        assert!(!formatter.colorize);
    }

    #[test]
    fn test_brief_summary_lists_failures() {
        let output = ResultFormatter::new(OutputFormat::Summary).format_summary(&summary());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("http://localhost:3000 - Round 1: 1/2 passed (50.0%)"));
        assert_eq!(lines[1], "  ✗ Log in (40ms)");
    }

    #[test]
    fn test_table_shows_failure_message() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_summary(&summary());
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("Expected status 200 but was 401"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_csv_escapes_fields() {
        let output = ResultFormatter::new(OutputFormat::Csv).format_summary(&summary());
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("round,suite,test_name,title,status,duration_ms,message")
        );
        assert_eq!(lines.next(), Some("1,users,create_user,Create a new user,PASS,100,"));
        assert_eq!(
            lines.next(),
            Some(r#"1,login,login_success,Log in,FAIL,40,"Expected status 200 but was 401, ""quoted""""#)
        );
    }

    #[test]
    fn test_json_summary() {
        let output = ResultFormatter::new(OutputFormat::Json).format_summary(&summary());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["passed"], 1);
        assert_eq!(value["results"][1]["status"], "fail");
    }

    #[test]
    fn test_write_results_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_results_to_file(&path, &[summary(), summary()], OutputFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_aggregate_table() {
        let rounds = vec![
            summary(),
            TestRoundSummary::new(
                2,
                "http://localhost:3000",
                vec![TestResult::pass(CREATE, 300), TestResult::pass(LOGIN, 60)],
            ),
        ];
        let aggregate = AggregateResult::from_rounds(&rounds);

        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_aggregate(&aggregate, "http://localhost:3000");
        assert!(output.contains("(2 rounds)"));
        assert!(output.contains("Stable: 1/2 cases passed every round"));
        assert!(output.contains("   200ms"));
        assert!(output.contains("   - login_success (50.0%)"));
    }
}
