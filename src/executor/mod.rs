//! Test execution engine
//!
//! Provides sequential and parallel test execution capabilities.

mod parallel;
mod runner;

pub use parallel::{AggregateResult, ParallelExecutor};
pub use runner::TestRunner;
