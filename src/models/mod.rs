//! Data models for the ServeRest suite
//!
//! Resource records sent to the service and the reporting types produced
//! by the runner.

mod test_result;
mod user;

pub use test_result::{Suite, TestCase, TestResult, TestRoundSummary, TestStatus};
pub use user::{Login, User};
