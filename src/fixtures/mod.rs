//! Fixture lifecycle
//!
//! Every test case owns one [`FixtureTracker`]. The runner drains it after
//! the case body finishes, whatever the outcome.

mod tracker;

pub use tracker::{CleanupReport, FixtureCleaner, FixtureTracker, TrackerState};
