//! Fixture tracker
//!
//! Records the identifiers a test case creates and deletes them once the
//! case is over. Deletes are best effort: a failing delete is logged and
//! the remaining identifiers are still processed.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::http::HttpResponse;

/// Issues the delete call for one fixture
#[async_trait]
pub trait FixtureCleaner: Send + Sync {
    async fn remove(&self, id: &str) -> Result<HttpResponse>;
}

/// Tracker lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Empty,
    Tracking,
    Draining,
}

/// Outcome of one drain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub attempted: usize,
    pub failed: usize,
}

/// Per-case registry of created identifiers
#[derive(Debug)]
pub struct FixtureTracker {
    ids: Vec<String>,
    state: TrackerState,
}

impl Default for FixtureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureTracker {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            state: TrackerState::Empty,
        }
    }

    /// Track an identifier for deletion.
    ///
    /// Missing or blank ids are ignored and `false` is returned.
    pub fn register<S: AsRef<str>>(&mut self, id: Option<S>) -> bool {
        let Some(id) = id else {
            return false;
        };
        let id = id.as_ref().trim();
        if id.is_empty() {
            return false;
        }

        debug!("Tracking fixture {id}");
        self.ids.push(id.to_string());
        self.state = TrackerState::Tracking;
        true
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Tracked identifiers in registration order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Delete every tracked id once, in registration order, then reset.
    ///
    /// Never fails. A non-2xx status or a transport error counts as a
    /// failed delete. An id leaves the registry only once its delete call
    /// has returned, so a drain that is dropped midway keeps the rest.
    pub async fn drain_and_cleanup<C>(&mut self, cleaner: &C) -> CleanupReport
    where
        C: FixtureCleaner + ?Sized,
    {
        let mut report = CleanupReport::default();
        if self.is_empty() {
            self.state = TrackerState::Empty;
            return report;
        }

        self.state = TrackerState::Draining;

        while let Some(id) = self.ids.first().cloned() {
            report.attempted += 1;
            match cleaner.remove(&id).await {
                Ok(response) if response.is_success() => {
                    debug!("Removed fixture {id}");
                }
                Ok(response) => {
                    report.failed += 1;
                    warn!(
                        "Cleanup of {id} returned status {}: {}",
                        response.status_code,
                        response.message().unwrap_or(response.text())
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("Cleanup of {id} failed: {e:#}");
                }
            }
            self.ids.remove(0);
        }

        self.state = TrackerState::Empty;
        report
    }
}

impl Drop for FixtureTracker {
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }
        let when = match self.state {
            TrackerState::Draining => "interrupted during cleanup",
            _ => "dropped",
        };
        warn!(
            "Fixture tracker {when} with {} undeleted id(s): {}",
            self.ids.len(),
            self.ids.join(", ")
        );
    }
}
