//! Per-case execution context
//!
//! Holds the services a case talks to, the fixture tracker that owns the
//! ids the case creates, and the notes attached to its result.

use anyhow::{Context, Result};

use crate::assertions::assert_created;
use crate::data::DataFactory;
use crate::fixtures::{CleanupReport, FixtureTracker};
use crate::http::{HttpClient, HttpResponse};
use crate::models::User;
use crate::service::{LoginService, UserService};

pub struct TestContext {
    pub users: UserService,
    pub login: LoginService,
    pub fixtures: FixtureTracker,
    notes: Vec<String>,
}

impl TestContext {
    pub fn new(client: HttpClient) -> Self {
        Self {
            users: UserService::new(client.clone()),
            login: LoginService::new(client),
            fixtures: FixtureTracker::new(),
            notes: Vec::new(),
        }
    }

    /// Attach a line to the case result
    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Register the `_id` of a creation response, if it has one
    pub fn track(&mut self, response: &HttpResponse) -> Option<String> {
        let id = response.id().map(String::from);
        self.fixtures.register(id.as_deref());
        id
    }

    /// Create a valid user, tracked for cleanup
    pub async fn create_user(&mut self, admin: bool) -> Result<(User, String)> {
        let user = DataFactory::valid_user(admin);
        let id = self.create_valid_user(&user).await?;
        Ok((user, id))
    }

    /// Create `user`, which must be accepted, and return its id
    pub async fn create_valid_user(&mut self, user: &User) -> Result<String> {
        let response = self.users.create_user(user).await?;
        let id = self.track(&response);
        assert_created(&response).context("Fixture user was not created")?;
        id.context("Creation response carried no _id")
    }

    /// Create `user` and track the id when the service accepted it
    pub async fn create_custom_user(&mut self, user: &User) -> Result<HttpResponse> {
        let response = self.users.create_user(user).await?;
        if let Some(id) = self.track(&response) {
            self.note(format!("Created user {id}"));
        }
        Ok(response)
    }

    /// Delete every tracked fixture
    pub async fn cleanup(&mut self) -> CleanupReport {
        self.fixtures.drain_and_cleanup(&self.users).await
    }
}
