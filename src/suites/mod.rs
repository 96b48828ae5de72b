//! ServeRest test-case catalogue
//!
//! Every case is an async function over a [`TestContext`]. The runner
//! gives each case a fresh context and drains its fixtures afterwards.
//!
//! ## Suites
//!
//! ### Users
//! - CRUD on `/usuarios`
//! - Field validation and search filters
//! - Hostile input (long fields, SQL injection, XSS)
//!
//! ### Login
//! - Successful login and credential/validation failures
//!
//! ### Contract
//! - Shape and types of every response body
//!
//! ### Security
//! - Token format and Authorization header handling

mod context;
mod contract;
mod login;
mod security;
mod users;

pub use context::TestContext;

use anyhow::Result;
use futures::future::BoxFuture;

use crate::models::{Suite, TestCase};

/// Entry point of one case
pub type CaseFn = for<'a> fn(&'a mut TestContext) -> BoxFuture<'a, Result<()>>;

/// A runnable catalogue entry
#[derive(Clone, Copy)]
pub struct Case {
    pub info: TestCase,
    pub run: CaseFn,
}

impl std::fmt::Debug for Case {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case").field("info", &self.info).finish()
    }
}

/// Build a [`Case`] from an async fn taking `&mut TestContext`
macro_rules! case {
    ($suite:expr, $func:ident, $title:literal) => {{
        fn run(ctx: &mut $crate::suites::TestContext) -> ::futures::future::BoxFuture<'_, ::anyhow::Result<()>> {
            ::futures::FutureExt::boxed($func(ctx))
        }
        $crate::suites::Case {
            info: $crate::models::TestCase::new($suite, stringify!($func), $title),
            run,
        }
    }};
}
pub(crate) use case;

/// Every case, suite by suite
pub fn all_cases() -> Vec<Case> {
    Suite::all().into_iter().flat_map(cases_for).collect()
}

/// Cases of one suite in catalogue order
pub fn cases_for(suite: Suite) -> Vec<Case> {
    match suite {
        Suite::Users => users::cases(),
        Suite::Login => login::cases(),
        Suite::Contract => contract::cases(),
        Suite::Security => security::cases(),
    }
}

/// Look up a case by its identifier
pub fn find_case(name: &str) -> Option<Case> {
    all_cases().into_iter().find(|c| c.info.name == name)
}
