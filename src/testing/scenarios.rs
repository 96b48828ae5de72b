//! End-to-end runs against [`FakeServer`]

use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::net::TcpListener;

use super::{FakeServer, SEED_EMAIL, SEED_ID, SEED_PASSWORD};
use crate::assertions::{
    assert_bad_request, assert_created, assert_operation_ok, assert_status, check,
    MSG_CREATED, MSG_EMAIL_IN_USE, MSG_LOGIN_OK, MSG_NOTHING_DELETED,
};
use crate::config::SuiteConfig;
use crate::executor::{AggregateResult, ParallelExecutor, TestRunner};
use crate::fixtures::{CleanupReport, FixtureTracker, TrackerState};
use crate::models::{Login, Suite, TestStatus, User};
use crate::service::LoginService;
use crate::suites::{self, case, Case, TestContext};

const NONEXISTENT_ID: &str = "123456789012345678901234";

fn failures(results: &[crate::models::TestResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| r.status.is_failure())
        .map(|r| r.to_string())
        .collect()
}

#[tokio::test]
async fn test_create_login_and_cleanup() {
    let server = FakeServer::start().await;
    let mut ctx = TestContext::new(server.client());

    let user = User::new("Ana Silva", "ana@example.com", "abc12345", true);
    let response = ctx.create_custom_user(&user).await.unwrap();
    check(&response)
        .status(201)
        .unwrap()
        .str_eq("message", MSG_CREATED)
        .unwrap();
    let id = response.id().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(ctx.fixtures.ids().to_vec(), vec![id.clone()]);

    let response = ctx.login.login(&user.login()).await.unwrap();
    check(&response)
        .status(200)
        .unwrap()
        .str_eq("message", MSG_LOGIN_OK)
        .unwrap();
    let token = LoginService::bare_token(&response).unwrap();
    assert!(response.authorization().unwrap().starts_with("Bearer "));
    assert!(Regex::new(r"^[A-Za-z0-9\-_\.]+$").unwrap().is_match(token));
    assert_eq!(token.matches('.').count(), 2);

    let report = ctx.cleanup().await;
    assert_eq!(report, CleanupReport { attempted: 1, failed: 0 });
    assert_eq!(ctx.fixtures.state(), TrackerState::Empty);
    assert!(!server.contains(&id));
    assert_eq!(server.delete_requests(), vec![id]);
}

#[tokio::test]
async fn test_blank_name_and_duplicate_email() {
    let server = FakeServer::start().await;
    let mut ctx = TestContext::new(server.client());

    let blank = User::new("", "blank@example.com", "abc12345", false);
    let response = ctx.create_custom_user(&blank).await.unwrap();
    assert_bad_request(&response, "nome", "nome não pode ficar em branco").unwrap();
    assert!(ctx.fixtures.is_empty());

    let user = User::new("Bia Souza", "bia@example.com", "abc12345", false);
    ctx.create_valid_user(&user).await.unwrap();
    let response = ctx.create_custom_user(&user).await.unwrap();
    assert_bad_request(&response, "message", MSG_EMAIL_IN_USE).unwrap();
    assert_eq!(ctx.fixtures.len(), 1);

    assert_eq!(ctx.cleanup().await.attempted, 1);
    assert_eq!(server.user_count(), 1);
}

#[tokio::test]
async fn test_delete_nonexistent_and_update_creates() {
    let server = FakeServer::start().await;
    let mut ctx = TestContext::new(server.client());

    let response = ctx.users.delete_user(NONEXISTENT_ID).await.unwrap();
    assert_operation_ok(&response, MSG_NOTHING_DELETED).unwrap();

    let user = User::new("Caio Lima", "caio@example.com", "abc12345", false);
    let response = ctx.users.update_user(NONEXISTENT_ID, &user).await.unwrap();
    let new_id = ctx.track(&response).unwrap();
    assert_created(&response).unwrap();
    assert_ne!(new_id, NONEXISTENT_ID);
    assert!(server.contains(&new_id));

    ctx.cleanup().await;
    assert!(!server.contains(&new_id));
}

#[tokio::test]
async fn test_seed_user_can_log_in() {
    let server = FakeServer::start().await;
    let login = LoginService::new(server.client());

    let response = login
        .login(&Login::new(SEED_EMAIL, SEED_PASSWORD))
        .await
        .unwrap();
    assert!(LoginService::login_succeeded(&response));

    let users = crate::service::UserService::new(server.client());
    let response = users.get_user(SEED_ID).await.unwrap();
    assert_status(&response, 200).unwrap();
    assert_eq!(response.str_field("administrador"), Some("true"));
}

#[tokio::test]
async fn test_caller_headers_reach_the_service() {
    let server = FakeServer::start().await;
    let mut ctx = TestContext::new(server.client());

    let user = User::new("Duda Reis", "duda@example.com", "abc12345", false);
    let headers = HashMap::from([(
        "Content-Type".to_string(),
        "application/json; charset=utf-8".to_string(),
    )]);
    let response = ctx.users.create_user_with_headers(&user, headers).await.unwrap();
    ctx.track(&response);
    assert_created(&response).unwrap();
    assert_eq!(
        server.create_content_types(),
        vec!["application/json; charset=utf-8"]
    );

    let other = User::new("Eva Reis", "eva@example.com", "abc12345", false);
    let headers = HashMap::from([("Content-Type".to_string(), "text/plain".to_string())]);
    let response = ctx.users.create_user_with_headers(&other, headers).await.unwrap();
    assert_eq!(response.status_code, 415);
    assert!(ctx.track(&response).is_none());

    let headers = HashMap::from([("X-Request-Id".to_string(), "abc123".to_string())]);
    let response = ctx.login.login_with_headers(&user.login(), headers).await.unwrap();
    assert!(LoginService::login_succeeded(&response));

    assert_eq!(ctx.cleanup().await.attempted, 1);
    assert_eq!(server.user_count(), 1);
}

#[tokio::test]
async fn test_filters_narrow_on_every_key() {
    let server = FakeServer::start().await;
    let mut ctx = TestContext::new(server.client());

    for (email, admin) in [("filtro.a@example.com", true), ("filtro.b@example.com", false)] {
        let user = User::new("Filtro Comum", email, "abc12345", admin);
        ctx.create_valid_user(&user).await.unwrap();
    }

    let by_name = ctx.users.find_by_name("Filtro Comum").await.unwrap();
    assert_eq!(by_name.quantity(), Some(2));

    let filters = HashMap::from([
        ("nome".to_string(), "Filtro Comum".to_string()),
        ("administrador".to_string(), "false".to_string()),
    ]);
    let response = ctx.users.list_users_filtered(&filters).await.unwrap();
    assert_eq!(response.quantity(), Some(1));
    assert_eq!(
        response.path("usuarios[0].email").and_then(Value::as_str),
        Some("filtro.b@example.com")
    );

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_login_and_get_token() {
    let server = FakeServer::start().await;
    let login = LoginService::new(server.client());

    let token = login
        .login_and_get_token(&Login::new(SEED_EMAIL, SEED_PASSWORD))
        .await
        .unwrap()
        .unwrap();
    assert!(token.starts_with("Bearer "));
    assert_eq!(token.matches('.').count(), 2);

    let denied = login
        .login_and_get_token(&Login::new(SEED_EMAIL, "senhaerrada"))
        .await
        .unwrap();
    assert_eq!(denied, None);
}

#[tokio::test]
async fn test_cleanup_continues_after_failed_deletes() {
    let server = FakeServer::start().await;
    let users = crate::service::UserService::new(server.client());

    let mut tracker = FixtureTracker::new();
    for name in ["a", "b", "c"] {
        let user = User::new(name, format!("{name}@example.com"), "abc12345", false);
        let id = users.create_user_and_get_id(&user).await.unwrap();
        assert!(tracker.register(id));
    }
    let ids = tracker.ids().to_vec();

    server.fail_deletes(true);
    let report = tracker.drain_and_cleanup(&users).await;
    assert_eq!(report, CleanupReport { attempted: 3, failed: 3 });
    assert_eq!(server.delete_requests(), ids);
    assert!(tracker.is_empty());

    server.fail_deletes(false);
    assert_eq!(tracker.drain_and_cleanup(&users).await, CleanupReport::default());
    assert_eq!(server.delete_requests().len(), 3);
}

#[tokio::test]
async fn test_run_all_passes_and_leaves_no_fixtures() {
    let server = FakeServer::start().await;
    let runner = TestRunner::new(server.config()).unwrap();

    let summary = runner.run_rounds(&suites::all_cases(), 1).await.remove(0);

    assert_eq!(summary.total, suites::all_cases().len());
    assert!(summary.is_all_passed(), "{:#?}", failures(&summary.results));
    assert_eq!(summary.passed, summary.total);
    assert_eq!(server.user_count(), 1);
}

#[tokio::test]
async fn test_parallel_run_passes() {
    let server = FakeServer::start().await;
    let runner = TestRunner::new(server.config()).unwrap();

    let summary = ParallelExecutor::new(4)
        .run_rounds(&runner, &suites::all_cases(), 1)
        .await
        .remove(0);

    assert!(summary.is_all_passed(), "{:#?}", failures(&summary.results));
    let names: Vec<_> = summary.results.iter().map(|r| r.test_case.name).collect();
    let expected: Vec<_> = suites::all_cases().iter().map(|c| c.info.name).collect();
    assert_eq!(names, expected);
    assert_eq!(server.user_count(), 1);
}

#[tokio::test]
async fn test_rounds_aggregate_as_stable() {
    let server = FakeServer::start().await;
    let runner = TestRunner::new(server.config()).unwrap();
    let cases = suites::cases_for(Suite::Login);

    let summaries = runner.run_rounds(&cases, 2).await;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[1].round, 2);

    let aggregate = AggregateResult::from_rounds(&summaries);
    assert!(aggregate.flaky_tests().is_empty());
    assert_eq!(aggregate.stable_tests().len(), cases.len());
}

#[tokio::test]
async fn test_skipped_case_is_not_run() {
    let server = FakeServer::start().await;
    let mut config = server.config();
    config.skip_tests = vec!["create_user".to_string()];
    let runner = TestRunner::new(config).unwrap();

    let summary = runner
        .run_rounds(&suites::cases_for(Suite::Users), 1)
        .await
        .remove(0);
    let skipped = summary
        .results
        .iter()
        .find(|r| r.test_case.name == "create_user")
        .unwrap();
    assert_eq!(skipped.status, TestStatus::Skip);
    assert_eq!(summary.skipped, 1);
}

async fn wrong_status_after_create(ctx: &mut TestContext) -> Result<()> {
    let (_, id) = ctx.create_user(false).await?;
    let response = ctx.users.get_user(&id).await?;
    assert_status(&response, 404)
}

async fn panics_after_create(ctx: &mut TestContext) -> Result<()> {
    ctx.create_user(false).await?;
    panic!("boom");
}

async fn list_only(ctx: &mut TestContext) -> Result<()> {
    ctx.users.list_users().await?;
    Ok(())
}

#[tokio::test]
async fn test_failed_and_panicking_cases_still_clean_up() {
    let server = FakeServer::start().await;
    let runner = TestRunner::new(server.config()).unwrap();

    let failing: Case = case!(Suite::Users, wrong_status_after_create, "Wrong status");
    let result = runner.run_test(&failing).await;
    assert_eq!(result.status, TestStatus::Fail);
    assert!(result.message.unwrap().contains("Expected status 404 but was 200"));
    let details: Value = result.details.unwrap();
    assert_eq!(details["cleanup"]["attempted"], 1);
    assert_eq!(details["cleanup"]["failed"], 0);

    let panicking: Case = case!(Suite::Users, panics_after_create, "Panics");
    let result = runner.run_test(&panicking).await;
    assert_eq!(result.status, TestStatus::Error);
    assert_eq!(result.message.as_deref(), Some("panicked: boom"));

    assert_eq!(server.user_count(), 1);
    assert_eq!(server.delete_requests().len(), 2);
}

#[tokio::test]
async fn test_failed_cleanup_does_not_fail_the_case() {
    let server = FakeServer::start().await;
    let runner = TestRunner::new(server.config()).unwrap();
    let case = suites::find_case("create_user").unwrap();

    server.fail_deletes(true);
    let result = runner.run_test(&case).await;
    server.fail_deletes(false);

    assert_eq!(result.status, TestStatus::Pass);
    let details = result.details.unwrap();
    assert_eq!(details["cleanup"]["failed"], 1);
    assert_eq!(server.user_count(), 2);
}

#[tokio::test]
async fn test_unreachable_service_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let runner = TestRunner::new(SuiteConfig::new(format!("http://{addr}"))).unwrap();
    let case: Case = case!(Suite::Users, list_only, "List only");
    let result = runner.run_test(&case).await;

    assert_eq!(result.status, TestStatus::Error);
}
