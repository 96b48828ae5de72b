//! Token and Authorization header cases

use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;

use super::{case, Case, TestContext};
use crate::assertions::{assert_status, assert_status_in, check, verify, MSG_LOGIN_OK};
use crate::data::DataFactory;
use crate::http::HttpResponse;
use crate::models::{Suite, User};
use crate::service::LoginService;

const JWT_PATTERN: &str = r"^Bearer [A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+$";

/// Minimum length of each token segment
const MIN_SEGMENT_LEN: usize = 10;

pub fn cases() -> Vec<Case> {
    vec![
        case!(Suite::Security, jwt_format, "Login token is a bearer JWT"),
        case!(Suite::Security, invalid_token, "Invalid bearer token on a public endpoint"),
        case!(Suite::Security, malformed_token, "Malformed Authorization header"),
        case!(Suite::Security, public_endpoint_without_token, "Public endpoint needs no token"),
        case!(Suite::Security, special_char_password, "Log in with special-character password"),
        case!(Suite::Security, token_per_login, "Each login returns a token"),
        case!(Suite::Security, token_with_extra_spaces, "Authorization header with extra spaces"),
        case!(Suite::Security, multiple_tokens, "Several tokens in one header"),
        case!(Suite::Security, jwt_segments, "Token segments are non-trivial"),
        case!(Suite::Security, empty_token, "Empty Authorization header"),
        case!(Suite::Security, numeric_password, "Log in with digits-only password"),
        case!(Suite::Security, long_password, "Log in with a very long password"),
    ]
}

async fn list_with_authorization(ctx: &TestContext, value: &str) -> Result<HttpResponse> {
    let headers = HashMap::from([("Authorization".to_string(), value.to_string())]);
    ctx.users.list_users_with_headers(headers).await
}

/// Register `user` and log in with its credentials
async fn register_and_login(ctx: &mut TestContext, user: &User) -> Result<HttpResponse> {
    let id = ctx.create_valid_user(user).await?;
    ctx.note(format!("Security fixture {id}"));
    ctx.login.login(&user.login()).await
}

fn token_segments(response: &HttpResponse) -> Vec<&str> {
    LoginService::bare_token(response)
        .map(|token| token.split('.').collect())
        .unwrap_or_default()
}

async fn jwt_format(ctx: &mut TestContext) -> Result<()> {
    let response = register_and_login(ctx, &DataFactory::valid_user(true)).await?;

    check(&response)
        .status(200)?
        .starts_with("authorization", "Bearer ")?
        .matches("authorization", JWT_PATTERN)?;
    verify(
        token_segments(&response).len() == 3,
        "Token must have three parts (header.payload.signature)",
    )
}

async fn invalid_token(ctx: &mut TestContext) -> Result<()> {
    let response = list_with_authorization(ctx, "Bearer tokeninvalido123").await?;
    assert_status_in(&response, &[200, 401])
}

async fn malformed_token(ctx: &mut TestContext) -> Result<()> {
    let response = list_with_authorization(ctx, "InvalidTokenFormat").await?;
    assert_status_in(&response, &[200, 400, 401])
}

async fn public_endpoint_without_token(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.list_users().await?;
    check(&response).status(200)?.present("usuarios")?;
    Ok(())
}

async fn special_char_password(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(true).with_password("Senh@123!#$%&*()_+-=[]{}|;:,.<>?");
    let response = register_and_login(ctx, &user).await?;

    check(&response)
        .status(200)?
        .str_eq("message", MSG_LOGIN_OK)?
        .starts_with("authorization", "Bearer ")?;
    Ok(())
}

async fn token_per_login(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(true);
    let first = register_and_login(ctx, &user).await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let second_token = ctx
        .login
        .login_and_get_token(&user.login())
        .await?
        .unwrap_or_default();

    assert_status(&first, 200)?;

    let first_token = first.authorization().unwrap_or_default();
    verify(!first_token.is_empty(), "First token must not be empty")?;
    verify(!second_token.is_empty(), "Second token must not be empty")?;

    ctx.note(format!("Tokens differ: {}", first_token != second_token));
    Ok(())
}

async fn token_with_extra_spaces(ctx: &mut TestContext) -> Result<()> {
    let response = list_with_authorization(ctx, "  Bearer   tokencomespaco  ").await?;
    assert_status_in(&response, &[200, 400, 401])
}

async fn multiple_tokens(ctx: &mut TestContext) -> Result<()> {
    let response = list_with_authorization(ctx, "Bearer token1, Bearer token2").await?;
    assert_status_in(&response, &[200, 400, 401])
}

async fn jwt_segments(ctx: &mut TestContext) -> Result<()> {
    let response = register_and_login(ctx, &DataFactory::valid_user(true)).await?;
    assert_status(&response, 200)?;

    let segments = token_segments(&response);
    verify(segments.len() == 3, "Token must have three parts")?;
    for (name, segment) in ["header", "payload", "signature"].iter().zip(&segments) {
        verify(
            segment.len() > MIN_SEGMENT_LEN,
            format!("Token {name} is too short: {} characters", segment.len()),
        )?;
    }
    Ok(())
}

async fn empty_token(ctx: &mut TestContext) -> Result<()> {
    let response = list_with_authorization(ctx, "").await?;
    assert_status_in(&response, &[200, 400, 401])
}

async fn numeric_password(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).with_password("123456789");
    let response = register_and_login(ctx, &user).await?;

    check(&response)
        .status(200)?
        .str_eq("message", MSG_LOGIN_OK)?
        .present("authorization")?;
    Ok(())
}

async fn long_password(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).with_password("a".repeat(100));
    let response = register_and_login(ctx, &user).await?;

    check(&response)
        .status(200)?
        .str_eq("message", MSG_LOGIN_OK)?
        .present("authorization")?;
    Ok(())
}
