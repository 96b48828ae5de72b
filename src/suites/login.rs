//! Login cases (`/login`)
//!
//! Every case registers its own administrator first; the tracker removes it
//! afterwards.

use anyhow::Result;

use super::{case, Case, TestContext};
use crate::assertions::{
    assert_bad_request, assert_field_absent, assert_unauthorized, blank_message, check,
    required_message, verify, MSG_INVALID_CREDENTIALS, MSG_INVALID_EMAIL, MSG_LOGIN_OK,
};
use crate::data::DataFactory;
use crate::models::{Login, Suite, User};
use crate::service::LoginService;

pub fn cases() -> Vec<Case> {
    vec![
        case!(Suite::Login, login_success, "Log in with valid credentials"),
        case!(Suite::Login, login_unknown_email, "Reject unknown e-mail"),
        case!(Suite::Login, login_wrong_password, "Reject wrong password"),
        case!(Suite::Login, login_without_email, "Reject missing e-mail"),
        case!(Suite::Login, login_without_password, "Reject missing password"),
        case!(Suite::Login, login_blank_email, "Reject blank e-mail"),
        case!(Suite::Login, login_blank_password, "Reject blank password"),
        case!(Suite::Login, login_blank_fields, "Reject blank e-mail and password"),
        case!(Suite::Login, login_malformed_email, "Reject malformed e-mail"),
        case!(Suite::Login, login_email_with_spaces, "Reject e-mail with surrounding spaces"),
        case!(Suite::Login, login_password_with_spaces, "Padded password does not match"),
    ]
}

/// Register the administrator the case logs in as
async fn registered_user(ctx: &mut TestContext) -> Result<User> {
    let (user, id) = ctx.create_user(true).await?;
    ctx.note(format!("Login fixture {id} (administrador: {})", user.is_admin()));
    Ok(user)
}

fn email_of(user: &User) -> String {
    user.email.clone().unwrap_or_default()
}

fn password_of(user: &User) -> String {
    user.password.clone().unwrap_or_default()
}

async fn login_success(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login(&DataFactory::valid_login(&user)).await?;
    verify(
        LoginService::login_succeeded(&response),
        format!("Login did not succeed: {} {}", response.status_code, response.text()),
    )?;
    check(&response)
        .status(200)?
        .str_eq("message", MSG_LOGIN_OK)?
        .present("authorization")?
        .starts_with("authorization", "Bearer ")?;
    Ok(())
}

async fn login_unknown_email(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx
        .login
        .login_with("email.invalido@teste.com", &password_of(&user))
        .await?;
    assert_unauthorized(&response, MSG_INVALID_CREDENTIALS)
}

async fn login_wrong_password(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login_with(&email_of(&user), "senhaerrada123").await?;
    assert_unauthorized(&response, MSG_INVALID_CREDENTIALS)?;
    assert_field_absent(&response, 401, "authorization")
}

async fn login_without_email(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login_without_email(&password_of(&user)).await?;
    assert_bad_request(&response, "email", &required_message("email"))
}

async fn login_without_password(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login_without_password(&email_of(&user)).await?;
    assert_bad_request(&response, "password", &required_message("password"))
}

async fn login_blank_email(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login_with("", &password_of(&user)).await?;
    assert_bad_request(&response, "email", &blank_message("email"))
}

async fn login_blank_password(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login_with(&email_of(&user), "").await?;
    assert_bad_request(&response, "password", &blank_message("password"))
}

async fn login_blank_fields(ctx: &mut TestContext) -> Result<()> {
    registered_user(ctx).await?;

    let response = ctx.login.login_with_empty_fields().await?;
    check(&response)
        .status(400)?
        .str_eq("email", &blank_message("email"))?
        .str_eq("password", &blank_message("password"))?;
    Ok(())
}

async fn login_malformed_email(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let response = ctx.login.login_with("emailinvalido", &password_of(&user)).await?;
    assert_bad_request(&response, "email", MSG_INVALID_EMAIL)
}

async fn login_email_with_spaces(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let login = Login::new(format!("  {}  ", email_of(&user)), password_of(&user));
    let response = ctx.login.login(&login).await?;
    assert_bad_request(&response, "email", MSG_INVALID_EMAIL)
}

async fn login_password_with_spaces(ctx: &mut TestContext) -> Result<()> {
    let user = registered_user(ctx).await?;

    let login = Login::new(email_of(&user), format!("  {}  ", password_of(&user)));
    let response = ctx.login.login(&login).await?;
    assert_unauthorized(&response, MSG_INVALID_CREDENTIALS)
}
