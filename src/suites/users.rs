//! User resource cases (`/usuarios`)

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;

use super::{case, Case, TestContext};
use crate::assertions::{
    assert_bad_request, assert_created, assert_operation_ok, assert_status, assert_status_in,
    blank_message, check, required_message, verify, MSG_DELETED, MSG_EMAIL_IN_USE,
    MSG_INVALID_ADMIN, MSG_INVALID_EMAIL, MSG_NOTHING_DELETED, MSG_UPDATED, MSG_USER_NOT_FOUND,
};
use crate::data::DataFactory;
use crate::http::HttpResponse;
use crate::models::{Suite, User};

/// Well-formed id that no record carries
pub const NONEXISTENT_ID: &str = "123456789012345678901234";

const DEFAULT_PASSWORD: &str = "senha123";

pub fn cases() -> Vec<Case> {
    vec![
        case!(Suite::Users, list_users, "List all registered users"),
        case!(Suite::Users, create_user, "Create a new user"),
        case!(Suite::Users, create_user_duplicate_email, "Reject duplicate e-mail"),
        case!(Suite::Users, get_user_by_id, "Fetch user by id"),
        case!(Suite::Users, delete_user, "Delete a user"),
        case!(Suite::Users, update_user, "Update an existing user"),
        case!(Suite::Users, create_user_blank_name, "Reject blank name"),
        case!(Suite::Users, create_user_without_name, "Reject missing name"),
        case!(Suite::Users, create_user_email_without_at, "Reject e-mail without @"),
        case!(Suite::Users, create_user_invalid_email_formats, "Reject malformed e-mails"),
        case!(Suite::Users, create_user_missing_required_field, "Reject each missing required field"),
        case!(Suite::Users, create_user_blank_field, "Reject each blank field"),
        case!(Suite::Users, create_user_email_without_domain, "Reject e-mail without domain"),
        case!(Suite::Users, create_user_short_password, "Short password is accepted or rejected"),
        case!(Suite::Users, create_user_invalid_admin_flag, "Reject invalid administrador value"),
        case!(Suite::Users, create_user_without_admin_flag, "Reject missing administrador"),
        case!(Suite::Users, create_user_special_chars_in_name, "Special characters in name"),
        case!(Suite::Users, create_user_email_with_spaces, "Reject e-mail with surrounding spaces"),
        case!(Suite::Users, get_user_invalid_id, "Fetch with malformed id fails"),
        case!(Suite::Users, get_user_nonexistent_id, "Fetch with unknown id fails"),
        case!(Suite::Users, find_user_by_name, "Filter users by name"),
        case!(Suite::Users, find_user_by_email, "Filter users by e-mail"),
        case!(Suite::Users, list_admin_users, "List administrators only"),
        case!(Suite::Users, list_regular_users, "List non-administrators only"),
        case!(Suite::Users, update_user_duplicate_email, "Reject update to an e-mail in use"),
        case!(Suite::Users, update_nonexistent_id_creates, "Update with unknown id creates a user"),
        case!(Suite::Users, update_user_name_only, "Update only the name"),
        case!(Suite::Users, update_user_email_only, "Update only the e-mail"),
        case!(Suite::Users, update_user_admin_flag, "Promote user to administrator"),
        case!(Suite::Users, delete_nonexistent_id, "Delete with unknown id removes nothing"),
        case!(Suite::Users, delete_invalid_id, "Delete with malformed id removes nothing"),
        case!(Suite::Users, delete_then_get_not_found, "Deleted user can no longer be fetched"),
        case!(Suite::Users, create_user_long_fields, "Very long name and password"),
        case!(Suite::Users, create_user_sql_injection, "SQL injection in every field"),
        case!(Suite::Users, create_user_xss, "Script payloads in text fields"),
    ]
}

/// Valid user with every field overridable by the case
fn user_with(nome: &str, email: &str, password: &str, admin: &str) -> User {
    User::new(nome, email, password, false).with_administrador(admin)
}

/// Copy of `user` without its id, ready to be sent as an update
fn as_update(user: &User) -> User {
    User {
        id: None,
        ..user.clone()
    }
}

/// Number of listed users whose `administrador` equals `flag`
fn count_with_admin_flag(response: &HttpResponse, flag: &str) -> usize {
    response
        .field("usuarios")
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .filter(|u| u.get("administrador").and_then(Value::as_str) == Some(flag))
                .count()
        })
        .unwrap_or(0)
}

async fn list_users(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.list_users().await?;
    check(&response)
        .status(200)?
        .is_array("usuarios")?
        .is_integer("quantidade")?;

    let total = ctx.users.count_users().await?;
    ctx.note(format!("Registered users: {total}"));
    Ok(())
}

async fn create_user(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(true);
    let response = ctx.create_custom_user(&user).await?;
    assert_created(&response)?;

    let id = response.id().unwrap_or_default();
    verify(!id.is_empty(), "Created user has an empty id")?;
    ctx.note(format!("Created user {id} <{}>", user.email.as_deref().unwrap_or("")));
    Ok(())
}

async fn create_user_duplicate_email(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false);
    ctx.create_valid_user(&user).await?;

    let email = user.email.as_deref().unwrap_or_default();
    let exists = ctx.users.exists_by_email(email).await?;
    ctx.note(format!("User exists before duplicate attempt: {exists}"));

    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "message", MSG_EMAIL_IN_USE)
}

async fn get_user_by_id(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false);
    let id = ctx.create_valid_user(&user).await?;

    let response = ctx.users.get_user(&id).await?;
    check(&response)
        .status(200)?
        .str_eq("_id", &id)?
        .str_eq("nome", user.nome.as_deref().unwrap_or_default())?
        .str_eq("email", user.email.as_deref().unwrap_or_default())?;
    Ok(())
}

async fn delete_user(ctx: &mut TestContext) -> Result<()> {
    let (_, id) = ctx.create_user(false).await?;
    let response = ctx.users.delete_user(&id).await?;
    assert_operation_ok(&response, MSG_DELETED)
}

async fn update_user(ctx: &mut TestContext) -> Result<()> {
    let (_, id) = ctx.create_user(false).await?;
    let edited = DataFactory::valid_user(false);
    let response = ctx.users.update_user(&id, &edited).await?;
    assert_operation_ok(&response, MSG_UPDATED)?;
    check(&response).absent("_id")?;
    Ok(())
}

async fn create_user_blank_name(ctx: &mut TestContext) -> Result<()> {
    let user = user_with("", &DataFactory::email(), DEFAULT_PASSWORD, "true");
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "nome", &blank_message("nome"))
}

async fn create_user_without_name(ctx: &mut TestContext) -> Result<()> {
    let user = user_with("", &DataFactory::email(), DEFAULT_PASSWORD, "true").without_nome();
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "nome", &required_message("nome"))
}

async fn create_user_email_without_at(ctx: &mut TestContext) -> Result<()> {
    let user = user_with(&DataFactory::name(), "emailinvalido.com", DEFAULT_PASSWORD, "false");
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "email", MSG_INVALID_EMAIL)
}

async fn create_user_invalid_email_formats(ctx: &mut TestContext) -> Result<()> {
    const EMAILS: &[&str] = &[
        "emailinvalido",
        "email@",
        "@dominio.com",
        "email@@dominio.com",
        "email..teste@dominio.com",
    ];

    for email in EMAILS {
        let user = user_with(&DataFactory::name(), email, DEFAULT_PASSWORD, "false");
        let response = ctx.create_custom_user(&user).await?;
        assert_bad_request(&response, "email", MSG_INVALID_EMAIL)
            .with_context(|| format!("e-mail {email:?}"))?;
    }
    Ok(())
}

async fn create_user_missing_required_field(ctx: &mut TestContext) -> Result<()> {
    for field in ["nome", "email", "password", "administrador"] {
        let user = DataFactory::valid_user(false);
        let user = match field {
            "nome" => user.without_nome(),
            "email" => user.without_email(),
            "password" => user.without_password(),
            _ => user.without_administrador(),
        };

        let response = ctx.create_custom_user(&user).await?;
        assert_bad_request(&response, field, &required_message(field))
            .with_context(|| format!("missing field '{field}'"))?;
    }
    Ok(())
}

async fn create_user_blank_field(ctx: &mut TestContext) -> Result<()> {
    for field in ["nome", "email", "password"] {
        let user = DataFactory::valid_user(false);
        let user = match field {
            "nome" => user.with_nome(""),
            "email" => user.with_email(""),
            _ => user.with_password(""),
        };

        let response = ctx.create_custom_user(&user).await?;
        assert_bad_request(&response, field, &blank_message(field))
            .with_context(|| format!("blank field '{field}'"))?;
    }
    Ok(())
}

async fn create_user_email_without_domain(ctx: &mut TestContext) -> Result<()> {
    let user = user_with(&DataFactory::name(), "email@", DEFAULT_PASSWORD, "false");
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "email", MSG_INVALID_EMAIL)
}

async fn create_user_short_password(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).with_password("12");
    let response = ctx.create_custom_user(&user).await?;
    assert_status_in(&response, &[201, 400])
}

async fn create_user_invalid_admin_flag(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).with_administrador("sim");
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "administrador", MSG_INVALID_ADMIN)
}

async fn create_user_without_admin_flag(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).without_administrador();
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "administrador", &required_message("administrador"))
}

async fn create_user_special_chars_in_name(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).with_nome("José da Silva Júnior @#$%");
    let response = ctx.create_custom_user(&user).await?;
    assert_status_in(&response, &[201, 400])
}

async fn create_user_email_with_spaces(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false).with_email("  teste@email.com  ");
    let response = ctx.create_custom_user(&user).await?;
    assert_bad_request(&response, "email", MSG_INVALID_EMAIL)
}

async fn get_user_invalid_id(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.get_user("id_invalido_123").await?;
    assert_status(&response, 400)?;
    verify(!response.text().is_empty(), "Error response body is empty")
}

async fn get_user_nonexistent_id(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.get_user(NONEXISTENT_ID).await?;
    assert_status(&response, 400)?;
    verify(!response.text().is_empty(), "Error response body is empty")
}

async fn find_user_by_name(ctx: &mut TestContext) -> Result<()> {
    const NAME: &str = "João Teste Filtro";
    let user = DataFactory::valid_user(false).with_nome(NAME);
    ctx.create_valid_user(&user).await?;

    let response = ctx.users.find_by_name(NAME).await?;
    check(&response).status(200)?.str_eq("usuarios[0].nome", NAME)?;

    let filters = HashMap::from([
        ("nome".to_string(), NAME.to_string()),
        ("administrador".to_string(), "true".to_string()),
    ]);
    let admins_named = ctx.users.list_users_filtered(&filters).await?;
    check(&admins_named).status(200)?;
    verify(
        count_with_admin_flag(&admins_named, "false") == 0,
        "Filtering on administrador=true still listed regular users",
    )?;
    ctx.note(format!("Found user by name: {NAME}"));
    Ok(())
}

async fn find_user_by_email(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false);
    ctx.create_valid_user(&user).await?;

    let email = user.email.as_deref().unwrap_or_default();
    let response = ctx.users.find_by_email(email).await?;
    check(&response).status(200)?.str_eq("usuarios[0].email", email)?;
    ctx.note(format!("Found user by e-mail: {email}"));
    Ok(())
}

async fn list_admin_users(ctx: &mut TestContext) -> Result<()> {
    ctx.create_user(true).await?;

    let response = ctx.users.list_admins().await?;
    check(&response).status(200)?.is_array("usuarios")?;
    let admins = count_with_admin_flag(&response, "true");
    verify(admins >= 1, "Expected at least one administrator in the filtered list")?;
    ctx.note(format!("Administrators listed: {admins}"));
    Ok(())
}

async fn list_regular_users(ctx: &mut TestContext) -> Result<()> {
    ctx.create_user(false).await?;

    let response = ctx.users.list_regular_users().await?;
    check(&response).status(200)?.is_array("usuarios")?;
    let regular = count_with_admin_flag(&response, "false");
    verify(regular >= 1, "Expected at least one regular user in the filtered list")?;
    ctx.note(format!("Regular users listed: {regular}"));
    Ok(())
}

async fn update_user_duplicate_email(ctx: &mut TestContext) -> Result<()> {
    let (first, _) = ctx.create_user(false).await?;
    let (second, second_id) = ctx.create_user(false).await?;

    let edited = as_update(&second).with_email(first.email.clone().unwrap_or_default());
    let response = ctx.users.update_user(&second_id, &edited).await?;
    assert_bad_request(&response, "message", MSG_EMAIL_IN_USE)
}

async fn update_nonexistent_id_creates(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false);
    let response = ctx.users.update_user(NONEXISTENT_ID, &user).await?;
    ctx.track(&response);
    assert_created(&response)
}

async fn update_user_name_only(ctx: &mut TestContext) -> Result<()> {
    let (user, id) = ctx.create_user(false).await?;

    let edited = as_update(&user).with_nome("Nome Editado");
    let response = ctx.users.update_user(&id, &edited).await?;
    assert_operation_ok(&response, MSG_UPDATED)?;

    let fetched = ctx.users.get_user(&id).await?;
    check(&fetched).str_eq("nome", "Nome Editado")?;
    Ok(())
}

async fn update_user_email_only(ctx: &mut TestContext) -> Result<()> {
    let (user, id) = ctx.create_user(false).await?;

    let new_email = DataFactory::email();
    let edited = as_update(&user).with_email(&new_email);
    let response = ctx.users.update_user(&id, &edited).await?;
    assert_operation_ok(&response, MSG_UPDATED)?;

    let fetched = ctx.users.get_user(&id).await?;
    check(&fetched).str_eq("email", &new_email)?;
    Ok(())
}

async fn update_user_admin_flag(ctx: &mut TestContext) -> Result<()> {
    let (user, id) = ctx.create_user(false).await?;

    let edited = as_update(&user).with_administrador("true");
    let response = ctx.users.update_user(&id, &edited).await?;
    assert_operation_ok(&response, MSG_UPDATED)?;

    let fetched = ctx.users.get_user(&id).await?;
    check(&fetched).str_eq("administrador", "true")?;
    Ok(())
}

async fn delete_nonexistent_id(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.delete_user(NONEXISTENT_ID).await?;
    assert_operation_ok(&response, MSG_NOTHING_DELETED)
}

async fn delete_invalid_id(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.delete_user("id_invalido").await?;
    assert_operation_ok(&response, MSG_NOTHING_DELETED)
}

async fn delete_then_get_not_found(ctx: &mut TestContext) -> Result<()> {
    let id = ctx
        .users
        .create_user_and_get_id(&DataFactory::valid_user(false))
        .await?;
    ctx.fixtures.register(id.as_deref());
    let id = id.context("Creation response carried no _id")?;

    let response = ctx.users.delete_user(&id).await?;
    assert_operation_ok(&response, MSG_DELETED)?;

    let fetched = ctx.users.get_user(&id).await?;
    assert_bad_request(&fetched, "message", MSG_USER_NOT_FOUND)
}

async fn create_user_long_fields(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false)
        .with_nome("a".repeat(500))
        .with_password("b".repeat(500));
    let response = ctx.create_custom_user(&user).await?;
    assert_status_in(&response, &[201, 400])
}

async fn create_user_sql_injection(ctx: &mut TestContext) -> Result<()> {
    let user = user_with(
        "' OR '1'='1",
        "test' OR '1'='1@email.com",
        "' OR '1'='1",
        "false",
    );
    let response = ctx.create_custom_user(&user).await?;
    assert_status_in(&response, &[201, 400])
}

async fn create_user_xss(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false)
        .with_nome("<script>alert('XSS')</script>")
        .with_password("<img src=x onerror=alert('XSS')>");
    let response = ctx.create_custom_user(&user).await?;
    assert_status_in(&response, &[201, 400])?;

    if let Some(id) = response.id() {
        let fetched = ctx.users.get_user(id).await?;
        assert_status(&fetched, 200)?;
    }
    Ok(())
}
