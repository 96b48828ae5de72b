//! Response contract cases
//!
//! Check the keys and JSON types of each response body rather than the
//! business outcome.

use anyhow::Result;
use std::collections::HashMap;

use super::{case, Case, TestContext};
use crate::assertions::{check, verify, MSG_CREATED, MSG_DELETED, MSG_LOGIN_OK, MSG_UPDATED};
use crate::data::DataFactory;
use crate::models::Suite;

const USER_FIELDS: &[&str] = &["nome", "email", "password", "administrador", "_id"];

const ID_PATTERN: &str = "^[a-zA-Z0-9]+$";
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";
const BEARER_PATTERN: &str = r"^Bearer [A-Za-z0-9\-_\.]+$";

const JSON_MEDIA_TYPE: &str = "application/json";

pub fn cases() -> Vec<Case> {
    vec![
        case!(Suite::Contract, list_schema, "User list schema"),
        case!(Suite::Contract, create_schema, "User creation schema"),
        case!(Suite::Contract, login_schema, "Login schema"),
        case!(Suite::Contract, get_by_id_types, "Field types of a fetched user"),
        case!(Suite::Contract, list_required_fields, "Every listed user has all fields"),
        case!(Suite::Contract, validation_error_schema, "Validation error schema"),
        case!(Suite::Contract, update_schema, "Update response schema"),
        case!(Suite::Contract, delete_schema, "Delete response schema"),
    ]
}

async fn list_schema(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.list_users().await?;
    let body = check(&response)
        .status(200)?
        .is_array("usuarios")?
        .is_integer("quantidade")?;

    let content_type = response.get_header("content-type").cloned().unwrap_or_default();
    verify(
        content_type.starts_with(JSON_MEDIA_TYPE),
        format!("Expected a JSON content type but got {content_type:?}"),
    )?;

    for field in USER_FIELDS {
        body.is_string(&format!("usuarios[0].{field}"))?;
    }
    Ok(())
}

async fn create_schema(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false);
    let headers = HashMap::from([(
        "Content-Type".to_string(),
        format!("{JSON_MEDIA_TYPE}; charset=utf-8"),
    )]);
    let response = ctx.users.create_user_with_headers(&user, headers).await?;
    ctx.track(&response);

    check(&response)
        .status(201)?
        .is_string("message")?
        .is_string("_id")?
        .str_eq("message", MSG_CREATED)?
        .matches("_id", ID_PATTERN)?;
    Ok(())
}

async fn login_schema(ctx: &mut TestContext) -> Result<()> {
    let (user, _) = ctx.create_user(true).await?;

    let headers = HashMap::from([("Accept".to_string(), JSON_MEDIA_TYPE.to_string())]);
    let response = ctx
        .login
        .login_with_headers(&DataFactory::valid_login(&user), headers)
        .await?;
    check(&response)
        .status(200)?
        .is_string("message")?
        .is_string("authorization")?
        .str_eq("message", MSG_LOGIN_OK)?
        .starts_with("authorization", "Bearer ")?
        .matches("authorization", BEARER_PATTERN)?;
    Ok(())
}

async fn get_by_id_types(ctx: &mut TestContext) -> Result<()> {
    let (_, id) = ctx.create_user(true).await?;

    let response = ctx.users.get_user(&id).await?;
    let body = check(&response).status(200)?;
    for field in USER_FIELDS {
        body.is_string(field)?;
    }
    body.matches("administrador", "^(true|false)$")?
        .matches("email", EMAIL_PATTERN)?;
    Ok(())
}

async fn list_required_fields(ctx: &mut TestContext) -> Result<()> {
    let response = ctx.users.list_users().await?;
    let body = check(&response).status(200)?.is_array("usuarios")?;

    let quantity = response.quantity();
    verify(quantity.is_some(), "quantidade must be a non-negative integer")?;
    for field in USER_FIELDS {
        body.every_item_has("usuarios", field)?;
    }
    Ok(())
}

async fn validation_error_schema(ctx: &mut TestContext) -> Result<()> {
    let user = DataFactory::valid_user(false)
        .with_nome("")
        .with_email("emailinvalido")
        .with_password("")
        .with_administrador("invalido");
    let response = ctx.create_custom_user(&user).await?;

    check(&response)
        .status(400)?
        .is_string("nome")?
        .is_string("email")?
        .is_string("password")?
        .is_string("administrador")?;
    Ok(())
}

async fn update_schema(ctx: &mut TestContext) -> Result<()> {
    let (_, id) = ctx.create_user(false).await?;

    let response = ctx.users.update_user(&id, &DataFactory::valid_user(false)).await?;
    check(&response)
        .status(200)?
        .is_string("message")?
        .str_eq("message", MSG_UPDATED)?
        .len("$", 1)?;
    Ok(())
}

async fn delete_schema(ctx: &mut TestContext) -> Result<()> {
    let (_, id) = ctx.create_user(false).await?;

    let response = ctx.users.delete_user(&id).await?;
    check(&response)
        .status(200)?
        .is_string("message")?
        .str_eq("message", MSG_DELETED)?
        .len("$", 1)?;
    Ok(())
}
