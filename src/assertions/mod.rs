//! Response assertion helpers
//!
//! Every helper returns `anyhow::Result<()>`. A mismatch is reported as an
//! [`AssertionFailure`] inside the error so the runner can tell a failed
//! expectation apart from a transport error.

use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

pub const MSG_CREATED: &str = "Cadastro realizado com sucesso";
pub const MSG_UPDATED: &str = "Registro alterado com sucesso";
pub const MSG_DELETED: &str = "Registro excluído com sucesso";
pub const MSG_NOTHING_DELETED: &str = "Nenhum registro excluído";
pub const MSG_EMAIL_IN_USE: &str = "Este email já está sendo usado";
pub const MSG_USER_NOT_FOUND: &str = "Usuário não encontrado";
pub const MSG_LOGIN_OK: &str = "Login realizado com sucesso";
pub const MSG_INVALID_CREDENTIALS: &str = "Email e/ou senha inválidos";
pub const MSG_INVALID_EMAIL: &str = "email deve ser um email válido";
pub const MSG_INVALID_ADMIN: &str = "administrador deve ser 'true' ou 'false'";

/// `"<field> é obrigatório"`
pub fn required_message(field: &str) -> String {
    format!("{field} é obrigatório")
}

/// `"<field> não pode ficar em branco"`
pub fn blank_message(field: &str) -> String {
    format!("{field} não pode ficar em branco")
}

/// A response did not meet an expectation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssertionFailure {
    #[error("Expected status {expected} but was {actual}. Body: {body}")]
    Status {
        expected: String,
        actual: u16,
        body: String,
    },

    #[error("Field '{field}': expected {expected} but was {actual}")]
    Field {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Field '{field}' should be absent but was {actual}")]
    UnexpectedField { field: String, actual: String },

    #[error("{0}")]
    Check(String),
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "absent".to_string(),
    }
}

fn body_excerpt(response: &HttpResponse) -> String {
    const LIMIT: usize = 300;
    let text = response.text();
    match text.char_indices().nth(LIMIT) {
        Some((pos, _)) => format!("{}...", &text[..pos]),
        None => text.to_string(),
    }
}

fn status_failure(response: &HttpResponse, expected: String) -> anyhow::Error {
    AssertionFailure::Status {
        expected,
        actual: response.status_code,
        body: body_excerpt(response),
    }
    .into()
}

/// Exact status code
pub fn assert_status(response: &HttpResponse, expected: u16) -> Result<()> {
    if response.status_code == expected {
        Ok(())
    } else {
        Err(status_failure(response, expected.to_string()))
    }
}

/// Status code is one of `allowed`
pub fn assert_status_in(response: &HttpResponse, allowed: &[u16]) -> Result<()> {
    if allowed.contains(&response.status_code) {
        Ok(())
    } else {
        Err(status_failure(response, format!("one of {allowed:?}")))
    }
}

/// Status code plus one string field equality
pub fn assert_field_eq(response: &HttpResponse, status: u16, field: &str, expected: &str) -> Result<()> {
    assert_status(response, status)?;
    check(response).str_eq(field, expected)?;
    Ok(())
}

/// Status code plus absence of a field
pub fn assert_field_absent(response: &HttpResponse, status: u16, field: &str) -> Result<()> {
    assert_status(response, status)?;
    check(response).absent(field)?;
    Ok(())
}

/// 201 with the creation message and a non-empty `_id`
pub fn assert_created(response: &HttpResponse) -> Result<()> {
    assert_field_eq(response, 201, "message", MSG_CREATED)?;
    match response.id() {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(AssertionFailure::Field {
            field: "_id".to_string(),
            expected: "a non-empty id".to_string(),
            actual: describe(response.field("_id")),
        }
        .into()),
    }
}

/// 200 with the given message
pub fn assert_operation_ok(response: &HttpResponse, message: &str) -> Result<()> {
    assert_field_eq(response, 200, "message", message)
}

/// 400 with `field` carrying the given message
pub fn assert_bad_request(response: &HttpResponse, field: &str, message: &str) -> Result<()> {
    assert_field_eq(response, 400, field, message)
}

/// 401 with the given message
pub fn assert_unauthorized(response: &HttpResponse, message: &str) -> Result<()> {
    assert_field_eq(response, 401, "message", message)
}

/// Free-form condition
pub fn verify(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::Check(message.into()).into())
    }
}

/// Start a chain of checks on one response
pub fn check(response: &HttpResponse) -> Check<'_> {
    Check { response }
}

/// Chained expectations on a response.
///
/// Field arguments are paths as understood by [`HttpResponse::path`].
#[derive(Clone, Copy)]
pub struct Check<'a> {
    response: &'a HttpResponse,
}

impl<'a> Check<'a> {
    fn field_failure(&self, field: &str, expected: impl Into<String>) -> anyhow::Error {
        let actual = if self.response.body().is_json() {
            describe(self.response.path(field))
        } else {
            format!("a non-JSON body: {}", body_excerpt(self.response))
        };
        AssertionFailure::Field {
            field: field.to_string(),
            expected: expected.into(),
            actual,
        }
        .into()
    }

    fn expect(self, field: &str, ok: bool, expected: impl Into<String>) -> Result<Self> {
        if ok {
            Ok(self)
        } else {
            Err(self.field_failure(field, expected))
        }
    }

    pub fn status(self, expected: u16) -> Result<Self> {
        assert_status(self.response, expected)?;
        Ok(self)
    }

    pub fn str_eq(self, field: &str, expected: &str) -> Result<Self> {
        let ok = self.response.path(field).and_then(Value::as_str) == Some(expected);
        self.expect(field, ok, format!("\"{expected}\""))
    }

    pub fn present(self, field: &str) -> Result<Self> {
        let ok = self.response.path(field).is_some_and(|v| !v.is_null());
        self.expect(field, ok, "a value")
    }

    pub fn absent(self, field: &str) -> Result<Self> {
        match self.response.path(field) {
            None => Ok(self),
            Some(value) => Err(AssertionFailure::UnexpectedField {
                field: field.to_string(),
                actual: value.to_string(),
            }
            .into()),
        }
    }

    pub fn is_string(self, field: &str) -> Result<Self> {
        let ok = self.response.path(field).is_some_and(Value::is_string);
        self.expect(field, ok, "a string")
    }

    pub fn is_array(self, field: &str) -> Result<Self> {
        let ok = self.response.path(field).is_some_and(Value::is_array);
        self.expect(field, ok, "an array")
    }

    pub fn is_integer(self, field: &str) -> Result<Self> {
        let ok = self
            .response
            .path(field)
            .is_some_and(|v| v.is_i64() || v.is_u64());
        self.expect(field, ok, "an integer")
    }

    pub fn starts_with(self, field: &str, prefix: &str) -> Result<Self> {
        let ok = self
            .response
            .path(field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.starts_with(prefix));
        self.expect(field, ok, format!("a string starting with \"{prefix}\""))
    }

    /// String field matches `pattern`
    pub fn matches(self, field: &str, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| AssertionFailure::Check(format!("Invalid pattern {pattern}: {e}")))?;
        let ok = self
            .response
            .path(field)
            .and_then(Value::as_str)
            .is_some_and(|s| re.is_match(s));
        self.expect(field, ok, format!("a string matching {pattern}"))
    }

    /// Array or object at `field` has exactly `expected` entries
    pub fn len(self, field: &str, expected: usize) -> Result<Self> {
        let actual = match self.response.path(field) {
            Some(Value::Array(items)) => Some(items.len()),
            Some(Value::Object(map)) => Some(map.len()),
            _ => None,
        };
        self.expect(field, actual == Some(expected), format!("{expected} entries"))
    }

    /// Every element of the array at `field` is an object with key `key`
    pub fn every_item_has(self, field: &str, key: &str) -> Result<Self> {
        let ok = match self.response.path(field) {
            Some(Value::Array(items)) => items.iter().all(|item| item.get(key).is_some()),
            _ => false,
        };
        self.expect(field, ok, format!("an array whose items all have '{key}'"))
    }
}
