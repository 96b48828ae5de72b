//! Resource records exchanged with the remote service
//!
//! Unset fields are left out of the JSON entirely. Several validation cases
//! depend on a field being absent rather than `null`.

use serde::{Deserialize, Serialize};

/// User record (`/usuarios`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// `"true"` or `"false"`, sent as a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrador: Option<String>,
}

impl User {
    pub fn new(
        nome: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        administrador: bool,
    ) -> Self {
        Self {
            id: None,
            nome: Some(nome.into()),
            email: Some(email.into()),
            password: Some(password.into()),
            administrador: Some(administrador.to_string()),
        }
    }

    pub fn with_nome(mut self, nome: impl Into<String>) -> Self {
        self.nome = Some(nome.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the raw `administrador` value, valid or not
    pub fn with_administrador(mut self, value: impl Into<String>) -> Self {
        self.administrador = Some(value.into());
        self
    }

    pub fn without_nome(mut self) -> Self {
        self.nome = None;
        self
    }

    pub fn without_email(mut self) -> Self {
        self.email = None;
        self
    }

    pub fn without_password(mut self) -> Self {
        self.password = None;
        self
    }

    pub fn without_administrador(mut self) -> Self {
        self.administrador = None;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.administrador.as_deref() == Some("true")
    }

    /// Credentials of this user
    pub fn login(&self) -> Login {
        Login {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// Login credential (`/login`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Login {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

impl From<&User> for Login {
    fn from(user: &User) -> Self {
        user.login()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_omits_unset_fields() {
        let user = User::new("Ana", "ana@example.com", "secret123", true).without_password();
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(
            value,
            json!({"nome": "Ana", "email": "ana@example.com", "administrador": "true"})
        );
    }

    #[test]
    fn test_user_deserializes_server_id() {
        let user: User = serde_json::from_value(json!({
            "_id": "0uxuPY0cbmQhpEz1",
            "nome": "Fulano da Silva",
            "email": "fulano@qa.com",
            "password": "teste",
            "administrador": "true"
        }))
        .unwrap();

        assert_eq!(user.id.as_deref(), Some("0uxuPY0cbmQhpEz1"));
        assert!(user.is_admin());
    }

    #[test]
    fn test_login_from_user() {
        let user = User::new("Ana", "ana@example.com", "secret123", false);
        let login = Login::from(&user);
        assert_eq!(login, Login::new("ana@example.com", "secret123"));
        assert_eq!(
            serde_json::to_string(&Login::default()).unwrap(),
            "{}"
        );
    }
}
