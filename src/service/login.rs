//! Login resource client (`/login`)

use anyhow::Result;
use std::collections::HashMap;

use super::resource::ResourceService;
use crate::http::{HttpClient, HttpResponse};
use crate::models::Login;

pub const LOGIN_ENDPOINT: &str = "/login";

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication against `/login`
#[derive(Clone)]
pub struct LoginService {
    resource: ResourceService,
}

impl LoginService {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resource: ResourceService::new(client, LOGIN_ENDPOINT),
        }
    }

    pub async fn login(&self, login: &Login) -> Result<HttpResponse> {
        self.resource.create(login).await
    }

    pub async fn login_with_headers(
        &self,
        login: &Login,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.resource.create_with_headers(login, headers).await
    }

    /// Log in and return the `authorization` value, if the service sent one
    pub async fn login_and_get_token(&self, login: &Login) -> Result<Option<String>> {
        let response = self.login(login).await?;
        Ok(response.authorization().map(String::from))
    }

    pub async fn login_with(&self, email: &str, password: &str) -> Result<HttpResponse> {
        self.login(&Login::new(email, password)).await
    }

    pub async fn login_with_empty_fields(&self) -> Result<HttpResponse> {
        self.login_with("", "").await
    }

    pub async fn login_without_email(&self, password: &str) -> Result<HttpResponse> {
        let login = Login {
            email: None,
            password: Some(password.to_string()),
        };
        self.login(&login).await
    }

    pub async fn login_without_password(&self, email: &str) -> Result<HttpResponse> {
        let login = Login {
            email: Some(email.to_string()),
            password: None,
        };
        self.login(&login).await
    }

    /// 200 with a token present
    pub fn login_succeeded(response: &HttpResponse) -> bool {
        response.status_code == 200 && response.authorization().is_some()
    }

    /// Token with the `Bearer ` prefix removed
    pub fn bare_token(response: &HttpResponse) -> Option<&str> {
        let token = response.authorization()?;
        Some(token.strip_prefix(BEARER_PREFIX).unwrap_or(token))
    }
}
