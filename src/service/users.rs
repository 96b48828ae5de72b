//! User resource client (`/usuarios`)

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use super::resource::ResourceService;
use crate::fixtures::FixtureCleaner;
use crate::http::{HttpClient, HttpResponse};
use crate::models::User;

pub const USERS_ENDPOINT: &str = "/usuarios";

/// Operations on registered users
#[derive(Clone)]
pub struct UserService {
    resource: ResourceService,
}

impl UserService {
    pub fn new(client: HttpClient) -> Self {
        Self {
            resource: ResourceService::new(client, USERS_ENDPOINT),
        }
    }

    pub async fn list_users(&self) -> Result<HttpResponse> {
        self.resource.list().await
    }

    /// List users filtered by one query parameter
    pub async fn list_users_by(&self, param: &str, value: &str) -> Result<HttpResponse> {
        self.resource.list_filtered([(param, value)]).await
    }

    /// List users matching every `param=value` pair
    pub async fn list_users_filtered(&self, filters: &HashMap<String, String>) -> Result<HttpResponse> {
        self.resource
            .list_filtered(filters.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .await
    }

    pub async fn create_user(&self, user: &User) -> Result<HttpResponse> {
        self.resource.create(user).await
    }

    pub async fn create_user_with_headers(
        &self,
        user: &User,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.resource.create_with_headers(user, headers).await
    }

    pub async fn get_user(&self, id: &str) -> Result<HttpResponse> {
        self.resource.get_by_id(id).await
    }

    /// PUT a user; an unknown id makes the service create a new record
    pub async fn update_user(&self, id: &str, user: &User) -> Result<HttpResponse> {
        self.resource.update(id, user).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<HttpResponse> {
        self.resource.delete(id).await
    }

    /// Create a user and return the assigned id, if any
    pub async fn create_user_and_get_id(&self, user: &User) -> Result<Option<String>> {
        let response = self.create_user(user).await?;
        Ok(response.id().map(String::from))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<HttpResponse> {
        self.list_users_by("email", email).await
    }

    pub async fn find_by_name(&self, nome: &str) -> Result<HttpResponse> {
        self.list_users_by("nome", nome).await
    }

    pub async fn list_admins(&self) -> Result<HttpResponse> {
        self.list_users_by("administrador", "true").await
    }

    pub async fn list_regular_users(&self) -> Result<HttpResponse> {
        self.list_users_by("administrador", "false").await
    }

    pub async fn list_users_with_headers(&self, headers: HashMap<String, String>) -> Result<HttpResponse> {
        self.resource.list_with_headers(headers).await
    }

    /// Whether any user is registered under `email`
    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let response = self.find_by_email(email).await?;
        Ok(response.quantity().unwrap_or(0) > 0)
    }

    /// Number of registered users
    pub async fn count_users(&self) -> Result<u64> {
        let response = self.list_users().await?;
        Ok(response.quantity().unwrap_or(0))
    }
}

#[async_trait]
impl FixtureCleaner for UserService {
    async fn remove(&self, id: &str) -> Result<HttpResponse> {
        debug!("Removing user fixture {id}");
        self.delete_user(id).await
    }
}
