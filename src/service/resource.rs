//! Generic resource client
//!
//! Translates collection/item operations on one endpoint into HTTP calls.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

use crate::http::{HttpClient, HttpRequest, HttpResponse};

/// Client for a single REST resource such as `/usuarios`
#[derive(Clone)]
pub struct ResourceService {
    client: HttpClient,
    endpoint: String,
}

impl ResourceService {
    pub fn new(client: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }

    /// GET the whole collection
    pub async fn list(&self) -> Result<HttpResponse> {
        self.client.get(&self.endpoint).await
    }

    /// GET the collection with query filters.
    ///
    /// Keys are passed through as query parameter names unchanged.
    pub async fn list_filtered<I, K, V>(&self, filters: I) -> Result<HttpResponse>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.client
            .send(HttpRequest::get(&self.endpoint).queries(filters))
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<HttpResponse> {
        self.client.get(&self.item_path(id)).await
    }

    pub async fn create<R: Serialize + ?Sized>(&self, record: &R) -> Result<HttpResponse> {
        self.client.post_json(&self.endpoint, record).await
    }

    /// POST with caller headers merged over the defaults
    pub async fn create_with_headers<R: Serialize + ?Sized>(
        &self,
        record: &R,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.client
            .send(HttpRequest::post(&self.endpoint).json(record)?.headers(headers))
            .await
    }

    pub async fn update<R: Serialize + ?Sized>(&self, id: &str, record: &R) -> Result<HttpResponse> {
        self.client
            .send(HttpRequest::put(self.item_path(id)).json(record)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<HttpResponse> {
        self.client.send(HttpRequest::delete(self.item_path(id))).await
    }

    /// GET the collection with caller headers merged over the defaults
    pub async fn list_with_headers(&self, headers: HashMap<String, String>) -> Result<HttpResponse> {
        self.client.get_with_headers(&self.endpoint, headers).await
    }
}
