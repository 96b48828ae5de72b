//! Normalized HTTP response
//!
//! Every call through [`HttpClient`](super::HttpClient) yields an
//! [`HttpResponse`]: status, lower-cased headers and a body that is parsed
//! as JSON when possible and kept as raw text otherwise.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Parsed response body
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Parse `raw` as JSON, falling back to the raw text
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ResponseBody::Json(_))
    }
}

/// HTTP response
#[derive(Clone, Debug, Serialize)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: ResponseBody,
    #[serde(skip)]
    raw: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn new(
        status_code: u16,
        headers: HashMap<String, String>,
        raw: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        let raw = raw.into();
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();

        Self {
            status_code,
            headers,
            body: ResponseBody::parse(&raw),
            raw,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_lowercase())
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Body exactly as received
    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn json(&self) -> Option<&Value> {
        self.body.as_json()
    }

    /// Top-level field of a JSON object body
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.json()?.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name)?.as_str()
    }

    /// Look up a value by a dotted path such as `usuarios[0].nome`.
    ///
    /// `$` or an empty path returns the whole body.
    pub fn path(&self, expr: &str) -> Option<&Value> {
        let mut current = self.json()?;
        if expr.is_empty() || expr == "$" {
            return Some(current);
        }

        for segment in expr.split('.') {
            let (name, indices) = match segment.find('[') {
                Some(pos) => (&segment[..pos], &segment[pos..]),
                None => (segment, ""),
            };

            if !name.is_empty() {
                current = current.get(name)?;
            }

            for index in indices.split('[').filter(|s| !s.is_empty()) {
                let index: usize = index.trim_end_matches(']').parse().ok()?;
                current = current.get(index)?;
            }
        }

        Some(current)
    }

    /// Server-assigned identifier (`_id`)
    pub fn id(&self) -> Option<&str> {
        self.str_field("_id")
    }

    pub fn message(&self) -> Option<&str> {
        self.str_field("message")
    }

    /// Bearer token returned by a successful login
    pub fn authorization(&self) -> Option<&str> {
        self.str_field("authorization")
    }

    /// Record count of a list response (`quantidade`)
    pub fn quantity(&self) -> Option<u64> {
        self.field("quantidade")?.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, raw: &str) -> HttpResponse {
        HttpResponse::new(status, HashMap::new(), raw, 5)
    }

    #[test]
    fn test_http_response() {
        let resp = response(201, r#"{"message":"Cadastro realizado com sucesso","_id":"abc123"}"#);

        assert!(resp.is_success());
        assert_eq!(resp.id(), Some("abc123"));
        assert_eq!(resp.message(), Some("Cadastro realizado com sucesso"));
    }

    #[test]
    fn test_non_json_body_degrades_to_text() {
        let resp = response(502, "<html>Bad Gateway</html>");

        assert_eq!(
            resp.body(),
            &ResponseBody::Text("<html>Bad Gateway</html>".to_string())
        );
        assert_eq!(resp.text(), "<html>Bad Gateway</html>");
        assert!(resp.json().is_none());
        assert!(resp.message().is_none());
        assert!(resp.path("usuarios[0]").is_none());
    }

    #[test]
    fn test_empty_body_is_text() {
        let resp = response(204, "");
        assert!(!resp.body().is_json());
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn test_path_lookup() {
        let resp = response(
            200,
            r#"{"quantidade":2,"usuarios":[{"nome":"Ana"},{"nome":"Bruno","tags":["a","b"]}]}"#,
        );

        assert_eq!(resp.quantity(), Some(2));
        assert_eq!(resp.path("usuarios[0].nome"), Some(&json!("Ana")));
        assert_eq!(resp.path("usuarios[1].tags[1]"), Some(&json!("b")));
        assert_eq!(resp.path("$").and_then(|v| v.as_object()).map(|o| o.len()), Some(2));
        assert!(resp.path("usuarios[5].nome").is_none());
        assert!(resp.path("usuarios[x]").is_none());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let resp = HttpResponse::new(200, headers, "{}", 1);

        assert_eq!(
            resp.get_header("content-type").map(String::as_str),
            Some("application/json")
        );
        assert!(resp.get_header("CONTENT-TYPE").is_some());
    }
}
