//! In-memory stand-in for the ServeRest user and login endpoints
//!
//! Binds `127.0.0.1:0`, keeps users in insertion order and answers with the
//! same status codes and Portuguese messages as the real service.

use axum::extract::{Path, Query, State};
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::assertions::{
    blank_message, required_message, MSG_CREATED, MSG_DELETED, MSG_EMAIL_IN_USE,
    MSG_INVALID_ADMIN, MSG_INVALID_CREDENTIALS, MSG_INVALID_EMAIL, MSG_LOGIN_OK,
    MSG_NOTHING_DELETED, MSG_UPDATED, MSG_USER_NOT_FOUND,
};
use crate::config::SuiteConfig;
use crate::http::HttpClient;

pub const SEED_ID: &str = "0uxuPY0cbmQhpEz1";
pub const SEED_EMAIL: &str = "fulano@qa.com";
pub const SEED_PASSWORD: &str = "teste";

const USER_FIELDS: [&str; 4] = ["nome", "email", "password", "administrador"];
const ID_LEN: usize = 16;
const MSG_INVALID_ID: &str = "id deve ter exatamente 16 caracteres alfanuméricos";
const JWT_HEADER: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

type Reply = (StatusCode, Json<Value>);

#[derive(Clone, Debug)]
struct StoredUser {
    id: String,
    nome: String,
    email: String,
    password: String,
    administrador: String,
}

impl StoredUser {
    fn to_json(&self) -> Value {
        json!({
            "nome": self.nome,
            "email": self.email,
            "password": self.password,
            "administrador": self.administrador,
            "_id": self.id,
        })
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "_id" => Some(&self.id),
            "nome" => Some(&self.nome),
            "email" => Some(&self.email),
            "password" => Some(&self.password),
            "administrador" => Some(&self.administrador),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    users: Vec<StoredUser>,
    delete_requests: Vec<String>,
    create_content_types: Vec<String>,
    fail_deletes: bool,
}

type SharedState = Arc<Mutex<FakeState>>;

/// Running fake service; the server task stops when this is dropped
pub struct FakeServer {
    addr: SocketAddr,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl FakeServer {
    /// Start a server seeded with one administrator
    pub async fn start() -> Self {
        let state: SharedState = Arc::new(Mutex::new(FakeState::default()));
        state.lock().unwrap().users.push(StoredUser {
            id: SEED_ID.to_string(),
            nome: "Fulano da Silva".to_string(),
            email: SEED_EMAIL.to_string(),
            password: SEED_PASSWORD.to_string(),
            administrador: "true".to_string(),
        });

        let app = Router::new()
            .route("/usuarios", get(list_users).post(create_user))
            .route(
                "/usuarios/{id}",
                get(get_user).put(update_user).delete(delete_user),
            )
            .route("/login", post(login))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> SuiteConfig {
        SuiteConfig::new(self.base_url())
    }

    pub fn client(&self) -> HttpClient {
        HttpClient::new(self.base_url()).unwrap()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Number of stored users, seed included
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().users.iter().any(|u| u.id == id)
    }

    /// Ids of every DELETE received, in arrival order
    pub fn delete_requests(&self) -> Vec<String> {
        self.lock().delete_requests.clone()
    }

    /// `Content-Type` of every user POST, in arrival order
    pub fn create_content_types(&self) -> Vec<String> {
        self.lock().create_content_types.clone()
    }

    /// Answer every DELETE with 500 while `fail` is set
    pub fn fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$").unwrap()
    })
}

fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email) && !email.contains("..")
}

fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn random_alnum(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn message(status: StatusCode, text: &str) -> Reply {
    reply(status, json!({ "message": text }))
}

/// Validate a user body; one entry per invalid field
fn validate_user(body: &Value) -> Result<StoredUser, Map<String, Value>> {
    let mut errors = Map::new();
    let mut values = HashMap::new();

    for field in USER_FIELDS {
        match body.get(field) {
            None | Some(Value::Null) => {
                errors.insert(field.to_string(), json!(required_message(field)));
            }
            Some(Value::String(s)) if s.is_empty() => {
                errors.insert(field.to_string(), json!(blank_message(field)));
            }
            Some(Value::String(s)) => {
                values.insert(field, s.clone());
            }
            Some(_) => {
                errors.insert(field.to_string(), json!(format!("{field} deve ser uma string")));
            }
        }
    }

    if let Some(email) = values.get("email") {
        if !is_valid_email(email) {
            errors.insert("email".to_string(), json!(MSG_INVALID_EMAIL));
        }
    }
    if let Some(admin) = values.get("administrador") {
        if admin != "true" && admin != "false" {
            errors.insert("administrador".to_string(), json!(MSG_INVALID_ADMIN));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut take = |field: &str| values.remove(field).unwrap_or_default();
    Ok(StoredUser {
        id: String::new(),
        nome: take("nome"),
        email: take("email"),
        password: take("password"),
        administrador: take("administrador"),
    })
}

async fn list_users(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let state = state.lock().unwrap();
    let users: Vec<Value> = state
        .users
        .iter()
        .filter(|u| {
            params
                .iter()
                .all(|(key, value)| u.field(key).map_or(true, |v| v == value.as_str()))
        })
        .map(StoredUser::to_json)
        .collect();

    reply(
        StatusCode::OK,
        json!({ "quantidade": users.len(), "usuarios": users }),
    )
}

async fn create_user(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.lock().unwrap().create_content_types.push(content_type);

    let mut user = match validate_user(&body) {
        Ok(user) => user,
        Err(errors) => return reply(StatusCode::BAD_REQUEST, Value::Object(errors)),
    };

    let mut state = state.lock().unwrap();
    if state.users.iter().any(|u| u.email == user.email) {
        return message(StatusCode::BAD_REQUEST, MSG_EMAIL_IN_USE);
    }

    user.id = random_alnum(ID_LEN);
    let id = user.id.clone();
    state.users.push(user);

    reply(
        StatusCode::CREATED,
        json!({ "message": MSG_CREATED, "_id": id }),
    )
}

async fn get_user(State(state): State<SharedState>, Path(id): Path<String>) -> Reply {
    if !is_valid_id(&id) {
        return reply(StatusCode::BAD_REQUEST, json!({ "id": MSG_INVALID_ID }));
    }

    let state = state.lock().unwrap();
    match state.users.iter().find(|u| u.id == id) {
        Some(user) => reply(StatusCode::OK, user.to_json()),
        None => message(StatusCode::BAD_REQUEST, MSG_USER_NOT_FOUND),
    }
}

async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut edited = match validate_user(&body) {
        Ok(user) => user,
        Err(errors) => return reply(StatusCode::BAD_REQUEST, Value::Object(errors)),
    };

    let mut state = state.lock().unwrap();
    if state
        .users
        .iter()
        .any(|u| u.email == edited.email && u.id != id)
    {
        return message(StatusCode::BAD_REQUEST, MSG_EMAIL_IN_USE);
    }

    match state.users.iter().position(|u| u.id == id) {
        Some(index) => {
            edited.id = id;
            state.users[index] = edited;
            message(StatusCode::OK, MSG_UPDATED)
        }
        None => {
            edited.id = random_alnum(ID_LEN);
            let new_id = edited.id.clone();
            state.users.push(edited);
            reply(
                StatusCode::CREATED,
                json!({ "message": MSG_CREATED, "_id": new_id }),
            )
        }
    }
}

async fn delete_user(State(state): State<SharedState>, Path(id): Path<String>) -> Reply {
    let mut state = state.lock().unwrap();
    state.delete_requests.push(id.clone());

    if state.fail_deletes {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Falha simulada");
    }

    let before = state.users.len();
    state.users.retain(|u| u.id != id);

    if state.users.len() < before {
        message(StatusCode::OK, MSG_DELETED)
    } else {
        message(StatusCode::OK, MSG_NOTHING_DELETED)
    }
}

async fn login(State(state): State<SharedState>, Json(body): Json<Value>) -> Reply {
    let mut errors = Map::new();
    let mut credentials = HashMap::new();

    for field in ["email", "password"] {
        match body.get(field).and_then(Value::as_str) {
            None => {
                errors.insert(field.to_string(), json!(required_message(field)));
            }
            Some("") => {
                errors.insert(field.to_string(), json!(blank_message(field)));
            }
            Some(value) => {
                credentials.insert(field, value.to_string());
            }
        }
    }

    if let Some(email) = credentials.get("email") {
        if !is_valid_email(email) {
            errors.insert("email".to_string(), json!(MSG_INVALID_EMAIL));
        }
    }

    if !errors.is_empty() {
        return reply(StatusCode::BAD_REQUEST, Value::Object(errors));
    }

    let state = state.lock().unwrap();
    let matched = state.users.iter().any(|u| {
        Some(&u.email) == credentials.get("email") && Some(&u.password) == credentials.get("password")
    });

    if !matched {
        return message(StatusCode::UNAUTHORIZED, MSG_INVALID_CREDENTIALS);
    }

    let token = format!("{JWT_HEADER}.{}.{}", random_alnum(40), random_alnum(43));
    reply(
        StatusCode::OK,
        json!({ "message": MSG_LOGIN_OK, "authorization": format!("Bearer {token}") }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana.1700000000000abc123@qa.com.br"));
        assert!(is_valid_email(SEED_EMAIL));
        for email in [
            "emailinvalido",
            "email@",
            "@dominio.com",
            "email@@dominio.com",
            "email..teste@dominio.com",
            "  teste@email.com  ",
        ] {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }
    }

    #[test]
    fn test_validate_user_reports_every_field() {
        let errors = validate_user(&json!({
            "nome": "",
            "email": "emailinvalido",
            "administrador": "sim",
        }))
        .unwrap_err();

        assert_eq!(errors["nome"], "nome não pode ficar em branco");
        assert_eq!(errors["email"], MSG_INVALID_EMAIL);
        assert_eq!(errors["password"], "password é obrigatório");
        assert_eq!(errors["administrador"], MSG_INVALID_ADMIN);
    }

    #[tokio::test]
    async fn test_seeded_user_is_listed() {
        let server = FakeServer::start().await;
        let response = server.client().get("/usuarios").await.unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.quantity(), Some(1));
        assert_eq!(response.str_field("usuarios"), None);
        assert_eq!(
            response.path("usuarios[0]._id").and_then(Value::as_str),
            Some(SEED_ID)
        );
    }
}
