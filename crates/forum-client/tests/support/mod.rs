//! In-process forum backend for the client integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

use forum_client::{ApiClient, ClientConfig, MemoryTokenStore, Session, TokenStore};
use forum_types::api::{AiAnswerRequest, CreateAnswerRequest, CreateQuestionRequest, LoginRequest, RegisterRequest};
use forum_types::models::{Answer, Question, QuestionDetail, User};

#[derive(Default)]
pub struct MockState {
    pub users: Vec<(User, String)>,
    pub tokens: HashMap<String, i64>,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub next_id: i64,

    pub check_calls: usize,
    pub list_calls: usize,
    pub question_fetches: usize,
    pub answer_posts: usize,
    pub ai_posts: usize,

    pub list_delays: HashMap<u32, Duration>,
    pub ai_delay: Option<Duration>,
    pub ai_status: Option<StatusCode>,
    pub list_status: Option<StatusCode>,
    pub fail_question_fetch: bool,
    /// Delays the next question fetch only.
    pub question_delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state().next_id = 100;
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Add a user with a valid token `token-<id>`.
    pub fn add_user(&self, id: i64, username: &str) -> String {
        let mut state = self.state();
        let user = User {
            id,
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: format!("{}@example.com", username),
        };
        state.users.push((user, "secret-password".to_string()));
        let token = format!("token-{}", id);
        state.tokens.insert(token.clone(), id);
        token
    }

    pub fn add_question(&self, id: i64, author_id: i64, title: &str, description: &str) {
        let mut state = self.state();
        let username = author_name(&state, author_id);
        state.questions.push(Question {
            id,
            title: title.to_string(),
            description: description.to_string(),
            tag: "General".to_string(),
            author_id,
            author_username: username,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::minutes(id),
        });
    }

    pub fn add_answer(&self, id: i64, question_id: i64, author_id: i64, body: &str) {
        let mut state = self.state();
        let username = author_name(&state, author_id);
        state.answers.push(Answer {
            id,
            question_id,
            body: body.to_string(),
            author_id,
            author_username: username,
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap() + chrono::Duration::minutes(id),
        });
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/user/check", get(check_user))
            .route("/user/register", post(register))
            .route("/user/login", post(login))
            .route("/questions", get(list_questions))
            .route("/question", post(create_question))
            .route("/question/{id}", get(get_question).delete(delete_question))
            .route("/answer", post(create_answer))
            .route("/answer/{id}", axum::routing::delete(delete_answer))
            .route("/ai/answer", post(ai_answer))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

fn author_name(state: &MockState, author_id: i64) -> String {
    state
        .users
        .iter()
        .find(|(u, _)| u.id == author_id)
        .map(|(u, _)| u.username.clone())
        .unwrap_or_else(|| format!("user{}", author_id))
}

pub fn config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        ai_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }
}

/// A session over an in-memory token store holding `token`, if any.
pub fn session_with(config: &ClientConfig, token: Option<&str>) -> (Session, Arc<dyn TokenStore>) {
    let store: Arc<dyn TokenStore> = match token {
        Some(t) => Arc::new(MemoryTokenStore::with_token(t)),
        None => Arc::new(MemoryTokenStore::default()),
    };
    let api = ApiClient::new(config, store.clone()).unwrap();
    (Session::new(api), store)
}

/// Start a backend with one user and return a session that is already
/// initialised as that user.
pub async fn signed_in(backend: &MockBackend, user_id: i64, config_fn: impl FnOnce(&str) -> ClientConfig) -> Session {
    let token = {
        let existing = backend
            .state()
            .tokens
            .iter()
            .find(|(_, id)| **id == user_id)
            .map(|(t, _)| t.clone());
        existing.unwrap_or_else(|| backend.add_user(user_id, &format!("user{}", user_id)))
    };
    let base = backend.spawn().await;
    let (session, _) = session_with(&config_fn(&base), Some(&token));
    session.initialize().await;
    session
}

// -- Handlers --

fn bearer_user(state: &MockState, headers: &HeaderMap) -> Option<i64> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state.tokens.get(token).copied()
}

fn reject(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "msg": msg }))).into_response()
}

async fn check_user(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let mut state = backend.state();
    state.check_calls += 1;
    let Some(uid) = bearer_user(&state, &headers) else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication invalid");
    };
    let user = state.users.iter().find(|(u, _)| u.id == uid).map(|(u, _)| u.clone());
    match user {
        Some(user) => Json(user).into_response(),
        None => reject(StatusCode::UNAUTHORIZED, "Authentication invalid"),
    }
}

async fn register(State(backend): State<MockBackend>, Json(req): Json<RegisterRequest>) -> Response {
    let mut state = backend.state();
    if state.users.iter().any(|(u, _)| u.email == req.email) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "Msg": "Email already registered" }))).into_response();
    }
    state.next_id += 1;
    let id = state.next_id;
    state.users.push((
        User {
            id,
            username: req.username,
            first_name: req.firstname,
            last_name: req.lastname,
            email: req.email,
        },
        req.password,
    ));
    (StatusCode::CREATED, Json(json!({ "msg": "user registered" }))).into_response()
}

async fn login(State(backend): State<MockBackend>, Json(req): Json<LoginRequest>) -> Response {
    let mut state = backend.state();
    let found = state
        .users
        .iter()
        .find(|(u, pw)| u.email == req.email && *pw == req.password)
        .map(|(u, _)| u.clone());
    match found {
        Some(user) => {
            let token = format!("token-{}", user.id);
            state.tokens.insert(token.clone(), user.id);
            Json(json!({ "msg": "user login successful", "token": token, "username": user.username }))
                .into_response()
        }
        None => reject(StatusCode::UNAUTHORIZED, "Invalid credential"),
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: u32,
    limit: u32,
}

async fn list_questions(State(backend): State<MockBackend>, Query(q): Query<PageQuery>) -> Response {
    let (delay, status) = {
        let mut state = backend.state();
        state.list_calls += 1;
        (state.list_delays.get(&q.page).copied(), state.list_status)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = status {
        return reject(status, "list unavailable");
    }

    let state = backend.state();
    let mut questions = state.questions.clone();
    questions.sort_by_key(|q| q.id);
    let limit = q.limit.max(1) as usize;
    let total_pages = questions.len().div_ceil(limit);
    let start = (q.page.max(1) as usize - 1) * limit;
    let data: Vec<Question> = questions.into_iter().skip(start).take(limit).collect();
    Json(json!({ "data": data, "totalPages": total_pages })).into_response()
}

async fn get_question(State(backend): State<MockBackend>, Path(id): Path<i64>) -> Response {
    let delay = {
        let mut state = backend.state();
        state.question_fetches += 1;
        state.question_delay.take()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let state = backend.state();
    if state.fail_question_fetch {
        return reject(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let Some(question) = state.questions.iter().find(|q| q.id == id).cloned() else {
        return reject(StatusCode::NOT_FOUND, "question not found");
    };
    let mut answers: Vec<Answer> = state.answers.iter().filter(|a| a.question_id == id).cloned().collect();
    answers.sort_by_key(|a| a.created_at);
    Json(QuestionDetail { question, answers }).into_response()
}

async fn create_question(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(req): Json<CreateQuestionRequest>,
) -> Response {
    let mut state = backend.state();
    let Some(uid) = bearer_user(&state, &headers) else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication invalid");
    };
    if req.title.len() < 3 {
        return reject(StatusCode::BAD_REQUEST, "Title is too short");
    }
    state.next_id += 1;
    let id = state.next_id;
    let username = author_name(&state, uid);
    state.questions.push(Question {
        id,
        title: req.title,
        description: req.description,
        tag: req.tag,
        author_id: uid,
        author_username: username,
        created_at: Utc::now(),
    });
    (StatusCode::CREATED, Json(json!({ "msg": "question created" }))).into_response()
}

async fn delete_question(State(backend): State<MockBackend>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut state = backend.state();
    let Some(uid) = bearer_user(&state, &headers) else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication invalid");
    };
    let Some(pos) = state.questions.iter().position(|q| q.id == id) else {
        return reject(StatusCode::NOT_FOUND, "question not found");
    };
    if state.questions[pos].author_id != uid {
        return reject(StatusCode::FORBIDDEN, "You can only delete your own question");
    }
    state.questions.remove(pos);
    state.answers.retain(|a| a.question_id != id);
    Json(json!({ "msg": "question deleted" })).into_response()
}

fn push_answer(state: &mut MockState, question_id: i64, author_id: i64, body: String) {
    state.next_id += 1;
    let id = state.next_id;
    let username = author_name(state, author_id);
    state.answers.push(Answer {
        id,
        question_id,
        body,
        author_id,
        author_username: username,
        created_at: Utc::now(),
    });
}

async fn create_answer(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(req): Json<CreateAnswerRequest>,
) -> Response {
    let mut state = backend.state();
    state.answer_posts += 1;
    let Some(uid) = bearer_user(&state, &headers) else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication invalid");
    };
    push_answer(&mut state, req.questionid, uid, req.answer);
    (StatusCode::CREATED, Json(json!({ "msg": "answer posted" }))).into_response()
}

async fn delete_answer(State(backend): State<MockBackend>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut state = backend.state();
    let Some(uid) = bearer_user(&state, &headers) else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication invalid");
    };
    let Some(pos) = state.answers.iter().position(|a| a.id == id) else {
        return reject(StatusCode::NOT_FOUND, "answer not found");
    };
    if state.answers[pos].author_id != uid {
        return reject(StatusCode::FORBIDDEN, "You can only delete your own answer");
    }
    state.answers.remove(pos);
    Json(json!({ "msg": "answer deleted" })).into_response()
}

async fn ai_answer(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(req): Json<AiAnswerRequest>,
) -> Response {
    let (delay, status, uid) = {
        let mut state = backend.state();
        state.ai_posts += 1;
        (state.ai_delay, state.ai_status, bearer_user(&state, &headers))
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let Some(uid) = uid else {
        return reject(StatusCode::UNAUTHORIZED, "Authentication invalid");
    };
    if let Some(status) = status {
        return reject(status, "upstream says no");
    }

    let answer = format!("AI: {}", req.prompt);
    let mut state = backend.state();
    push_answer(&mut state, req.questionid, uid, answer.clone());
    (StatusCode::CREATED, Json(json!({ "answer": answer }))).into_response()
}
