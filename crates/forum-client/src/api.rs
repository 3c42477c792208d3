//! The single point of HTTP egress to the forum backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use forum_types::api::{
    AiAnswerRequest, AiAnswerResponse, CreateAnswerRequest, CreateQuestionRequest, LoginRequest,
    LoginResponse, QuestionsPage, RegisterRequest,
};
use forum_types::models::{AnswerId, QuestionDetail, QuestionId, User};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::token::TokenStore;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    ai_timeout: Duration,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').into(),
            ai_timeout: config.ai_timeout,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Snapshot of the persisted token, read at call time.
    pub fn token(&self) -> Option<String> {
        self.tokens.load()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let req = self.http.request(method, url);
        match self.tokens.load() {
            Some(token) => req.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    // -- Users --

    pub async fn check_user(&self) -> Result<User, ApiError> {
        let resp = send(self.request(Method::GET, "/user/check")).await?;
        json(resp).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<(), ApiError> {
        let resp = send(self.request(Method::POST, "/user/register").json(req)).await?;
        expect_status(resp, StatusCode::CREATED).await.map(drop)
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let resp = send(self.request(Method::POST, "/user/login").json(req)).await?;
        json(resp).await
    }

    // -- Questions --

    pub async fn list_questions(&self, page: u32, limit: u32) -> Result<QuestionsPage, ApiError> {
        let req = self
            .request(Method::GET, "/questions")
            .query(&[("page", page), ("limit", limit)]);
        json(send(req).await?).await
    }

    pub async fn get_question(&self, id: QuestionId) -> Result<QuestionDetail, ApiError> {
        let resp = send(self.request(Method::GET, &format!("/question/{}", id))).await?;
        let mut detail: QuestionDetail = json(resp).await?;
        for answer in &mut detail.answers {
            if answer.question_id == 0 {
                answer.question_id = detail.question.id;
            }
        }
        Ok(detail)
    }

    pub async fn create_question(&self, req: &CreateQuestionRequest) -> Result<(), ApiError> {
        let resp = send(self.request(Method::POST, "/question").json(req)).await?;
        expect_status(resp, StatusCode::CREATED).await.map(drop)
    }

    pub async fn delete_question(&self, id: QuestionId) -> Result<(), ApiError> {
        let resp = send(self.request(Method::DELETE, &format!("/question/{}", id))).await?;
        expect_success(resp).await.map(drop)
    }

    // -- Answers --

    pub async fn create_answer(&self, req: &CreateAnswerRequest) -> Result<(), ApiError> {
        let resp = send(self.request(Method::POST, "/answer").json(req)).await?;
        expect_status(resp, StatusCode::CREATED).await.map(drop)
    }

    pub async fn delete_answer(&self, id: AnswerId) -> Result<(), ApiError> {
        let resp = send(self.request(Method::DELETE, &format!("/answer/{}", id))).await?;
        expect_success(resp).await.map(drop)
    }

    /// Ask the AI proxy for an answer. Uses the longer AI timeout.
    pub async fn generate_ai_answer(
        &self,
        req: &AiAnswerRequest,
    ) -> Result<AiAnswerResponse, ApiError> {
        let builder = self
            .request(Method::POST, "/ai/answer")
            .timeout(self.ai_timeout)
            .json(req);
        let resp = expect_status(send(builder).await?, StatusCode::CREATED).await?;
        resp.json().await.map_err(ApiError::from)
    }
}

async fn send(req: RequestBuilder) -> Result<Response, ApiError> {
    req.send().await.map_err(|e| {
        let err = ApiError::from(e);
        warn!("Request failed: {}", err);
        err
    })
}

async fn expect_success(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let err = ApiError::from_response(status.as_u16(), &body);
    warn!("Backend rejected request: {}", err);
    Err(err)
}

/// Creation endpoints signal success with one specific code; any other 2xx
/// is treated as a failure carrying the backend's message.
async fn expect_status(resp: Response, expected: StatusCode) -> Result<Response, ApiError> {
    let resp = expect_success(resp).await?;
    if resp.status() == expected {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::from_response(status, &body))
}

async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    expect_success(resp).await?.json().await.map_err(ApiError::from)
}
