use serde::{Deserialize, Serialize};

use crate::models::{AnswerId, Question, QuestionId, UserId};

// -- JWT Claims --

/// Bearer token claims issued by the backend and checked by the AI proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub userid: UserId,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// -- Questions --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsPage {
    pub data: Vec<Question>,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    pub userid: UserId,
    pub title: String,
    pub description: String,
    pub tag: String,
}

// -- Answers --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswerRequest {
    pub userid: UserId,
    pub answer: String,
    pub questionid: QuestionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answerid: Option<AnswerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

// -- AI --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiAnswerRequest {
    pub questionid: QuestionId,
    /// Blank or missing is rejected by the proxy with a 400, not a decode error.
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnswerResponse {
    pub answer: String,
}

// -- Errors --

/// Error body shape shared by the backend and the proxy. The backend is not
/// consistent about casing, so `Msg` is accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "Msg", skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn msg(msg: impl Into<String>) -> Self {
        Self { msg: Some(msg.into()), error: None }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self { msg: None, error: Some(error.into()) }
    }

    /// The most specific human-readable message in the body, if any.
    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().or(self.error.as_deref())
    }
}
