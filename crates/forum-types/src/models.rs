use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type QuestionId = i64;
pub type AnswerId = i64;

/// Profile returned by `/user/check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userid")]
    pub id: UserId,
    pub username: String,
    #[serde(rename = "firstname", default)]
    pub first_name: String,
    #[serde(rename = "lastname", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "questionid")]
    pub id: QuestionId,
    pub title: String,
    pub description: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(rename = "userid")]
    pub author_id: UserId,
    // The detail endpoint prefixes question columns with `qtn_`.
    #[serde(rename = "username", alias = "qtn_username")]
    pub author_username: String,
    #[serde(rename = "createdAt", alias = "qtn_createdAt")]
    pub created_at: DateTime<Utc>,
}

pub fn default_tag() -> String {
    "General".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "answerid")]
    pub id: AnswerId,
    /// Nested answers may omit this; the client fills it from the parent.
    #[serde(rename = "questionid", default)]
    pub question_id: QuestionId,
    #[serde(rename = "answer")]
    pub body: String,
    #[serde(rename = "userid")]
    pub author_id: UserId,
    #[serde(rename = "username")]
    pub author_username: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A question with its answers, oldest first as the backend returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

impl Answer {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}
