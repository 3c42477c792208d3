//! Controller behind the standalone AI answer page (`/ai-answer/:id`): asks
//! the proxy for an answer to one question as soon as a user is present.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use forum_types::api::AiAnswerRequest;
use forum_types::models::{Question, QuestionId};

use crate::error::ApiError;
use crate::session::Session;

pub const MSG_AI_FETCH_FAILED: &str = "Failed to fetch AI answer. Please try again later.";

/// Prompt sent for a whole question: its title, then its description.
pub fn question_prompt(question: &Question) -> String {
    format!("{}\n\n{}", question.title.trim(), question.description.trim())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiAnswerView {
    pub loading: bool,
    pub error: Option<String>,
    pub answer: Option<String>,
}

#[derive(Clone)]
pub struct AiAnswerController {
    inner: Arc<AiAnswerInner>,
}

struct AiAnswerInner {
    session: Session,
    question_id: QuestionId,
    view: RwLock<AiAnswerView>,
}

impl AiAnswerController {
    pub fn new(session: Session, question_id: QuestionId) -> Self {
        Self {
            inner: Arc::new(AiAnswerInner {
                session,
                question_id,
                view: RwLock::new(AiAnswerView::default()),
            }),
        }
    }

    pub fn question_id(&self) -> QuestionId {
        self.inner.question_id
    }

    /// Generate the answer. Without a signed-in user nothing is requested and
    /// `Ok(false)` is returned.
    pub async fn load(&self) -> Result<bool, ApiError> {
        if !self.inner.session.is_authenticated().await {
            return Ok(false);
        }

        {
            let mut view = self.inner.view.write().await;
            view.loading = true;
            view.error = None;
        }

        let result = self.generate().await;

        let mut view = self.inner.view.write().await;
        view.loading = false;
        match result {
            Ok(answer) => {
                info!("AI answer ready for question {}", self.inner.question_id);
                view.answer = Some(answer);
                Ok(true)
            }
            Err(e) => {
                warn!("Error fetching AI answer for question {}: {}", self.inner.question_id, e);
                view.error = Some(MSG_AI_FETCH_FAILED.to_string());
                drop(view);
                self.inner.session.absorb(&e).await;
                Err(e)
            }
        }
    }

    async fn generate(&self) -> Result<String, ApiError> {
        let api = self.inner.session.api();
        let detail = api.get_question(self.inner.question_id).await?;
        let req = AiAnswerRequest {
            questionid: self.inner.question_id,
            prompt: question_prompt(&detail.question),
        };
        Ok(api.generate_ai_answer(&req).await?.answer)
    }

    pub async fn view(&self) -> AiAnswerView {
        self.inner.view.read().await.clone()
    }
}
