//! Controller behind the question page: one question with its answers, the
//! answer and AI-prompt forms, and the owner-only edit/delete actions.
//!
//! Every successful mutation is followed by a fresh fetch before the call
//! returns, so whatever the caller reads next already reflects the write. The
//! controller never patches its own copy of the answer list; ids and ordering
//! come from the backend.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use forum_types::api::{AiAnswerRequest, CreateAnswerRequest};
use forum_types::models::{Answer, AnswerId, QuestionDetail, QuestionId, UserId};

use crate::error::{ApiError, ErrorKind, MSG_RATE_LIMITED, MSG_TIMED_OUT, MSG_UNAUTHORIZED};
use crate::guard::Route;
use crate::questions::LoadOutcome;
use crate::session::Session;

/// Answers longer than this many words are shown truncated until expanded.
pub const TRUNCATE_WORDS: usize = 50;

pub const MSG_LOGIN_TO_ANSWER: &str = "You must be logged in to submit an answer.";
pub const MSG_LOGIN_FOR_AI: &str = "You must be logged in to generate an AI answer.";
pub const MSG_ANSWER_FAILED: &str = "Failed to post answer. Please try again later.";
pub const MSG_AI_FAILED: &str = "Failed to generate AI answer. Please try again later.";
pub const MSG_AI_INVALID: &str = "Invalid request for AI answer.";
pub const MSG_DELETE_QUESTION_FAILED: &str = "Could not delete question. Please try again.";
pub const MSG_DELETE_ANSWER_FAILED: &str = "Could not delete answer. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Loaded(QuestionDetail),
    /// The fetch failed. `stale` is the last good copy of the same question,
    /// if there was one, for views that want to keep showing it marked stale.
    Error {
        message: String,
        stale: Option<QuestionDetail>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("answer is empty")]
    EmptyAnswer,
    #[error("Prompt is required.")]
    EmptyPrompt,
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl DetailError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyAnswer => "Please write an answer before posting.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// User-facing text for a failed AI request.
pub fn ai_failure_message(err: &ApiError) -> String {
    match err.kind() {
        ErrorKind::Unauthorized | ErrorKind::Forbidden => MSG_UNAUTHORIZED.to_string(),
        ErrorKind::RateLimited => MSG_RATE_LIMITED.to_string(),
        ErrorKind::Validation => err.server_message().unwrap_or(MSG_AI_INVALID).to_string(),
        ErrorKind::Timeout => MSG_TIMED_OUT.to_string(),
        _ => MSG_AI_FAILED.to_string(),
    }
}

// -- Confirmation --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPrompt {
    DeleteQuestion(QuestionId),
    DeleteAnswer(AnswerId),
}

impl ConfirmPrompt {
    pub fn title(&self) -> &'static str {
        "Are you sure?"
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::DeleteQuestion(_) => "This will permanently delete your question.",
            Self::DeleteAnswer(_) => "This will permanently delete your answer.",
        }
    }
}

/// Asks the user before a destructive call. The decision is made here; the
/// network call happens afterwards and only on `Confirmed`.
pub trait Confirm {
    fn confirm(&self, prompt: &ConfirmPrompt) -> impl Future<Output = Decision> + Send;
}

/// A fixed answer, for non-interactive callers.
impl Confirm for Decision {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> impl Future<Output = Decision> + Send {
        std::future::ready(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    /// Deleted. `navigate_to` is set when the current page no longer exists.
    Deleted { navigate_to: Option<Route> },
}

// -- View --

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub answer: Answer,
    pub text: String,
    pub truncated: bool,
    pub expanded: bool,
    pub can_modify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub state: DetailState,
    pub can_modify_question: bool,
    pub answers: Vec<AnswerView>,
    pub answer_draft: String,
    pub ai_prompt: String,
}

/// First `limit` words of `text`, and whether anything was cut. Any run of
/// whitespace separates words; a cut text is rejoined with single spaces.
pub fn truncate_words(text: &str, limit: usize) -> (String, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > limit {
        (words[..limit].join(" "), true)
    } else {
        (text.to_string(), false)
    }
}

// -- Controller --

#[derive(Debug, Default)]
struct DetailData {
    question_id: QuestionId,
    phase: Option<DetailState>,
    last_loaded: Option<QuestionDetail>,
    answer_draft: String,
    ai_prompt: String,
    expanded: Option<AnswerId>,
}

#[derive(Clone)]
pub struct QuestionDetailController {
    inner: Arc<DetailInner>,
}

struct DetailInner {
    session: Session,
    latest: AtomicU64,
    data: RwLock<DetailData>,
}

impl QuestionDetailController {
    pub fn new(session: Session, question_id: QuestionId) -> Self {
        Self {
            inner: Arc::new(DetailInner {
                session,
                latest: AtomicU64::new(0),
                data: RwLock::new(DetailData {
                    question_id,
                    ..Default::default()
                }),
            }),
        }
    }

    pub async fn question_id(&self) -> QuestionId {
        self.inner.data.read().await.question_id
    }

    pub async fn state(&self) -> DetailState {
        self.inner
            .data
            .read()
            .await
            .phase
            .clone()
            .unwrap_or(DetailState::Loading)
    }

    /// Load `id` with its answers. Only the most recent fetch is applied.
    pub async fn fetch_question(&self, id: QuestionId) -> Result<LoadOutcome, ApiError> {
        let seq = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut data = self.inner.data.write().await;
            if data.question_id != id {
                data.question_id = id;
                data.last_loaded = None;
                data.expanded = None;
            }
            data.phase = Some(DetailState::Loading);
        }

        let result = self.inner.session.api().get_question(id).await;

        let mut data = self.inner.data.write().await;
        if self.inner.latest.load(Ordering::SeqCst) != seq {
            debug!("Dropping superseded fetch of question {}", id);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(detail) => {
                data.last_loaded = Some(detail.clone());
                data.phase = Some(DetailState::Loaded(detail));
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                warn!("Error fetching question {}: {}", id, e);
                let stale = data.last_loaded.clone();
                data.phase = Some(DetailState::Error {
                    message: e.user_message(),
                    stale,
                });
                drop(data);
                self.inner.session.absorb(&e).await;
                Err(e)
            }
        }
    }

    pub async fn refetch(&self) -> Result<LoadOutcome, ApiError> {
        let id = self.question_id().await;
        self.fetch_question(id).await
    }

    // -- Drafts --

    pub async fn set_answer_draft(&self, text: &str) {
        self.inner.data.write().await.answer_draft = text.to_string();
    }

    pub async fn set_ai_prompt(&self, text: &str) {
        self.inner.data.write().await.ai_prompt = text.to_string();
    }

    /// Post the answer draft for the current question.
    pub async fn submit_answer(&self) -> Result<(), DetailError> {
        let (question_id, body) = {
            let data = self.inner.data.read().await;
            (data.question_id, data.answer_draft.clone())
        };
        let user_id = self.inner.session.user().await.map(|u| u.id);
        self.post_answer(question_id, user_id, &body).await
    }

    /// Send the AI prompt for the current question.
    pub async fn submit_ai_prompt(&self) -> Result<(), DetailError> {
        let (question_id, prompt) = {
            let data = self.inner.data.read().await;
            (data.question_id, data.ai_prompt.clone())
        };
        self.post_ai_answer(question_id, &prompt).await
    }

    // -- Mutations --

    /// Create an answer, clear the draft and reload the question. Missing
    /// credentials or an empty body are rejected here without touching the
    /// network.
    pub async fn post_answer(
        &self,
        question_id: QuestionId,
        user_id: Option<UserId>,
        body: &str,
    ) -> Result<(), DetailError> {
        let api = self.inner.session.api();
        if api.token().is_none() {
            return Err(DetailError::Unauthorized(MSG_LOGIN_TO_ANSWER));
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(DetailError::EmptyAnswer);
        }
        let Some(user_id) = user_id else {
            return Err(DetailError::Unauthorized(MSG_LOGIN_TO_ANSWER));
        };

        let req = CreateAnswerRequest {
            userid: user_id,
            answer: body.to_string(),
            questionid: question_id,
        };
        if let Err(e) = api.create_answer(&req).await {
            warn!("Error posting answer: {}", e);
            self.inner.session.absorb(&e).await;
            return Err(DetailError::Api {
                message: MSG_ANSWER_FAILED.to_string(),
                source: e,
            });
        }

        info!("Answer posted to question {}", question_id);
        self.inner.data.write().await.answer_draft.clear();
        self.reload_after_write(question_id).await;
        Ok(())
    }

    /// Ask the AI proxy to answer, then reload the question. A failed request
    /// leaves the question as it was and does not refetch.
    pub async fn post_ai_answer(
        &self,
        question_id: QuestionId,
        prompt: &str,
    ) -> Result<(), DetailError> {
        let api = self.inner.session.api();
        if api.token().is_none() {
            return Err(DetailError::Unauthorized(MSG_LOGIN_FOR_AI));
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DetailError::EmptyPrompt);
        }

        let req = AiAnswerRequest {
            questionid: question_id,
            prompt: prompt.to_string(),
        };
        if let Err(e) = api.generate_ai_answer(&req).await {
            warn!("Error posting AI answer: {}", e);
            self.inner.session.absorb(&e).await;
            return Err(DetailError::Api {
                message: ai_failure_message(&e),
                source: e,
            });
        }

        info!("AI answer generated for question {}", question_id);
        self.inner.data.write().await.ai_prompt.clear();
        self.reload_after_write(question_id).await;
        Ok(())
    }

    pub async fn delete_question(
        &self,
        id: QuestionId,
        confirm: &impl Confirm,
    ) -> Result<DeleteOutcome, DetailError> {
        let decision = confirm.confirm(&ConfirmPrompt::DeleteQuestion(id)).await;
        self.execute_delete_question(id, decision).await
    }

    /// Second phase of a question delete. On success the page is gone, so
    /// the outcome points back home.
    pub async fn execute_delete_question(
        &self,
        id: QuestionId,
        decision: Decision,
    ) -> Result<DeleteOutcome, DetailError> {
        if decision == Decision::Declined {
            return Ok(DeleteOutcome::Declined);
        }

        match self.inner.session.api().delete_question(id).await {
            Ok(()) => {
                info!("Question {} deleted", id);
                Ok(DeleteOutcome::Deleted {
                    navigate_to: Some(Route::Home),
                })
            }
            Err(e) => {
                warn!("Error deleting question {}: {}", id, e);
                self.inner.session.absorb(&e).await;
                Err(delete_failure(e, MSG_DELETE_QUESTION_FAILED))
            }
        }
    }

    pub async fn delete_answer(
        &self,
        id: AnswerId,
        confirm: &impl Confirm,
    ) -> Result<DeleteOutcome, DetailError> {
        let decision = confirm.confirm(&ConfirmPrompt::DeleteAnswer(id)).await;
        self.execute_delete_answer(id, decision).await
    }

    /// Second phase of an answer delete: stays on the page and reloads it.
    pub async fn execute_delete_answer(
        &self,
        id: AnswerId,
        decision: Decision,
    ) -> Result<DeleteOutcome, DetailError> {
        if decision == Decision::Declined {
            return Ok(DeleteOutcome::Declined);
        }

        if let Err(e) = self.inner.session.api().delete_answer(id).await {
            warn!("Error deleting answer {}: {}", id, e);
            self.inner.session.absorb(&e).await;
            return Err(delete_failure(e, MSG_DELETE_ANSWER_FAILED));
        }

        info!("Answer {} deleted", id);
        let question_id = self.question_id().await;
        self.reload_after_write(question_id).await;
        Ok(DeleteOutcome::Deleted { navigate_to: None })
    }

    pub fn edit_question(&self, id: QuestionId) -> Route {
        Route::EditQuestion(id)
    }

    pub fn edit_answer(&self, id: AnswerId) -> Route {
        Route::EditAnswer(id)
    }

    // -- Presentation --

    /// Show or hide the full text of one answer. Opening one closes any other.
    pub async fn toggle_expand(&self, answer_id: AnswerId) {
        let mut data = self.inner.data.write().await;
        data.expanded = if data.expanded == Some(answer_id) {
            None
        } else {
            Some(answer_id)
        };
    }

    pub async fn view(&self) -> DetailView {
        let viewer = self.inner.session.user().await.map(|u| u.id);
        let data = self.inner.data.read().await;
        let state = data.phase.clone().unwrap_or(DetailState::Loading);

        let (can_modify_question, answers) = match &state {
            DetailState::Loaded(detail) => {
                let owns_question = viewer.is_some_and(|uid| detail.question.is_owned_by(uid));
                let answers = detail
                    .answers
                    .iter()
                    .map(|answer| {
                        let expanded = data.expanded == Some(answer.id);
                        let (text, truncated) = if expanded {
                            (answer.body.clone(), false)
                        } else {
                            truncate_words(&answer.body, TRUNCATE_WORDS)
                        };
                        AnswerView {
                            answer: answer.clone(),
                            text,
                            truncated,
                            expanded,
                            can_modify: viewer.is_some_and(|uid| answer.is_owned_by(uid)),
                        }
                    })
                    .collect();
                (owns_question, answers)
            }
            _ => (false, Vec::new()),
        };

        DetailView {
            state,
            can_modify_question,
            answers,
            answer_draft: data.answer_draft.clone(),
            ai_prompt: data.ai_prompt.clone(),
        }
    }

    /// The write already succeeded; a failing reload is reported through the
    /// state, not as a failure of the write.
    async fn reload_after_write(&self, question_id: QuestionId) {
        if let Err(e) = self.fetch_question(question_id).await {
            warn!("Reload after write failed for question {}: {}", question_id, e);
        }
    }
}

fn delete_failure(err: ApiError, fallback: &str) -> DetailError {
    let message = match err.kind() {
        ErrorKind::Forbidden | ErrorKind::Validation | ErrorKind::NotFound => err
            .server_message()
            .unwrap_or(fallback)
            .to_string(),
        _ => fallback.to_string(),
    };
    DetailError::Api {
        message,
        source: err,
    }
}
