use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error, info, warn};

use forum_types::api::{AiAnswerRequest, AiAnswerResponse, Claims, CreateAnswerRequest, ErrorBody};

use crate::AppState;
use crate::completion::CompletionError;
use crate::middleware::BearerToken;

pub const MSG_PROMPT_REQUIRED: &str = "Prompt is required.";
pub const MSG_INVALID_BODY: &str = "Request must be JSON with a numeric questionid and a prompt.";
pub const MSG_RATE_LIMITED: &str = "Rate limit exceeded. Please try later.";
pub const MSG_GENERATION_FAILED: &str = "Failed to generate AI response";
pub const MSG_SAVE_FAILED: &str = "Failed to save AI answer";

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorBody>)>;

/// POST /ai/answer - generate an answer for a question and, when a backend is
/// configured, store it there as the caller.
pub async fn generate_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    payload: Result<Json<AiAnswerRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload.map_err(|rejection| {
        debug!("Rejected AI request body: {}", rejection.body_text());
        (StatusCode::BAD_REQUEST, Json(ErrorBody::msg(MSG_INVALID_BODY)))
    })?;
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorBody::msg(MSG_PROMPT_REQUIRED))));
    }

    let answer = state.completion.complete(prompt).await.map_err(|e| match e {
        CompletionError::RateLimited => {
            warn!("AI upstream rate limited for user {}", claims.userid);
            (StatusCode::TOO_MANY_REQUESTS, Json(ErrorBody::msg(MSG_RATE_LIMITED)))
        }
        other => {
            error!("Error generating AI response: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::error(MSG_GENERATION_FAILED)),
            )
        }
    })?;

    if let Some(backend) = &state.backend_url {
        let url = format!("{}/answer", backend.trim_end_matches('/'));
        let body = CreateAnswerRequest {
            userid: claims.userid,
            answer: answer.clone(),
            questionid: req.questionid,
        };
        let saved = state
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());
        if let Err(e) = saved {
            error!("Error saving AI answer for question {}: {}", req.questionid, e);
            return Err((StatusCode::BAD_GATEWAY, Json(ErrorBody::error(MSG_SAVE_FAILED))));
        }
    }

    info!(
        "AI answer generated for question {} by {}",
        req.questionid, claims.username
    );
    Ok((StatusCode::CREATED, Json(AiAnswerResponse { answer })))
}
