use tracing::{info, warn};

use forum_types::api::CreateQuestionRequest;
use forum_types::models::default_tag;

use crate::error::{ApiError, MSG_NO_RESPONSE};
use crate::guard::Route;
use crate::session::Session;

pub const MSG_LOGIN_TO_ASK: &str = "You must be logged in to post a question.";
pub const MSG_ASK_FAILED: &str = "Failed to create question. Please try again later.";

#[derive(Debug, thiserror::Error)]
pub enum AskError {
    /// No signed-in user; the caller should go to `redirect`.
    #[error("{msg}", msg = MSG_LOGIN_TO_ASK)]
    NotLoggedIn { redirect: Route },
    #[error("title and description are required")]
    MissingFields,
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
}

/// Post a new question as the signed-in user, then send them home.
pub async fn ask_question(
    session: &Session,
    title: &str,
    description: &str,
) -> Result<Route, AskError> {
    let Some(user) = session.user().await else {
        return Err(AskError::NotLoggedIn {
            redirect: Route::Auth,
        });
    };

    let title = title.trim();
    let description = description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(AskError::MissingFields);
    }

    let req = CreateQuestionRequest {
        userid: user.id,
        title: title.to_string(),
        description: description.to_string(),
        tag: default_tag(),
    };

    match session.api().create_question(&req).await {
        Ok(()) => {
            info!("Question created by {}", user.username);
            Ok(Route::Home)
        }
        Err(e) => {
            warn!("Error in creating question: {}", e);
            if let Some(route) = session.absorb(&e).await {
                return Err(AskError::NotLoggedIn { redirect: route });
            }
            let message = match e.server_message() {
                Some(msg) => msg.to_string(),
                None if e.is_unanswered() => MSG_NO_RESPONSE.to_string(),
                None => MSG_ASK_FAILED.to_string(),
            };
            Err(AskError::Api { message, source: e })
        }
    }
}
