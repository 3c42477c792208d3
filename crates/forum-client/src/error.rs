use forum_types::api::ErrorBody;

pub const MSG_TIMED_OUT: &str = "Request timed out. Please try again.";
pub const MSG_NO_RESPONSE: &str =
    "No response from server. Please check your network or try again later.";
pub const MSG_UNAUTHORIZED: &str = "Unauthorized. Please login again.";
pub const MSG_RATE_LIMITED: &str = "Rate limit exceeded. Please try later.";
pub const MSG_GENERIC: &str = "Something went wrong. Please try again later.";

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
}

/// Classification used to pick user-facing messages and session policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Network,
    Unauthorized,
    Forbidden,
    RateLimited,
    Validation,
    NotFound,
    Server,
    Unknown,
}

impl ApiError {
    /// Build from a non-success response, keeping the backend's message if
    /// the body carries one.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message().map(str::to_string));
        Self::Status { status, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) => ErrorKind::Unknown,
            Self::Status { status, .. } => match status {
                400 => ErrorKind::Validation,
                401 => ErrorKind::Unauthorized,
                403 => ErrorKind::Forbidden,
                404 => ErrorKind::NotFound,
                429 => ErrorKind::RateLimited,
                500..=599 => ErrorKind::Server,
                _ => ErrorKind::Unknown,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// True when the request never produced a response.
    pub fn is_unanswered(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }

    /// Default user-facing text for this failure.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Timeout => MSG_TIMED_OUT.to_string(),
            ErrorKind::Network => MSG_NO_RESPONSE.to_string(),
            ErrorKind::Unauthorized | ErrorKind::Forbidden => MSG_UNAUTHORIZED.to_string(),
            ErrorKind::RateLimited => MSG_RATE_LIMITED.to_string(),
            ErrorKind::Validation => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "Invalid request.".to_string()),
            ErrorKind::NotFound | ErrorKind::Server | ErrorKind::Unknown => MSG_GENERIC.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
