//! The session: who is logged in, derived from the persisted bearer token.
//!
//! One `Session` is constructed at start-up and cloned into every controller.
//! Reads and writes go through its methods; there is no global state.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::RwLock;
use tracing::{info, warn};

use forum_types::api::{LoginRequest, RegisterRequest};
use forum_types::models::User;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorKind};
use crate::guard::{self, GuardDecision, Route};
use crate::token::{FileTokenStore, TokenStore, TokenStoreError};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,}$").expect("name pattern is valid"));

pub const MSG_INVALID_NAME: &str = "Please enter valid first and last name. \
     Names should contain only letters and be at least two characters.";

/// Outcome of [`Session::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStart {
    Authenticated(User),
    Redirect(Route),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("first and last name must be letters only, at least two")]
    InvalidName,
    #[error("email and password are required")]
    MissingCredentials,
    #[error("login response did not include a token")]
    MissingToken,
    #[error("registered, but logging in failed: {0}")]
    LoginAfterRegister(#[source] Box<SessionError>),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] TokenStoreError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidName => MSG_INVALID_NAME.to_string(),
            Self::MissingCredentials => "Please enter your email and password.".to_string(),
            Self::LoginAfterRegister(_) => {
                "An error occurred during login. Please try again.".to_string()
            }
            Self::Api(e) => e
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| e.user_message()),
            Self::MissingToken | Self::Store(_) => {
                "Login failed. Please try again.".to_string()
            }
        }
    }
}

/// Sign-up form as entered by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    /// First and last name must be letters only, at least two of them.
    pub fn names_are_valid(&self) -> bool {
        NAME_PATTERN.is_match(self.first_name.trim()) && NAME_PATTERN.is_match(self.last_name.trim())
    }
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    user: RwLock<Option<User>>,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                user: RwLock::new(None),
            }),
        }
    }

    /// Session over the file token store at `config.token_path`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_path));
        Ok(Self::new(ApiClient::new(config, tokens)?))
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.user.read().await.is_some()
    }

    pub fn has_token(&self) -> bool {
        self.inner.api.token().is_some()
    }

    /// Validate the persisted token against `/user/check`. Any failure is
    /// "not authenticated": the token is dropped and the caller is sent to
    /// the auth view.
    pub async fn initialize(&self) -> SessionStart {
        if !self.has_token() {
            info!("No stored token, redirecting to {}", Route::Auth);
            *self.inner.user.write().await = None;
            return SessionStart::Redirect(Route::Auth);
        }

        match self.inner.api.check_user().await {
            Ok(user) => {
                info!("Session restored for {}", user.username);
                self.set_user(user.clone()).await;
                SessionStart::Authenticated(user)
            }
            Err(e) => {
                warn!("Stored token rejected: {}", e);
                self.clear().await;
                SessionStart::Redirect(Route::Auth)
            }
        }
    }

    pub async fn set_user(&self, user: User) {
        *self.inner.user.write().await = Some(user);
    }

    /// Forget the token and the user.
    pub async fn clear(&self) {
        if let Err(e) = self.inner.api.tokens().remove() {
            warn!("Failed to remove stored token: {}", e);
        }
        *self.inner.user.write().await = None;
    }

    pub async fn logout(&self) -> Route {
        self.clear().await;
        info!("Logged out");
        Route::Auth
    }

    /// Apply session policy to a failed call. A 401 means the token is no
    /// longer good, so the session is cleared and the auth view returned.
    pub async fn absorb(&self, err: &ApiError) -> Option<Route> {
        if err.kind() == ErrorKind::Unauthorized {
            warn!("Backend rejected our token, clearing session");
            self.clear().await;
            return Some(Route::Auth);
        }
        None
    }

    pub async fn guard(&self, target: Route) -> GuardDecision {
        let user = self.inner.user.read().await;
        guard::guard(user.as_ref(), target)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let resp = self
            .inner
            .api
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        if resp.token.is_empty() {
            return Err(SessionError::MissingToken);
        }
        self.inner.api.tokens().save(&resp.token)?;

        match self.inner.api.check_user().await {
            Ok(user) => {
                info!("Logged in as {}", user.username);
                self.set_user(user.clone()).await;
                Ok(user)
            }
            Err(e) => {
                self.clear().await;
                Err(e.into())
            }
        }
    }

    /// Register, then log straight in with the same credentials.
    pub async fn register(&self, form: &RegistrationForm) -> Result<User, SessionError> {
        if !form.names_are_valid() {
            return Err(SessionError::InvalidName);
        }

        self.inner
            .api
            .register(&RegisterRequest {
                username: form.username.trim().to_string(),
                firstname: form.first_name.trim().to_string(),
                lastname: form.last_name.trim().to_string(),
                email: form.email.trim().to_string(),
                password: form.password.clone(),
            })
            .await?;
        info!("Registered {}", form.username.trim());

        self.login(&form.email, &form.password)
            .await
            .map_err(|e| SessionError::LoginAfterRegister(Box::new(e)))
    }
}
