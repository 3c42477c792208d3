//! Client side of the forum: token persistence, the session, route guarding,
//! and the controllers behind the question list, question detail and ask
//! views. Rendering is left to the caller; everything here produces plain
//! view state.

pub mod ai_answer;
pub mod api;
pub mod ask;
pub mod config;
pub mod detail;
pub mod error;
pub mod guard;
pub mod pagination;
pub mod questions;
pub mod session;
pub mod token;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use guard::{GuardDecision, Route, guard};
pub use session::Session;
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
