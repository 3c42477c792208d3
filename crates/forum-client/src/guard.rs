//! Navigation targets and the guard that keeps protected views behind a session.

use std::fmt;

use forum_types::models::{AnswerId, QuestionId, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Auth,
    Login,
    Ask,
    Question(QuestionId),
    EditQuestion(QuestionId),
    EditAnswer(AnswerId),
    AiAnswer(QuestionId),
    Terms,
    PrivacyPolicy,
}

impl Route {
    pub fn requires_session(&self) -> bool {
        match self {
            Self::Home
            | Self::Ask
            | Self::Question(_)
            | Self::EditQuestion(_)
            | Self::EditAnswer(_)
            | Self::AiAnswer(_) => true,
            Self::Auth | Self::Login | Self::Terms | Self::PrivacyPolicy => false,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Auth => "/auth".to_string(),
            Self::Login => "/login".to_string(),
            Self::Ask => "/ask".to_string(),
            Self::Question(id) => format!("/question/{}", id),
            Self::EditQuestion(id) => format!("/question/edit/{}", id),
            Self::EditAnswer(id) => format!("/answer/edit/{}", id),
            Self::AiAnswer(id) => format!("/ai-answer/{}", id),
            Self::Terms => "/terms".to_string(),
            Self::PrivacyPolicy => "/PrivacyPolicy".to_string(),
        }
    }

    /// Parse a path such as `/question/42`. Query strings and a trailing
    /// slash are ignored. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(&['?', '#'][..]).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let id = |s: &str| s.parse::<i64>().ok();

        match segments.as_slice() {
            [] => Some(Self::Home),
            ["auth"] => Some(Self::Auth),
            ["login"] => Some(Self::Login),
            ["ask"] => Some(Self::Ask),
            ["terms"] => Some(Self::Terms),
            ["PrivacyPolicy"] => Some(Self::PrivacyPolicy),
            ["question", "edit", qid] => id(*qid).map(Self::EditQuestion),
            ["question", qid] => id(*qid).map(Self::Question),
            ["answer", "edit", aid] => id(*aid).map(Self::EditAnswer),
            ["ai-answer", qid] => id(*qid).map(Self::AiAnswer),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What the router should mount. `Redirect` means nothing else is mounted, so
/// a protected view never gets a chance to start its own fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
}

/// Decide what to mount for `target` given the current user.
pub fn guard(user: Option<&User>, target: Route) -> GuardDecision {
    if target.requires_session() && user.is_none() {
        GuardDecision::Redirect(Route::Login)
    } else {
        GuardDecision::Render(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "abebe".into(),
            first_name: "Abebe".into(),
            last_name: "Bikila".into(),
            email: "abebe@example.com".into(),
        }
    }

    #[test]
    fn anonymous_is_redirected_from_protected_routes() {
        for route in [Route::Home, Route::Ask, Route::Question(3), Route::AiAnswer(3)] {
            assert_eq!(guard(None, route), GuardDecision::Redirect(Route::Login));
        }
    }

    #[test]
    fn public_routes_render_without_session() {
        for route in [Route::Auth, Route::Login, Route::Terms, Route::PrivacyPolicy] {
            assert_eq!(guard(None, route), GuardDecision::Render(route));
        }
    }

    #[test]
    fn signed_in_user_gets_requested_view() {
        let u = user();
        assert_eq!(
            guard(Some(&u), Route::Question(9)),
            GuardDecision::Render(Route::Question(9))
        );
    }

    #[test]
    fn paths_parse_back_to_routes() {
        let routes = [
            Route::Home,
            Route::Auth,
            Route::Ask,
            Route::Question(12),
            Route::EditQuestion(12),
            Route::EditAnswer(5),
            Route::AiAnswer(12),
            Route::PrivacyPolicy,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
        assert_eq!(Route::parse("/question/12/?tab=answers"), Some(Route::Question(12)));
        assert_eq!(Route::parse("/question/abc"), None);
        assert_eq!(Route::parse("/nope"), None);
    }
}
