mod support;

use axum::http::StatusCode;
use forum_client::ai_answer::{AiAnswerController, AiAnswerView, MSG_AI_FETCH_FAILED};
use support::{MockBackend, config, session_with, signed_in};

fn forum() -> MockBackend {
    let backend = MockBackend::new();
    backend.add_user(1, "abebe");
    backend.add_question(10, 1, "Borrowing in closures", "Why does move fix it?");
    backend
}

#[tokio::test]
async fn answers_the_whole_question() {
    let backend = forum();
    let session = signed_in(&backend, 1, config).await;
    let page = AiAnswerController::new(session, 10);

    assert!(page.load().await.unwrap());
    let view = page.view().await;
    assert!(!view.loading);
    assert!(view.error.is_none());
    assert_eq!(
        view.answer.as_deref(),
        Some("AI: Borrowing in closures\n\nWhy does move fix it?")
    );
    assert_eq!(backend.state().ai_posts, 1);
}

#[tokio::test]
async fn waits_for_a_user() {
    let backend = forum();
    let base = backend.spawn().await;
    let (session, _) = session_with(&config(&base), Some("token-1"));
    let page = AiAnswerController::new(session, 10);

    assert!(!page.load().await.unwrap());
    assert_eq!(page.view().await, AiAnswerView::default());
    assert_eq!(backend.state().ai_posts, 0);
    assert_eq!(backend.state().question_fetches, 0);
}

#[tokio::test]
async fn failure_sets_error_and_stops_loading() {
    let backend = forum();
    backend.state().ai_status = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let session = signed_in(&backend, 1, config).await;
    let page = AiAnswerController::new(session, 10);

    assert!(page.load().await.is_err());
    let view = page.view().await;
    assert!(!view.loading);
    assert_eq!(view.error.as_deref(), Some(MSG_AI_FETCH_FAILED));
    assert!(view.answer.is_none());
}
