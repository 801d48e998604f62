use std::convert::Infallible;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::a002_conversation::service;
use crate::shared::assistant::get_client;
use crate::shared::config;
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::jwt;
use contracts::domain::a002_conversation::AskRequest;

/// Параметры потокового вопроса.
///
/// Токен идёт query-параметром: браузерный EventSource не умеет
/// выставлять заголовок Authorization.
#[derive(Deserialize)]
pub struct AskParams {
    pub token: String,
    pub question: String,
    #[serde(default)]
    pub force_code_interpreter: bool,
}

/// GET /api/a002-conversation/ask (SSE)
pub async fn ask(
    Query(params): Query<AskParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    // 1. Аутентификация по токену из query
    let claims = jwt::validate_token(&params.token).map_err(|_| StatusCode::UNAUTHORIZED)?;
    let session_id = Uuid::parse_str(&claims.sub).map_err(|_| StatusCode::UNAUTHORIZED)?;

    if params.question.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // 2. Фоновая отправка; приёмник отдаёт события в SSE-поток
    let request = AskRequest {
        question: params.question,
        force_code_interpreter: params.force_code_interpreter,
    };
    let run_timeout = Duration::from_secs(config::get_config().assistant.run_timeout_secs);
    let mut rx = service::submit_question(get_client(), session_id, request, run_timeout)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let done = event.is_done();
            let payload = serde_json::to_string(&event).unwrap_or_default();
            yield Ok(Event::default().event(event.event_type()).data(payload));
            if done {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// POST /api/a002-conversation/cancel
pub async fn cancel(user: CurrentUser) -> Result<StatusCode, StatusCode> {
    let session_id = user.session_id()?;
    match service::cancel(get_client(), &session_id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}
