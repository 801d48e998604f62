use axum::{http::StatusCode, Json};
use contracts::domain::a001_analysis_session::SessionView;

use crate::domain::a001_analysis_session::service;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/a001-session
pub async fn get_current(user: CurrentUser) -> Result<Json<SessionView>, StatusCode> {
    let session_id = user.session_id()?;
    match service::get_view(&session_id) {
        Ok(view) => Ok(Json(view)),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /api/a001-session/finish
pub async fn finish(user: CurrentUser) -> Result<Json<SessionView>, StatusCode> {
    let session_id = user.session_id()?;
    if service::finish(&session_id).is_err() {
        return Err(StatusCode::NOT_FOUND);
    }
    match service::get_view(&session_id) {
        Ok(view) => Ok(Json(view)),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}
