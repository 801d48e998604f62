use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use contracts::domain::a003_artifact::ArtifactListResponse;

use crate::domain::a003_artifact::service;
use crate::shared::assistant::get_client;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/a003-artifact/list
pub async fn list(user: CurrentUser) -> Result<Json<ArtifactListResponse>, StatusCode> {
    let session_id = user.session_id()?;
    let api = get_client();
    match service::list_for_download(api.as_ref(), &session_id).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::warn!(session = %session_id, "artifact list failed: {e}");
            Err(StatusCode::CONFLICT)
        }
    }
}

/// GET /api/a003-artifact/:file_id
pub async fn download(
    user: CurrentUser,
    Path(file_id): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), StatusCode> {
    let session_id = user.session_id()?;
    let api = get_client();
    let artifact = service::download(api.as_ref(), &session_id, &file_id)
        .await
        .map_err(|e| {
            tracing::warn!(session = %session_id, file = %file_id, "download failed: {e}");
            StatusCode::NOT_FOUND
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "application/octet-stream"
            .parse()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", artifact.name.replace('"', "_"))
            .parse()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
    );
    Ok((headers, artifact.bytes.clone()))
}
