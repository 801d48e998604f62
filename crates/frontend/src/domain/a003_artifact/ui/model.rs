//! Artifacts - Model (API functions)

use contracts::domain::a003_artifact::ArtifactListResponse;

use crate::shared::download::download_authorized;
use crate::system::auth::api::fetch_with_auth;

/// Список артефактов сессии (валиден только после Finish Analysis)
pub async fn fetch_artifacts(access_token: &str) -> Result<ArtifactListResponse, String> {
    fetch_with_auth::<ArtifactListResponse>("/api/a003-artifact/list", access_token).await
}

/// Скачать один артефакт по ID
pub async fn download_artifact(
    file_id: &str,
    name: &str,
    access_token: &str,
) -> Result<(), String> {
    download_authorized(
        &format!("/api/a003-artifact/{}", file_id),
        name,
        access_token,
    )
    .await
}
