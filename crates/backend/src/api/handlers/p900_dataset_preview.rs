use axum::http::StatusCode;
use axum::Json;
use contracts::projections::p900_dataset_preview::DatasetPreview;

use crate::projections::p900_dataset_preview::service;
use crate::shared::config;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/p900/dataset-preview
///
/// Отказ предпросмотра не валит страницу: клиент получает текст ошибки
/// и показывает его на месте таблицы.
pub async fn get(_user: CurrentUser) -> Result<Json<DatasetPreview>, (StatusCode, String)> {
    let dataset = &config::get_config().dataset;
    match service::build_preview(&dataset.path, dataset.preview_rows) {
        Ok(preview) => Ok(Json(preview)),
        Err(e) => {
            tracing::warn!("dataset preview failed: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
