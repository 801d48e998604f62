use crate::shared::assistant::AssistantApi;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Готовый к скачиванию артефакт: имя + содержимое
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    pub file_id: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Кэш по ID файла: содержимое артефактов неизменяемо на стороне сервиса,
/// повторные открытия панели скачивания не тянут байты заново. Порядок
/// выдачи от кэша не зависит.
static CACHE: Lazy<RwLock<HashMap<String, Arc<DownloadArtifact>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn cache_get(file_id: &str) -> Option<Arc<DownloadArtifact>> {
    CACHE.read().expect("artifact cache poisoned").get(file_id).cloned()
}

fn cache_put(artifact: Arc<DownloadArtifact>) {
    CACHE
        .write()
        .expect("artifact cache poisoned")
        .insert(artifact.file_id.clone(), artifact);
}

/// Выбросить байты файлов из кэша (вместе с их истёкшей сессией)
pub fn evict(file_ids: &[String]) {
    if file_ids.is_empty() {
        return;
    }
    let mut cache = CACHE.write().expect("artifact cache poisoned");
    for file_id in file_ids {
        cache.remove(file_id);
    }
}

/// Получить один артефакт (имя + байты), с кэшем.
///
/// Имя берётся из метаданных файла; если метаданные недоступны или имя
/// пустое — остаётся сырой ID.
pub async fn fetch_artifact(
    api: &dyn AssistantApi,
    file_id: &str,
) -> anyhow::Result<Arc<DownloadArtifact>> {
    if let Some(hit) = cache_get(file_id) {
        return Ok(hit);
    }

    let name = match api.file_metadata(file_id).await {
        Ok(meta) if !meta.filename.trim().is_empty() => display_name(&meta.filename),
        Ok(_) => file_id.to_string(),
        Err(e) => {
            tracing::warn!(file = %file_id, "file metadata unavailable: {e}");
            file_id.to_string()
        }
    };
    let bytes = api.file_content(file_id).await?;

    let artifact = Arc::new(DownloadArtifact {
        file_id: file_id.to_string(),
        name,
        bytes,
    });
    cache_put(artifact.clone());
    Ok(artifact)
}

/// Подготовить пакет скачиваний для списка ID.
///
/// Частичный отказ: файл, который не удалось получить, пропускается (и
/// попадает в список failed), остальные обрабатываются. Порядок выдачи
/// совпадает с порядком входа независимо от того, какой fetch закончился
/// быстрее.
pub async fn render_downloads(
    api: &dyn AssistantApi,
    file_ids: &[String],
) -> (Vec<Arc<DownloadArtifact>>, Vec<String>) {
    let fetches = file_ids.iter().map(|id| fetch_artifact(api, id));
    let results = futures::future::join_all(fetches).await;

    let mut artifacts = Vec::new();
    let mut failed = Vec::new();
    for (file_id, result) in file_ids.iter().zip(results) {
        match result {
            Ok(artifact) => artifacts.push(artifact),
            Err(e) => {
                tracing::warn!(file = %file_id, "artifact fetch failed: {e}");
                failed.push(file_id.clone());
            }
        }
    }
    (artifacts, failed)
}

/// Имена из песочницы приходят путями вида /mnt/data/chart.png
fn display_name(filename: &str) -> String {
    filename
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(filename)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::assistant::types::{
        AssistantApi, AssistantError, FileObject, RunStreamEvent, Thread, ThreadMessage,
    };
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::time::Duration;

    /// Фейк, отдающий содержимое с разной задержкой и падающий на
    /// заданных ID
    struct SlowFilesApi {
        fail_ids: Vec<String>,
    }

    #[async_trait]
    impl AssistantApi for SlowFilesApi {
        async fn create_thread(&self, _f: &[String]) -> Result<Thread, AssistantError> {
            unimplemented!()
        }
        async fn append_message(&self, _t: &str, _c: &str) -> Result<String, AssistantError> {
            unimplemented!()
        }
        async fn stream_run(
            &self,
            _t: &str,
            _f: bool,
        ) -> Result<BoxStream<'static, Result<RunStreamEvent, AssistantError>>, AssistantError>
        {
            unimplemented!()
        }
        async fn cancel_run(&self, _t: &str, _r: &str) -> Result<(), AssistantError> {
            unimplemented!()
        }
        async fn list_messages(&self, _t: &str) -> Result<Vec<ThreadMessage>, AssistantError> {
            unimplemented!()
        }
        async fn file_metadata(&self, file_id: &str) -> Result<FileObject, AssistantError> {
            Ok(FileObject {
                id: file_id.to_string(),
                filename: format!("/mnt/data/{}.csv", file_id),
            })
        }
        async fn file_content(&self, file_id: &str) -> Result<Vec<u8>, AssistantError> {
            if self.fail_ids.iter().any(|f| f == file_id) {
                return Err(AssistantError::ApiError("gone".into()));
            }
            // B медленнее C: порядок выдачи всё равно как на входе
            if file_id.contains('B') {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(file_id.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_output_order_matches_input_order() {
        let api = SlowFilesApi { fail_ids: vec![] };
        let ids: Vec<String> = vec!["ord-A".into(), "ord-B".into(), "ord-C".into()];
        let (artifacts, failed) = render_downloads(&api, &ids).await;

        assert!(failed.is_empty());
        let got: Vec<&str> = artifacts.iter().map(|a| a.file_id.as_str()).collect();
        assert_eq!(got, vec!["ord-A", "ord-B", "ord-C"]);
        assert_eq!(artifacts[1].name, "ord-B.csv");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_siblings() {
        let api = SlowFilesApi {
            fail_ids: vec!["part-B".into()],
        };
        let ids: Vec<String> = vec!["part-A".into(), "part-B".into(), "part-C".into()];
        let (artifacts, failed) = render_downloads(&api, &ids).await;

        let got: Vec<&str> = artifacts.iter().map(|a| a.file_id.as_str()).collect();
        assert_eq!(got, vec!["part-A", "part-C"]);
        assert_eq!(failed, vec!["part-B"]);
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_fetches() {
        let api = SlowFilesApi { fail_ids: vec![] };
        let first = fetch_artifact(&api, "cache-X").await.unwrap();
        let second = fetch_artifact(&api, "cache-X").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_evict_forces_a_fresh_fetch() {
        let api = SlowFilesApi { fail_ids: vec![] };
        let first = fetch_artifact(&api, "evict-Y").await.unwrap();

        evict(&["evict-Y".to_string()]);
        let second = fetch_artifact(&api, "evict-Y").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_display_name_strips_sandbox_path() {
        assert_eq!(display_name("/mnt/data/trades.png"), "trades.png");
        assert_eq!(display_name("plain.txt"), "plain.txt");
    }
}
