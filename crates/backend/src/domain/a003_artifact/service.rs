use super::{discovery, renderer};
use crate::domain::a001_analysis_session::store;
use crate::shared::assistant::AssistantApi;
use contracts::domain::a003_artifact::{ArtifactListResponse, ArtifactMeta};
use renderer::DownloadArtifact;
use std::sync::Arc;
use uuid::Uuid;

/// Список артефактов для панели скачивания.
///
/// Доступен только после "Finish Analysis": до завершения анализа список
/// запрещён независимо от того, что уже лежит в треде. Повторное открытие
/// панели пересканирует тред заново — файлы, появившиеся после finish,
/// тоже попадают в список.
pub async fn list_for_download(
    api: &dyn AssistantApi,
    session_id: &Uuid,
) -> anyhow::Result<ArtifactListResponse> {
    // 1. Гейт: анализ должен быть явно завершён
    let (analysis_complete, thread_id, uploaded) = store::with_session(session_id, |s| {
        (
            s.analysis_complete,
            s.thread_id.clone(),
            s.uploaded_file_ids.clone(),
        )
    })
    .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;
    if !analysis_complete {
        anyhow::bail!("Analysis is not finished yet");
    }

    // 2. Без треда не было ни одного вопроса — список пуст
    let Some(thread_id) = thread_id else {
        return Ok(ArtifactListResponse {
            items: vec![],
            failed: vec![],
        });
    };

    // 3. Полное сканирование истории треда
    let messages = api.list_messages(&thread_id).await?;
    let produced = discovery::find_produced_files(&messages, &uploaded);
    store::with_session(session_id, |s| {
        s.produced_file_ids = produced.clone();
    });

    // 4. Имена и байты тянутся сразу, скачивание по клику идёт из кэша
    let (artifacts, failed) = renderer::render_downloads(api, &produced).await;
    let items = artifacts
        .iter()
        .map(|a| ArtifactMeta {
            file_id: a.file_id.clone(),
            name: a.name.clone(),
        })
        .collect();

    Ok(ArtifactListResponse { items, failed })
}

/// Отдать один артефакт по ID. ID должен быть из списка найденных в этой
/// сессии — чужие файлы через этот маршрут не выдаются.
pub async fn download(
    api: &dyn AssistantApi,
    session_id: &Uuid,
    file_id: &str,
) -> anyhow::Result<Arc<DownloadArtifact>> {
    let view = store::view(session_id)
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;
    if !view.analysis_complete {
        anyhow::bail!("Analysis is not finished yet");
    }
    if !view.produced_file_ids.iter().any(|f| f == file_id) {
        anyhow::bail!("Unknown artifact: {}", file_id);
    }
    renderer::fetch_artifact(api, file_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::assistant::types::{
        Annotation, AssistantApi, AssistantError, FileObject, FileRef, MessageContent,
        MessageText, RunStreamEvent, Thread, ThreadMessage,
    };
    use async_trait::async_trait;
    use futures::stream::BoxStream;

    /// Фейк с одним готовым изображением в истории треда
    struct OneChartApi;

    #[async_trait]
    impl AssistantApi for OneChartApi {
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
            Ok(vec![ThreadMessage {
                id: "msg_1".into(),
                role: "assistant".into(),
                content: vec![
                    MessageContent::ImageFile {
                        image_file: FileRef {
                            file_id: "svc-chart".into(),
                        },
                    },
                    MessageContent::Text {
                        text: MessageText {
                            value: "See the chart and the source file.".into(),
                            annotations: vec![Annotation::FilePath {
                                file_path: FileRef {
                                    file_id: "file-uploaded".into(),
                                },
                            }],
                        },
                    },
                ],
                attachments: vec![],
            }])
        }
        async fn file_metadata(&self, file_id: &str) -> Result<FileObject, AssistantError> {
            Ok(FileObject {
                id: file_id.to_string(),
                filename: "/mnt/data/volume_chart.png".into(),
            })
        }
        async fn file_content(&self, _f: &str) -> Result<Vec<u8>, AssistantError> {
            Ok(vec![0x89, 0x50, 0x4e, 0x47])
        }
    }

    #[tokio::test]
    async fn test_list_is_gated_on_finish() {
        let api = OneChartApi;
        let session_id = store::create("etrading", vec!["file-uploaded".into()]);
        store::with_session(&session_id, |s| s.thread_id = Some("thread_1".into()));

        let before = list_for_download(&api, &session_id).await;
        assert!(before.is_err());

        crate::domain::a001_analysis_session::service::finish(&session_id).unwrap();
        let after = list_for_download(&api, &session_id).await.unwrap();
        assert_eq!(after.items.len(), 1);
        assert_eq!(after.items[0].file_id, "svc-chart");
        assert_eq!(after.items[0].name, "volume_chart.png");
        assert!(after.failed.is_empty());
    }

    #[tokio::test]
    async fn test_list_excludes_uploaded_and_records_produced() {
        let api = OneChartApi;
        let session_id = store::create("etrading", vec!["file-uploaded".into()]);
        store::with_session(&session_id, |s| {
            s.thread_id = Some("thread_2".into());
            s.analysis_complete = true;
        });

        let list = list_for_download(&api, &session_id).await.unwrap();
        assert!(list.items.iter().all(|m| m.file_id != "file-uploaded"));

        let view = store::view(&session_id).unwrap();
        assert_eq!(view.produced_file_ids, vec!["svc-chart".to_string()]);
    }

    #[tokio::test]
    async fn test_finished_session_without_thread_lists_nothing() {
        let api = OneChartApi;
        let session_id = store::create("etrading", vec![]);
        store::with_session(&session_id, |s| s.analysis_complete = true);

        let list = list_for_download(&api, &session_id).await.unwrap();
        assert!(list.items.is_empty());
    }

    #[tokio::test]
    async fn test_download_rejects_foreign_file_id() {
        let api = OneChartApi;
        let session_id = store::create("etrading", vec![]);
        store::with_session(&session_id, |s| {
            s.thread_id = Some("thread_3".into());
            s.analysis_complete = true;
            s.produced_file_ids = vec!["svc-chart".into()];
        });

        assert!(download(&api, &session_id, "file-elsewhere").await.is_err());
        let artifact = download(&api, &session_id, "svc-chart").await.unwrap();
        assert_eq!(artifact.bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }
}
