use super::store;
use crate::shared::assistant::AssistantApi;
use contracts::domain::a001_analysis_session::SessionView;
use uuid::Uuid;

/// Гарантировать, что у сессии есть удалённый тред.
///
/// Тред создаётся лениво при первом обращении; файлы датасета привязываются
/// как tool resources один раз, при создании. Повторный вызов возвращает тот
/// же ID и ничего не создаёт заново.
pub async fn ensure_thread(api: &dyn AssistantApi, session_id: &Uuid) -> anyhow::Result<String> {
    let guard = store::op_guard(session_id)
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;
    let _lock = guard.lock().await;
    ensure_thread_locked(api, session_id).await
}

/// Вариант для вызова под уже взятым op_guard (из контроллера диалога)
pub(crate) async fn ensure_thread_locked(
    api: &dyn AssistantApi,
    session_id: &Uuid,
) -> anyhow::Result<String> {
    // 1. Уже есть тред — возвращаем его, привязку не дублируем
    let existing = store::with_session(session_id, |s| s.thread_id.clone())
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;
    if let Some(thread_id) = existing {
        return Ok(thread_id);
    }

    // 2. Создаём тред с фиксированным набором загруженных файлов
    let uploaded = store::with_session(session_id, |s| s.uploaded_file_ids.clone())
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;
    let thread = api.create_thread(&uploaded).await?;
    tracing::info!(session = %session_id, thread = %thread.id, "created assistant thread");

    // 3. thread_id неизменяем до конца жизни сессии
    store::with_session(session_id, |s| {
        s.thread_id = Some(thread.id.clone());
    });

    Ok(thread.id)
}

/// Явное действие "Finish Analysis" — единственный путь, которым
/// analysis_complete становится true.
pub fn finish(session_id: &Uuid) -> anyhow::Result<()> {
    store::with_session(session_id, |s| {
        s.analysis_complete = true;
    })
    .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))
}

pub fn get_view(session_id: &Uuid) -> anyhow::Result<SessionView> {
    store::view(session_id).ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::assistant::types::{
        AssistantApi, AssistantError, FileObject, RunStreamEvent, Thread, ThreadMessage,
    };
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Фейковый сервис: считает создания тредов
    pub struct CountingApi {
        pub created: AtomicUsize,
    }

    #[async_trait]
    impl AssistantApi for CountingApi {
        async fn create_thread(&self, _file_ids: &[String]) -> Result<Thread, AssistantError> {
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Thread {
                id: format!("thread_{}", n),
            })
        }
        async fn append_message(
            &self,
            _thread_id: &str,
            _content: &str,
        ) -> Result<String, AssistantError> {
            Ok("msg_1".into())
        }
        async fn stream_run(
            &self,
            _thread_id: &str,
            _force: bool,
        ) -> Result<BoxStream<'static, Result<RunStreamEvent, AssistantError>>, AssistantError>
        {
            Ok(Box::pin(futures::stream::empty()))
        }
        async fn cancel_run(&self, _t: &str, _r: &str) -> Result<(), AssistantError> {
            Ok(())
        }
        async fn list_messages(&self, _t: &str) -> Result<Vec<ThreadMessage>, AssistantError> {
            Ok(vec![])
        }
        async fn file_metadata(&self, _f: &str) -> Result<FileObject, AssistantError> {
            Err(AssistantError::ApiError("not found".into()))
        }
        async fn file_content(&self, _f: &str) -> Result<Vec<u8>, AssistantError> {
            Err(AssistantError::ApiError("not found".into()))
        }
    }

    #[tokio::test]
    async fn test_ensure_thread_is_idempotent() {
        let api = CountingApi {
            created: AtomicUsize::new(0),
        };
        let session_id = store::create("etrading", vec!["file-up".into()]);

        let first = ensure_thread(&api, &session_id).await.unwrap();
        let second = ensure_thread(&api, &session_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finish_is_the_only_path_to_complete() {
        let session_id = store::create("etrading", vec![]);
        assert!(!get_view(&session_id).unwrap().analysis_complete);

        finish(&session_id).unwrap();
        assert!(get_view(&session_id).unwrap().analysis_complete);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let api = CountingApi {
            created: AtomicUsize::new(0),
        };
        let missing = Uuid::new_v4();
        assert!(ensure_thread(&api, &missing).await.is_err());
        assert!(finish(&missing).is_err());
    }
}
