use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки клиента удалённого сервиса ассистента
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Stream protocol error: {0}")]
    StreamProtocol(String),
}

/// Созданный тред (удалённая сущность, у нас хранится только ID)
#[derive(Debug, Clone, Deserialize)]
pub struct Thread {
    pub id: String,
}

/// Сообщение треда в том виде, как его отдаёт удалённый сервис
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Блок контента сообщения. Неизвестные типы не считаются ошибкой разбора.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: MessageText },
    ImageFile { image_file: FileRef },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Структурная ссылка на файл внутри текста сообщения
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Ссылка на файл, записанный кодом ассистента (sandbox-путь)
    FilePath { file_path: FileRef },
    /// Цитата из файла, переданного ассистенту на вход
    FileCitation { file_citation: FileRef },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub file_id: String,
}

/// Метаданные файла удалённого сервиса
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: String,
}

/// Страница списка сообщений (`order=asc` — сервис является источником
/// истины о порядке)
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
    #[serde(default)]
    pub has_more: bool,
}

/// Событие потокового запуска, уже разобранное из SSE-кадров
#[derive(Debug, Clone, PartialEq)]
pub enum RunStreamEvent {
    RunCreated { run_id: String },
    TextDelta { text: String },
    Completed,
    Failed { detail: String },
    Cancelled,
}

/// Трейт удалённого сервиса ассистента.
///
/// Шов для тестов: сервис диалога работает против него, а не против
/// конкретного HTTP-клиента.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Создать тред с привязкой файлов как tool resources
    async fn create_thread(&self, file_ids: &[String]) -> Result<Thread, AssistantError>;

    /// Добавить сообщение пользователя в тред
    async fn append_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<String, AssistantError>;

    /// Запустить потоковое выполнение ассистента (temperature = 0)
    async fn stream_run(
        &self,
        thread_id: &str,
        force_code_interpreter: bool,
    ) -> Result<BoxStream<'static, Result<RunStreamEvent, AssistantError>>, AssistantError>;

    /// Отменить выполняющийся запуск
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AssistantError>;

    /// Полная история сообщений треда в хронологическом порядке
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AssistantError>;

    /// Метаданные файла (для отображаемого имени)
    async fn file_metadata(&self, file_id: &str) -> Result<FileObject, AssistantError>;

    /// Содержимое файла по ID
    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>, AssistantError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserializes_with_annotations() {
        let json = r#"{
            "id": "msg_1",
            "role": "assistant",
            "content": [
                {"type": "text", "text": {"value": "see chart",
                    "annotations": [
                        {"type": "file_path", "file_path": {"file_id": "file-out"}},
                        {"type": "file_citation", "file_citation": {"file_id": "file-in"}}
                    ]}},
                {"type": "image_file", "image_file": {"file_id": "file-img"}}
            ]
        }"#;
        let msg: ThreadMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content.len(), 2);
        match &msg.content[0] {
            MessageContent::Text { text } => assert_eq!(text.annotations.len(), 2),
            _ => panic!("expected text block"),
        }
    }

    #[test]
    fn test_unknown_content_type_is_tolerated() {
        let json = r#"{
            "id": "msg_2",
            "role": "assistant",
            "content": [{"type": "refusal", "refusal": "no"}]
        }"#;
        let msg: ThreadMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg.content[0], MessageContent::Other));
    }
}
