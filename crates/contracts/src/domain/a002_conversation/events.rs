use serde::{Deserialize, Serialize};

/// Фазы одной отправки вопроса.
///
/// Терминальные фазы: `Completed`, `Failed`, `Cancelled`. Переходы строго
/// `Idle → Appended → Streaming → Completed`, с ответвлением в `Failed` из
/// `Appended`/`Streaming` и в `Cancelled` из `Streaming`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Appended,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// События потоковой выдачи, которые бэкенд шлёт в браузер через SSE.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    /// Вопрос принят и добавлен в удалённый тред
    Appended { question: String },
    /// Инкрементальный фрагмент текста ответа (дописывается в тот же слот)
    TextDelta { text: String },
    /// Ассистент закончил; финализируем слот
    Completed,
    /// Отправка прервана с ошибкой; журнал не должен сообщать об успехе
    Failed { detail: String },
    /// Пользователь отменил выполнение; вопрос остаётся в треде
    Cancelled,
}

impl ConversationEvent {
    /// Имя SSE-события для этого варианта
    pub fn event_type(&self) -> &'static str {
        match self {
            ConversationEvent::Appended { .. } => "appended",
            ConversationEvent::TextDelta { .. } => "text_delta",
            ConversationEvent::Completed => "completed",
            ConversationEvent::Failed { .. } => "failed",
            ConversationEvent::Cancelled => "cancelled",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(
            self,
            ConversationEvent::Completed
                | ConversationEvent::Failed { .. }
                | ConversationEvent::Cancelled
        )
    }
}

/// Запрос на отправку вопроса ассистенту
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Принудительно запросить code interpreter (ручной ввод — да,
    /// готовые вопросы — на усмотрение ассистента)
    pub force_code_interpreter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Idle.is_terminal());
        assert!(!RunStatus::Appended.is_terminal());
        assert!(!RunStatus::Streaming.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let ev = ConversationEvent::TextDelta {
            text: "42".to_string(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"text_delta\""));
        let back: ConversationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
