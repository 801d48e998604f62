use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Роль записи в журнале диалога
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            _ => Err(format!("Unknown chat role: {}", s)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Одна запись журнала диалога (локальное эхо + ответы ассистента)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Снимок состояния сессии анализа для фронтенда.
///
/// Поля накапливаются за время жизни сессии и никогда не сбрасываются
/// перерисовкой представления.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub username: String,
    pub thread_id: Option<String>,
    pub message_log: Vec<ChatEntry>,
    pub produced_file_ids: Vec<String>,
    pub analysis_complete: bool,
    pub streaming: bool,
}
