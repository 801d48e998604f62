//! Conversation - View Model

use contracts::domain::a001_analysis_session::ChatEntry;
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub struct ConversationVm {
    /// Зафиксированная история диалога
    pub entries: RwSignal<Vec<ChatEntry>>,
    /// Текст ответа, который сейчас стримится (живой пузырь)
    pub streaming_text: RwSignal<Option<String>>,
    pub question: RwSignal<String>,
    pub is_streaming: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
}

impl ConversationVm {
    pub fn new() -> Self {
        Self {
            entries: RwSignal::new(Vec::new()),
            streaming_text: RwSignal::new(None),
            question: RwSignal::new(String::new()),
            is_streaming: RwSignal::new(false),
            error: RwSignal::new(None),
        }
    }
}

impl Default for ConversationVm {
    fn default() -> Self {
        Self::new()
    }
}

/// Принимать ли снимок журнала с бэкенда вместо локального.
///
/// Журнал сессии монотонный (только растёт), поэтому более короткий снимок —
/// устаревший: сразу после терминального события локальный журнал уже
/// содержит завершённый ход, а свежий снимок ещё едет по сети. Во время
/// стрима живой пузырь не трогаем вовсе.
pub fn accept_snapshot(streaming: bool, snapshot_len: usize, local_len: usize) -> bool {
    !streaming && snapshot_len >= local_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_snapshot_is_not_mirrored() {
        // Терминальное событие уже записало ход локально; старый снимок
        // из двух записей не должен его затереть
        assert!(!accept_snapshot(false, 2, 4));
    }

    #[test]
    fn test_fresh_snapshot_is_mirrored_when_idle() {
        assert!(accept_snapshot(false, 4, 4));
        assert!(accept_snapshot(false, 6, 4));
        assert!(accept_snapshot(false, 0, 0));
    }

    #[test]
    fn test_nothing_is_mirrored_mid_stream() {
        assert!(!accept_snapshot(true, 6, 4));
    }
}
