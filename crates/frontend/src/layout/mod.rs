pub mod sidebar;

use contracts::domain::a001_analysis_session::SessionView;
use leptos::prelude::*;

/// Разделы приложения
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveView {
    Analyze,
    Download,
}

/// Клиентское зеркало сессии анализа + активный раздел.
///
/// Источник истины о состоянии сессии — бэкенд; сигнал обновляется после
/// каждого действия, которое его меняет (finish, терминальное событие
/// запуска).
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub session: RwSignal<Option<SessionView>>,
    pub active: RwSignal<ActiveView>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session: RwSignal::new(None),
            active: RwSignal::new(ActiveView::Analyze),
        }
    }

    pub fn analysis_complete(&self) -> bool {
        self.session
            .get()
            .map(|s| s.analysis_complete)
            .unwrap_or(false)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext not found in component tree")
}
