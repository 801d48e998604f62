use chrono::{DateTime, Utc};
use contracts::domain::a001_analysis_session::{ChatEntry, SessionView};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use uuid::Uuid;

/// Время жизни сессии; совпадает со временем жизни access-токена
const SESSION_TTL_HOURS: i64 = 24;

/// Выполняющийся запуск: run_id становится известен из первого события
/// потока, cancel — флаг отмены для задачи стриминга.
#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub run_id: Option<String>,
    pub cancel: watch::Sender<bool>,
}

/// Состояние одной сессии анализа.
///
/// Живёт только в памяти процесса; уничтожается вместе с браузерной сессией.
/// Каждое поле инициализируется ровно один раз за время жизни сессии —
/// перерисовки представления ничего не сбрасывают.
#[derive(Debug)]
pub struct AnalysisSession {
    pub id: Uuid,
    pub username: String,
    pub thread_id: Option<String>,
    pub uploaded_file_ids: Vec<String>,
    pub message_log: Vec<ChatEntry>,
    pub produced_file_ids: Vec<String>,
    pub analysis_complete: bool,
    pub active_run: Option<ActiveRun>,
    pub created_at: DateTime<Utc>,
    /// Сериализует ensure_thread и отправки вопросов внутри сессии:
    /// второй запрос ждёт терминального состояния первого
    pub op_guard: Arc<tokio::sync::Mutex<()>>,
}

impl AnalysisSession {
    fn new(id: Uuid, username: String, uploaded_file_ids: Vec<String>) -> Self {
        Self {
            id,
            username,
            thread_id: None,
            uploaded_file_ids,
            message_log: Vec::new(),
            produced_file_ids: Vec::new(),
            analysis_complete: false,
            active_run: None,
            created_at: Utc::now(),
            op_guard: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.to_string(),
            username: self.username.clone(),
            thread_id: self.thread_id.clone(),
            message_log: self.message_log.clone(),
            produced_file_ids: self.produced_file_ids.clone(),
            analysis_complete: self.analysis_complete,
            streaming: self.active_run.is_some(),
        }
    }
}

static SESSIONS: Lazy<RwLock<HashMap<Uuid, AnalysisSession>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Создать сессию (при успешном логине). Логин не сбрасывает ничего, кроме
/// самой аутентификации: повторный вход выдаёт новую сессию, старые не
/// трогает.
pub fn create(username: &str, uploaded_file_ids: Vec<String>) -> Uuid {
    let id = Uuid::new_v4();
    let session = AnalysisSession::new(id, username.to_string(), uploaded_file_ids);
    SESSIONS
        .write()
        .expect("session store poisoned")
        .insert(id, session);
    id
}

pub fn exists(id: &Uuid) -> bool {
    SESSIONS
        .read()
        .expect("session store poisoned")
        .contains_key(id)
}

/// Выполнить замыкание над мутабельной сессией под блокировкой
pub fn with_session<R>(id: &Uuid, f: impl FnOnce(&mut AnalysisSession) -> R) -> Option<R> {
    let mut sessions = SESSIONS.write().expect("session store poisoned");
    sessions.get_mut(id).map(f)
}

pub fn view(id: &Uuid) -> Option<SessionView> {
    let sessions = SESSIONS.read().expect("session store poisoned");
    sessions.get(id).map(|s| s.view())
}

pub fn op_guard(id: &Uuid) -> Option<Arc<tokio::sync::Mutex<()>>> {
    let sessions = SESSIONS.read().expect("session store poisoned");
    sessions.get(id).map(|s| s.op_guard.clone())
}

/// Удалить сессии, пережившие свой токен.
///
/// Хранилище только в памяти, и без чистки оно росло бы с каждым логином.
/// Возвращает produced_file_ids удалённых сессий — вызывающий выбрасывает
/// их из кэша артефактов.
pub fn prune_expired() -> Vec<String> {
    let cutoff = Utc::now() - chrono::Duration::hours(SESSION_TTL_HOURS);
    let mut sessions = SESSIONS.write().expect("session store poisoned");

    let expired: Vec<Uuid> = sessions
        .iter()
        .filter(|(_, s)| s.created_at < cutoff)
        .map(|(id, _)| *id)
        .collect();

    let mut orphaned_files = Vec::new();
    for id in expired {
        if let Some(session) = sessions.remove(&id) {
            orphaned_files.extend(session.produced_file_ids);
        }
    }
    orphaned_files
}

#[cfg(test)]
pub fn count_for(username: &str) -> usize {
    let sessions = SESSIONS.read().expect("session store poisoned");
    sessions.values().filter(|s| s.username == username).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_empty() {
        let id = create("etrading", vec!["file-up".into()]);
        let view = view(&id).unwrap();
        assert_eq!(view.username, "etrading");
        assert!(view.thread_id.is_none());
        assert!(view.message_log.is_empty());
        assert!(view.produced_file_ids.is_empty());
        assert!(!view.analysis_complete);
        assert!(!view.streaming);
    }

    #[test]
    fn test_prune_removes_only_expired_sessions() {
        let expired = create("etrading", vec![]);
        with_session(&expired, |s| {
            s.produced_file_ids = vec!["prune-chart".into()];
            s.created_at = Utc::now() - chrono::Duration::hours(SESSION_TTL_HOURS + 1);
        });
        let fresh = create("etrading", vec![]);

        let orphaned = prune_expired();

        assert!(!exists(&expired));
        assert!(exists(&fresh));
        assert!(orphaned.contains(&"prune-chart".to_string()));
    }

    #[test]
    fn test_repeated_login_keeps_old_sessions() {
        let first = create("etrading", vec![]);
        with_session(&first, |s| s.message_log.push(ChatEntry::user("q1")));
        let second = create("etrading", vec![]);
        assert_ne!(first, second);
        assert_eq!(view(&first).unwrap().message_log.len(), 1);
        assert_eq!(view(&second).unwrap().message_log.len(), 0);
    }
}
