use crate::domain::a001_analysis_session::{service as session_service, store};
use crate::domain::a001_analysis_session::store::ActiveRun;
use crate::shared::assistant::{AssistantApi, RunStreamEvent};
use contracts::domain::a001_analysis_session::ChatEntry;
use contracts::domain::a002_conversation::{AskRequest, ConversationEvent, RunStatus};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Исход одной отправки (терминальные состояния машины)
enum Outcome {
    Completed,
    Failed(String),
    Cancelled,
    TimedOut,
}

/// Отправить вопрос ассистенту.
///
/// Последовательность жёсткая: ensure thread → append → локальное эхо →
/// потоковый запуск. Пара append+stream атомарна с точки зрения UI: после
/// успешного append запуск либо стартует, либо его отказ явно доходит до
/// пользователя событием Failed. Повторная отправка до терминального
/// состояния первой встаёт в очередь на op_guard сессии.
///
/// Возвращает приёмник событий; сам запуск идёт в фоновой задаче и доводится
/// до терминального состояния даже если браузер отключился от потока.
pub fn submit_question(
    api: Arc<dyn AssistantApi>,
    session_id: Uuid,
    request: AskRequest,
    run_timeout: Duration,
) -> anyhow::Result<mpsc::Receiver<ConversationEvent>> {
    if !store::exists(&session_id) {
        anyhow::bail!("Session not found: {}", session_id);
    }

    let (tx, rx) = mpsc::channel::<ConversationEvent>(64);
    tokio::spawn(run_submission(api, session_id, request, run_timeout, tx));
    Ok(rx)
}

async fn run_submission(
    api: Arc<dyn AssistantApi>,
    session_id: Uuid,
    request: AskRequest,
    run_timeout: Duration,
    tx: mpsc::Sender<ConversationEvent>,
) {
    let mut status = RunStatus::Idle;
    tracing::debug!(session = %session_id, ?status, "submission accepted");

    // Очередь: ждём терминального состояния предыдущей отправки
    let Some(guard) = store::op_guard(&session_id) else {
        let _ = tx
            .send(ConversationEvent::Failed {
                detail: format!("Session not found: {}", session_id),
            })
            .await;
        return;
    };
    let _lock = guard.lock().await;

    // 1. Тред обязан существовать до любого вопроса; молча пропускать
    //    вопрос нельзя
    let thread_id = match session_service::ensure_thread_locked(api.as_ref(), &session_id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(session = %session_id, "ensure_thread failed: {e:#}");
            let _ = tx
                .send(ConversationEvent::Failed {
                    detail: format!("Failed to prepare conversation thread: {e}"),
                })
                .await;
            return;
        }
    };

    // 2. Append сообщения пользователя. Неудачный append не попадает в
    //    журнал как успешный ход
    if let Err(e) = api.append_message(&thread_id, &request.question).await {
        tracing::error!(session = %session_id, "append failed: {e}");
        let _ = tx
            .send(ConversationEvent::Failed {
                detail: format!("Failed to send question: {e}"),
            })
            .await;
        return;
    }

    // 3. Оптимистичное локальное эхо — до запуска, не после него
    store::with_session(&session_id, |s| {
        s.message_log.push(ChatEntry::user(request.question.clone()));
    });
    status = RunStatus::Appended;
    tracing::debug!(session = %session_id, ?status, "question appended");
    let _ = tx
        .send(ConversationEvent::Appended {
            question: request.question.clone(),
        })
        .await;

    // 4. Регистрируем активный запуск с каналом отмены
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    store::with_session(&session_id, |s| {
        s.active_run = Some(ActiveRun {
            run_id: None,
            cancel: cancel_tx,
        });
    });

    // 5. Потоковый запуск: temperature 0; ручные вопросы принудительно
    //    через code interpreter
    let stream = api
        .stream_run(&thread_id, request.force_code_interpreter)
        .await;
    let mut stream = match stream {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(session = %session_id, "stream_run failed: {e}");
            store::with_session(&session_id, |s| s.active_run = None);
            let _ = tx
                .send(ConversationEvent::Failed {
                    detail: format!("Failed to start analysis run: {e}"),
                })
                .await;
            return;
        }
    };

    status = RunStatus::Streaming;
    tracing::debug!(session = %session_id, ?status, "run streaming");

    let deadline = tokio::time::sleep(run_timeout);
    tokio::pin!(deadline);
    let mut accum = String::new();

    let outcome = loop {
        tokio::select! {
            _ = &mut deadline => break Outcome::TimedOut,
            changed = cancel_rx.changed() => {
                if changed.is_ok() && *cancel_rx.borrow() {
                    break Outcome::Cancelled;
                }
            }
            ev = stream.next() => match ev {
                None => break Outcome::Failed("stream ended before run completion".into()),
                Some(Err(e)) => break Outcome::Failed(e.to_string()),
                Some(Ok(RunStreamEvent::RunCreated { run_id })) => {
                    store::with_session(&session_id, |s| {
                        if let Some(active) = s.active_run.as_mut() {
                            active.run_id = Some(run_id.clone());
                        }
                    });
                }
                Some(Ok(RunStreamEvent::TextDelta { text })) => {
                    accum.push_str(&text);
                    let _ = tx.send(ConversationEvent::TextDelta { text }).await;
                }
                Some(Ok(RunStreamEvent::Completed)) => break Outcome::Completed,
                Some(Ok(RunStreamEvent::Failed { detail })) => break Outcome::Failed(detail),
                Some(Ok(RunStreamEvent::Cancelled)) => break Outcome::Cancelled,
            }
        }
    };

    // 6. Финализация слота и журнала
    let run_id = store::with_session(&session_id, |s| {
        let run_id = s.active_run.as_ref().and_then(|a| a.run_id.clone());
        s.active_run = None;
        run_id
    })
    .flatten();

    match outcome {
        Outcome::Completed => {
            status = RunStatus::Completed;
            store::with_session(&session_id, |s| {
                s.message_log.push(ChatEntry::assistant(accum));
            });
            let _ = tx.send(ConversationEvent::Completed).await;
        }
        Outcome::Failed(detail) => {
            status = RunStatus::Failed;
            tracing::error!(session = %session_id, "run failed: {detail}");
            let _ = tx.send(ConversationEvent::Failed { detail }).await;
        }
        Outcome::Cancelled => {
            status = RunStatus::Cancelled;
            // Вопрос уже в треде и остаётся; ответ обрывается на сказанном
            if !accum.is_empty() {
                store::with_session(&session_id, |s| {
                    s.message_log.push(ChatEntry::assistant(accum));
                });
            }
            let _ = tx.send(ConversationEvent::Cancelled).await;
        }
        Outcome::TimedOut => {
            status = RunStatus::Failed;
            if let Some(run_id) = &run_id {
                if let Err(e) = api.cancel_run(&thread_id, run_id).await {
                    tracing::warn!(session = %session_id, "cancel after timeout failed: {e}");
                }
            }
            let _ = tx
                .send(ConversationEvent::Failed {
                    detail: format!("Run timed out after {} s", run_timeout.as_secs()),
                })
                .await;
        }
    }

    debug_assert!(status.is_terminal());
    tracing::debug!(session = %session_id, ?status, "submission finished");
}

/// Отменить активный запуск сессии.
///
/// Удалённому сервису шлётся cancel (когда run_id уже известен), задаче
/// стриминга поднимается флаг. Если активного запуска нет — no-op.
pub async fn cancel(api: Arc<dyn AssistantApi>, session_id: &Uuid) -> anyhow::Result<()> {
    let state = store::with_session(session_id, |s| {
        (s.thread_id.clone(), s.active_run.clone())
    })
    .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session_id))?;

    let (thread_id, active) = state;
    let Some(active) = active else {
        return Ok(());
    };

    if let (Some(thread_id), Some(run_id)) = (thread_id, active.run_id.clone()) {
        if let Err(e) = api.cancel_run(&thread_id, &run_id).await {
            tracing::warn!(session = %session_id, "remote cancel failed: {e}");
        }
    }
    let _ = active.cancel.send(true);
    Ok(())
}
