//! Conversation - View Component

use std::cell::RefCell;
use std::rc::Rc;

use super::model::{self, PRE_WRITTEN_QUESTIONS};
use super::view_model::{self, ConversationVm};
use crate::layout::use_session;
use crate::projections::p900_dataset_preview::ui::DatasetPreviewPanel;
use crate::system::auth::api::{fetch_with_auth, post_with_auth};
use crate::system::auth::context::use_auth;
use contracts::domain::a001_analysis_session::{ChatEntry, ChatRole, SessionView};
use contracts::domain::a002_conversation::ConversationEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;
use web_sys::EventSource;

#[component]
#[allow(non_snake_case)]
pub fn AnalyzeView() -> impl IntoView {
    let vm = ConversationVm::new();
    let ctx = use_session();
    let (auth_state, _) = use_auth();

    // Зеркалим журнал сессии. Отслеживается только сигнал сессии: флаг
    // стрима читается без подписки, чтобы его сброс не проигрывал
    // устаревший снимок поверх только что завершённого хода
    Effect::new(move |_| {
        let Some(session) = ctx.session.get() else {
            return;
        };
        let streaming = vm.is_streaming.get_untracked();
        let local_len = vm.entries.with_untracked(|e| e.len());
        if view_model::accept_snapshot(streaming, session.message_log.len(), local_len) {
            vm.entries.set(session.message_log);
        }
    });

    let refresh_session = move || {
        let Some(token) = auth_state.get_untracked().access_token else {
            return;
        };
        spawn_local(async move {
            if let Ok(view) =
                fetch_with_auth::<SessionView>("/api/a001-session", &token).await
            {
                ctx.session.set(Some(view));
            }
        });
    };

    // Отправка вопроса: SSE-поток до терминального события
    let submit = move |question: String, force_code_interpreter: bool| {
        if question.trim().is_empty() || vm.is_streaming.get() {
            return;
        }
        let Some(token) = auth_state.get_untracked().access_token else {
            return;
        };

        vm.is_streaming.set(true);
        vm.error.set(None);
        vm.question.set(String::new());

        let source_handle: Rc<RefCell<Option<EventSource>>> = Rc::new(RefCell::new(None));
        let handle = Rc::clone(&source_handle);

        let on_event = move |event: ConversationEvent| {
            let done = event.is_done();
            match event {
                ConversationEvent::Appended { question } => {
                    vm.entries.update(|log| log.push(ChatEntry::user(&question)));
                    vm.streaming_text.set(Some(String::new()));
                }
                ConversationEvent::TextDelta { text } => {
                    vm.streaming_text.update(|t| {
                        t.get_or_insert_with(String::new).push_str(&text);
                    });
                }
                ConversationEvent::Completed => {
                    let accumulated = vm.streaming_text.get_untracked().unwrap_or_default();
                    vm.entries
                        .update(|log| log.push(ChatEntry::assistant(&accumulated)));
                    vm.streaming_text.set(None);
                    vm.is_streaming.set(false);
                    refresh_session();
                }
                ConversationEvent::Failed { detail } => {
                    vm.error.set(Some(detail));
                    vm.streaming_text.set(None);
                    vm.is_streaming.set(false);
                    refresh_session();
                }
                ConversationEvent::Cancelled => {
                    // Частичный ответ остаётся в журнале
                    let partial = vm.streaming_text.get_untracked().unwrap_or_default();
                    if !partial.is_empty() {
                        vm.entries.update(|log| log.push(ChatEntry::assistant(&partial)));
                    }
                    vm.streaming_text.set(None);
                    vm.is_streaming.set(false);
                    refresh_session();
                }
            }
            if done {
                if let Some(source) = handle.borrow_mut().take() {
                    source.close();
                }
            }
        };

        match model::open_ask_stream(&question, force_code_interpreter, &token, on_event) {
            Ok(source) => {
                *source_handle.borrow_mut() = Some(source);
            }
            Err(e) => {
                vm.error.set(Some(e));
                vm.is_streaming.set(false);
            }
        }
    };

    let handle_cancel = move |_| {
        let Some(token) = auth_state.get_untracked().access_token else {
            return;
        };
        spawn_local(async move {
            if let Err(e) = model::cancel_run(&token).await {
                vm.error.set(Some(e));
            }
        });
    };

    let handle_finish = move |_| {
        let Some(token) = auth_state.get_untracked().access_token else {
            return;
        };
        spawn_local(async move {
            match post_with_auth::<SessionView>("/api/a001-session/finish", &token).await {
                Ok(view) => ctx.session.set(Some(view)),
                Err(e) => vm.error.set(Some(e)),
            }
        });
    };

    view! {
        <div style="height: 100%; display: flex; flex-direction: column; padding: 20px; overflow-y: auto;">
            <h2 style="font-size: 18px; font-weight: bold; margin-bottom: 8px;">
                "Welcome to the E-Trading Data Analysis Tool"
            </h2>
            <p style="color: var(--colorNeutralForeground3); margin-bottom: 12px;">
                "This is a proof of concept using synthetic data. \
                 Ask questions about your data. You can keep asking follow-up questions until you're satisfied."
            </p>

            <DatasetPreviewPanel />

            <h3 style="font-size: 15px; font-weight: bold; margin-bottom: 8px;">
                "Or choose from some pre-written questions:"
            </h3>
            <Flex vertical=true style="gap: 6px; margin-bottom: 16px;">
                {PRE_WRITTEN_QUESTIONS
                    .iter()
                    .map(|q| {
                        let q = q.to_string();
                        let label = q.clone();
                        let submit = submit.clone();
                        view! {
                            <Button
                                appearance=ButtonAppearance::Secondary
                                disabled=vm.is_streaming
                                // Заготовленные вопросы идут без принудительного code_interpreter
                                on_click=move |_| submit(q.clone(), false)
                            >
                                {label}
                            </Button>
                        }
                    })
                    .collect_view()}
            </Flex>

            // Error display
            {move || {
                vm.error
                    .get()
                    .map(|e| {
                        view! {
                            <div style="padding: 12px; margin-bottom: 12px; background: var(--colorPaletteRedBackground1); border-radius: 8px;">
                                <span style="color: var(--colorPaletteRedForeground1);">{e}</span>
                            </div>
                        }
                    })
            }}

            // Conversation log
            <div style="flex: 1; min-height: 200px; display: flex; flex-direction: column; gap: 12px; margin-bottom: 16px; padding: 12px; background: var(--colorNeutralBackground1); border: 1px solid var(--colorNeutralStroke2); border-radius: 8px; overflow-y: auto;">
                <For
                    each=move || {
                        let entries: Vec<_> = vm.entries.get().into_iter().enumerate().collect();
                        entries
                    }
                    key=|(i, entry)| (*i, entry.text.len())
                    let:indexed
                >
                    {
                        let (_, entry) = indexed;
                        let is_user = matches!(entry.role, ChatRole::User);
                        view! {
                            <div style=if is_user {
                                "align-self: flex-end; max-width: 70%; background: var(--colorBrandBackground2); padding: 10px 14px; border-radius: 12px;"
                            } else {
                                "align-self: flex-start; max-width: 70%; background: var(--colorNeutralBackground2); padding: 10px 14px; border-radius: 12px;"
                            }>
                                <div style="white-space: pre-wrap;">{entry.text.clone()}</div>
                            </div>
                        }
                    }
                </For>

                // Живой пузырь стримящегося ответа
                {move || {
                    vm.streaming_text
                        .get()
                        .map(|text| {
                            view! {
                                <div style="align-self: flex-start; max-width: 70%; background: var(--colorNeutralBackground2); padding: 10px 14px; border-radius: 12px;">
                                    <div style="white-space: pre-wrap;">
                                        {if text.is_empty() {
                                            "Analyzing your question. Please wait...".to_string()
                                        } else {
                                            text
                                        }}
                                    </div>
                                </div>
                            }
                        })
                }}
            </div>

            // Input area
            <Flex style="gap: 8px; align-items: center;">
                <div style="flex: 1;">
                    <Input
                        value=vm.question
                        placeholder="Ask a question about the data"
                        disabled=vm.is_streaming
                    />
                </div>
                <Button
                    appearance=ButtonAppearance::Primary
                    disabled=vm.is_streaming
                    // Ручные вопросы принудительно идут через code_interpreter
                    on_click={
                        let submit = submit.clone();
                        move |_| submit(vm.question.get_untracked(), true)
                    }
                >
                    "Submit Question"
                </Button>
                <Show when=move || vm.is_streaming.get()>
                    <Button
                        appearance=ButtonAppearance::Secondary
                        on_click=handle_cancel
                    >
                        "Cancel"
                    </Button>
                </Show>
                <Button
                    appearance=ButtonAppearance::Secondary
                    disabled=vm.is_streaming
                    on_click=handle_finish
                >
                    "Finish Analysis"
                </Button>
            </Flex>

            <Show when=move || ctx.analysis_complete()>
                <p style="margin-top: 8px; color: var(--colorPaletteGreenForeground1);">
                    "You have finished the analysis."
                </p>
            </Show>
        </div>
    }
}
