//! Sidebar component with the two application views

use crate::layout::{use_session, ActiveView};
use crate::system::auth::context::{do_logout, use_auth};
use leptos::prelude::*;
use thaw::*;

#[component]
pub fn Sidebar() -> impl IntoView {
    let ctx = use_session();
    let (auth_state, set_auth_state) = use_auth();

    let username = move || {
        auth_state
            .get()
            .user_info
            .map(|u| u.username)
            .unwrap_or_default()
    };

    view! {
        <div style="width: 220px; min-width: 220px; height: 100%; display: flex; flex-direction: column; padding: 16px; border-right: 1px solid var(--colorNeutralStroke2); background: var(--colorNeutralBackground2);">
            <h2 style="font-size: 16px; font-weight: bold; margin-bottom: 16px;">
                "E-Trading Analysis"
            </h2>

            <Flex vertical=true style="gap: 8px; flex: 1;">
                <Button
                    appearance=move || {
                        if ctx.active.get() == ActiveView::Analyze {
                            ButtonAppearance::Primary
                        } else {
                            ButtonAppearance::Secondary
                        }
                    }
                    on_click=move |_| ctx.active.set(ActiveView::Analyze)
                >
                    "Analyze"
                </Button>

                // Download доступен только после Finish Analysis
                <Button
                    appearance=move || {
                        if ctx.active.get() == ActiveView::Download {
                            ButtonAppearance::Primary
                        } else {
                            ButtonAppearance::Secondary
                        }
                    }
                    disabled=Signal::derive(move || !ctx.analysis_complete())
                    on_click=move |_| ctx.active.set(ActiveView::Download)
                >
                    "Download"
                </Button>

                <Show when=move || !ctx.analysis_complete()>
                    <span style="font-size: 12px; color: var(--colorNeutralForeground3);">
                        "Завершите анализ, чтобы открыть скачивание"
                    </span>
                </Show>
            </Flex>

            <Flex vertical=true style="gap: 8px;">
                <span style="font-size: 13px; color: var(--colorNeutralForeground3);">
                    {username}
                </span>
                <Button
                    appearance=ButtonAppearance::Secondary
                    on_click=move |_| do_logout(set_auth_state)
                >
                    "Выйти"
                </Button>
            </Flex>
        </div>
    }
}
