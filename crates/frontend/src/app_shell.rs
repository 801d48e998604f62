//! Application Shell - корневые компоненты приложения
//!
//! Содержит:
//! - `AppShell` - auth gate (показывает LoginPage или MainLayout)
//! - `MainLayout` - основной layout (Sidebar + активный раздел)

use crate::domain::a002_conversation::ui::view::AnalyzeView;
use crate::domain::a003_artifact::ui::view::DownloadView;
use crate::layout::sidebar::Sidebar;
use crate::layout::{ActiveView, SessionContext};
use crate::system::auth::context::use_auth;
use crate::system::pages::login::LoginPage;
use contracts::domain::a001_analysis_session::SessionView;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Main application layout: sidebar слева, активный раздел справа
#[component]
fn MainLayout() -> impl IntoView {
    let ctx = SessionContext::new();
    provide_context(ctx);

    let (auth_state, _) = use_auth();

    // Начальное состояние сессии с бэкенда
    Effect::new(move |_| {
        let Some(token) = auth_state.get().access_token else {
            return;
        };
        spawn_local(async move {
            match crate::system::auth::api::fetch_with_auth::<SessionView>(
                "/api/a001-session",
                &token,
            )
            .await
            {
                Ok(view) => ctx.session.set(Some(view)),
                Err(e) => log::warn!("session load failed: {}", e),
            }
        });
    });

    view! {
        <div style="height: 100vh; display: flex;">
            <Sidebar />
            <div style="flex: 1; overflow: hidden;">
                {move || match ctx.active.get() {
                    ActiveView::Analyze => view! { <AnalyzeView /> }.into_any(),
                    ActiveView::Download => view! { <DownloadView /> }.into_any(),
                }}
            </div>
        </div>
    }
}

/// Application shell - auth gate component.
///
/// Показывает:
/// - `LoginPage` если пользователь не авторизован
/// - `MainLayout` если авторизован
#[component]
pub fn AppShell() -> impl IntoView {
    let (auth_state, _) = use_auth();

    view! {
        <Show
            when=move || auth_state.get().access_token.is_some()
            fallback=|| view! { <LoginPage /> }
        >
            <MainLayout />
        </Show>
    }
}
