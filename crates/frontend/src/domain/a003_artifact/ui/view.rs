//! Artifacts - View Component

use super::model;
use crate::system::auth::context::use_auth;
use contracts::domain::a003_artifact::ArtifactMeta;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

#[component]
#[allow(non_snake_case)]
pub fn DownloadView() -> impl IntoView {
    let items = RwSignal::new(Vec::<ArtifactMeta>::new());
    let failed = RwSignal::new(Vec::<String>::new());
    let error = RwSignal::new(Option::<String>::None);
    let is_loading = RwSignal::new(true);

    let (auth_state, _) = use_auth();

    // Каждое открытие раздела пересканирует тред: файлы, появившиеся
    // после завершения анализа, тоже попадают в список
    Effect::new(move |_| {
        let Some(token) = auth_state.get().access_token else {
            return;
        };
        spawn_local(async move {
            match model::fetch_artifacts(&token).await {
                Ok(response) => {
                    items.set(response.items);
                    failed.set(response.failed);
                    error.set(None);
                }
                Err(e) => error.set(Some(e)),
            }
            is_loading.set(false);
        });
    });

    let handle_download = move |meta: ArtifactMeta| {
        let Some(token) = auth_state.get_untracked().access_token else {
            return;
        };
        spawn_local(async move {
            if let Err(e) = model::download_artifact(&meta.file_id, &meta.name, &token).await {
                error.set(Some(e));
            }
        });
    };

    view! {
        <div style="height: 100%; display: flex; flex-direction: column; padding: 20px; overflow-y: auto;">
            <h2 style="font-size: 18px; font-weight: bold; margin-bottom: 8px;">
                "Download Generated Files"
            </h2>
            <p style="color: var(--colorNeutralForeground3); margin-bottom: 16px;">
                "Файлы, созданные ассистентом в ходе анализа."
            </p>

            {move || {
                error
                    .get()
                    .map(|e| {
                        view! {
                            <div style="padding: 12px; margin-bottom: 12px; background: var(--colorPaletteRedBackground1); border-radius: 8px;">
                                <span style="color: var(--colorPaletteRedForeground1);">{e}</span>
                            </div>
                        }
                    })
            }}

            <Show when=move || is_loading.get()>
                <p>"Preparing files for download..."</p>
            </Show>

            <Show when=move || !is_loading.get() && items.get().is_empty() && error.get().is_none()>
                <p style="color: var(--colorNeutralForeground3);">
                    "Ассистент пока не создал ни одного файла."
                </p>
            </Show>

            <Flex vertical=true style="gap: 8px;">
                <For
                    each=move || items.get()
                    key=|meta| meta.file_id.clone()
                    let:meta
                >
                    {
                        let label = format!("Download {}", meta.name);
                        let meta_for_click = meta.clone();
                        view! {
                            <Button
                                appearance=ButtonAppearance::Secondary
                                on_click=move |_| handle_download(meta_for_click.clone())
                            >
                                {label}
                            </Button>
                        }
                    }
                </For>
            </Flex>

            <Show when=move || !failed.get().is_empty()>
                <p style="margin-top: 12px; color: var(--colorPaletteRedForeground1);">
                    {move || format!("Не удалось подготовить: {}", failed.get().join(", "))}
                </p>
            </Show>
        </div>
    }
}
