//! Предпросмотр датасета на странице анализа

use crate::system::auth::api::fetch_with_auth;
use crate::system::auth::context::use_auth;
use contracts::projections::p900_dataset_preview::DatasetPreview;
use leptos::prelude::*;
use leptos::task::spawn_local;
use thaw::*;

/// Таблица с первыми строками датасета.
///
/// Отказ загрузки не валит страницу: на месте таблицы показывается текст
/// ошибки, остальной раздел остаётся рабочим.
#[component]
pub fn DatasetPreviewPanel() -> impl IntoView {
    let preview = RwSignal::new(Option::<DatasetPreview>::None);
    let error = RwSignal::new(Option::<String>::None);

    let (auth_state, _) = use_auth();

    Effect::new(move |_| {
        let Some(token) = auth_state.get().access_token else {
            return;
        };
        spawn_local(async move {
            match fetch_with_auth::<DatasetPreview>("/api/p900/dataset-preview", &token).await {
                Ok(data) => {
                    preview.set(Some(data));
                    error.set(None);
                }
                Err(e) => error.set(Some(format!("Не удалось загрузить датасет: {}", e))),
            }
        });
    });

    view! {
        <div style="margin-bottom: 16px;">
            <h3 style="font-size: 15px; font-weight: bold; margin-bottom: 8px;">
                "Датасет"
                {move || {
                    preview
                        .get()
                        .map(|p| format!(" ({} строк)", p.total_rows))
                        .unwrap_or_default()
                }}
            </h3>

            {move || {
                error
                    .get()
                    .map(|e| {
                        view! {
                            <div style="padding: 8px; color: var(--colorPaletteRedForeground1);">
                                {e}
                            </div>
                        }
                    })
            }}

            {move || {
                preview
                    .get()
                    .map(|p| {
                        view! {
                            <div style="overflow-x: auto; max-height: 240px; overflow-y: auto; border: 1px solid var(--colorNeutralStroke2); border-radius: 6px;">
                                <Table>
                                    <TableHeader>
                                        <TableRow>
                                            {p
                                                .headers
                                                .clone()
                                                .into_iter()
                                                .map(|h| {
                                                    view! { <TableHeaderCell>{h}</TableHeaderCell> }
                                                })
                                                .collect_view()}
                                        </TableRow>
                                    </TableHeader>
                                    <TableBody>
                                        {p
                                            .rows
                                            .clone()
                                            .into_iter()
                                            .map(|row| {
                                                view! {
                                                    <TableRow>
                                                        {row
                                                            .into_iter()
                                                            .map(|cell| {
                                                                view! {
                                                                    <TableCell>
                                                                        <TableCellLayout>{cell}</TableCellLayout>
                                                                    </TableCell>
                                                                }
                                                            })
                                                            .collect_view()}
                                                    </TableRow>
                                                }
                                            })
                                            .collect_view()}
                                    </TableBody>
                                </Table>
                            </div>
                        }
                    })
            }}
        </div>
    }
}
