pub mod client;
pub mod types;

pub use client::OpenAiAssistantClient;
pub use types::{AssistantApi, AssistantError, RunStreamEvent};

use once_cell::sync::OnceCell;
use std::sync::Arc;

static CLIENT: OnceCell<Arc<dyn AssistantApi>> = OnceCell::new();

/// Инициализировать процессный клиент ассистента (один раз, при старте)
pub fn set_client(client: Arc<dyn AssistantApi>) -> anyhow::Result<()> {
    CLIENT
        .set(client)
        .map_err(|_| anyhow::anyhow!("assistant client already initialized"))
}

/// Процессный клиент ассистента
pub fn get_client() -> Arc<dyn AssistantApi> {
    CLIENT
        .get()
        .expect("assistant client not initialized")
        .clone()
}
