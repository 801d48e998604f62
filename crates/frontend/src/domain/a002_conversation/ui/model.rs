//! Conversation - Model (API functions)

use std::rc::Rc;

use contracts::domain::a002_conversation::ConversationEvent;
use gloo_net::http::Request;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventSource, MessageEvent};

use crate::shared::api_utils::api_base;

/// Заготовленные вопросы. Отправляются без принудительного
/// code_interpreter, в отличие от вопросов, набранных вручную.
pub const PRE_WRITTEN_QUESTIONS: [&str; 5] = [
    "What is the average trade volume?",
    "flag interesting trades and return a neat table",
    "look at trades done per friendly name and return a stacked bar with the lion king colors for currency traded",
    "find which clients are ahead of market trends and which clients are lagging and return names in a table",
    "Are there any outliers in the data?",
];

const EVENT_NAMES: [&str; 5] = ["appended", "text_delta", "completed", "failed", "cancelled"];

/// Открыть SSE-поток отправки вопроса.
///
/// Токен и вопрос идут query-параметрами: EventSource не умеет выставлять
/// заголовки. Каждое именованное событие несёт в data JSON всего события;
/// закрытие потока - ответственность вызывающего (по терминальному событию).
pub fn open_ask_stream(
    question: &str,
    force_code_interpreter: bool,
    access_token: &str,
    on_event: impl Fn(ConversationEvent) + 'static,
) -> Result<EventSource, String> {
    let url = format!(
        "{}/api/a002-conversation/ask?token={}&question={}&force_code_interpreter={}",
        api_base(),
        urlencoding::encode(access_token),
        urlencoding::encode(question),
        force_code_interpreter,
    );

    let source = EventSource::new(&url).map_err(|e| format!("EventSource failed: {:?}", e))?;
    let on_event = Rc::new(on_event);

    for name in EVENT_NAMES {
        let handler = Rc::clone(&on_event);
        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
            let Some(text) = ev.data().as_string() else {
                return;
            };
            match serde_json::from_str::<ConversationEvent>(&text) {
                Ok(event) => handler(event),
                Err(e) => log::warn!("bad stream event: {}", e),
            }
        });
        source
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(|e| format!("listener failed: {:?}", e))?;
        // Замыкание живёт до конца страницы; потоки короткоживущие и редкие
        closure.forget();
    }

    // Обрыв до терминального события — отказ; автопереподключение
    // EventSource пересоздало бы запуск, поэтому сразу закрываем
    let err_handler = Rc::clone(&on_event);
    let err_source = source.clone();
    let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
        err_source.close();
        err_handler(ConversationEvent::Failed {
            detail: "Connection to the analysis stream was lost".to_string(),
        });
    });
    source.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_error.forget();

    Ok(source)
}

/// Отменить выполняющийся запуск
pub async fn cancel_run(access_token: &str) -> Result<(), String> {
    let response = Request::post(&format!("{}/api/a002-conversation/cancel", api_base()))
        .header("Authorization", &format!("Bearer {}", access_token))
        .send()
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;

    if !response.ok() {
        return Err(format!("Cancel failed: {}", response.status()));
    }
    Ok(())
}
