use super::types::{
    AssistantApi, AssistantError, FileObject, MessageList, RunStreamEvent, Thread, ThreadMessage,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

/// Клиент Assistants v2 API поверх reqwest.
///
/// Сервис владеет тредами, сообщениями, запусками и файлами; здесь только
/// транспорт и разбор SSE-кадров потокового запуска.
pub struct OpenAiAssistantClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    assistant_id: String,
}

impl OpenAiAssistantClient {
    pub fn new(api_base: String, api_key: String, assistant_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            api_key,
            assistant_id,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Ошибки API по статусу ответа
    async fn check(&self, response: Response) -> Result<Response, AssistantError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AssistantError::AuthError(body),
            StatusCode::TOO_MANY_REQUESTS => AssistantError::RateLimitExceeded,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AssistantError::InvalidRequest(body)
            }
            _ => AssistantError::ApiError(format!("HTTP {}: {}", status.as_u16(), body)),
        })
    }
}

fn network(e: reqwest::Error) -> AssistantError {
    AssistantError::NetworkError(e.to_string())
}

/// Конец первого полного SSE-кадра в буфере: (позиция, длина разделителя).
/// Кадры разделяются пустой строкой; допустимы и LF, и CRLF.
pub(crate) fn find_frame_end(buf: &str) -> Option<(usize, usize)> {
    let lf = buf.find("\n\n").map(|p| (p, 2));
    let crlf = buf.find("\r\n\r\n").map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Разобрать один SSE-кадр в пару (имя события, данные)
pub(crate) fn parse_sse_frame(frame: &str) -> Option<(String, String)> {
    let mut event = None;
    let mut data = String::new();
    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        }
    }
    event.map(|e| (e, data))
}

/// Спроецировать событие удалённого запуска в наше внутреннее.
///
/// Неинтересные события (queued, in_progress, step-и) дают `None`.
pub(crate) fn map_stream_event(event: &str, data: &str) -> Option<RunStreamEvent> {
    match event {
        "thread.run.created" => {
            let v: Value = serde_json::from_str(data).ok()?;
            Some(RunStreamEvent::RunCreated {
                run_id: v.get("id")?.as_str()?.to_string(),
            })
        }
        "thread.message.delta" => {
            let v: Value = serde_json::from_str(data).ok()?;
            let mut text = String::new();
            if let Some(blocks) = v
                .get("delta")
                .and_then(|d| d.get("content"))
                .and_then(|c| c.as_array())
            {
                for block in blocks {
                    if let Some(value) = block
                        .get("text")
                        .and_then(|t| t.get("value"))
                        .and_then(|s| s.as_str())
                    {
                        text.push_str(value);
                    }
                }
            }
            if text.is_empty() {
                None
            } else {
                Some(RunStreamEvent::TextDelta { text })
            }
        }
        "thread.run.completed" => Some(RunStreamEvent::Completed),
        "thread.run.cancelled" => Some(RunStreamEvent::Cancelled),
        "thread.run.failed" | "thread.run.expired" => {
            let detail = serde_json::from_str::<Value>(data)
                .ok()
                .and_then(|v| {
                    v.get("last_error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .map(String::from)
                })
                .unwrap_or_else(|| format!("run {}", event.trim_start_matches("thread.run.")));
            Some(RunStreamEvent::Failed { detail })
        }
        "error" => Some(RunStreamEvent::Failed {
            detail: data.to_string(),
        }),
        _ => None,
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistantClient {
    async fn create_thread(&self, file_ids: &[String]) -> Result<Thread, AssistantError> {
        let body = json!({
            "tool_resources": {
                "code_interpreter": { "file_ids": file_ids }
            }
        });
        let response = self
            .request(Method::POST, "/threads")
            .json(&body)
            .send()
            .await
            .map_err(network)?;
        self.check(response)
            .await?
            .json::<Thread>()
            .await
            .map_err(network)
    }

    async fn append_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<String, AssistantError> {
        let body = json!({ "role": "user", "content": content });
        let response = self
            .request(Method::POST, &format!("/threads/{}/messages", thread_id))
            .json(&body)
            .send()
            .await
            .map_err(network)?;
        let v: Value = self.check(response).await?.json().await.map_err(network)?;
        v.get("id")
            .and_then(|id| id.as_str())
            .map(String::from)
            .ok_or_else(|| AssistantError::ApiError("message id missing in response".into()))
    }

    async fn stream_run(
        &self,
        thread_id: &str,
        force_code_interpreter: bool,
    ) -> Result<BoxStream<'static, Result<RunStreamEvent, AssistantError>>, AssistantError> {
        let mut body = json!({
            "assistant_id": self.assistant_id,
            "temperature": 0,
            "stream": true,
        });
        if force_code_interpreter {
            body["tool_choice"] = json!({ "type": "code_interpreter" });
        }

        let response = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&body)
            .send()
            .await
            .map_err(network)?;
        let response = self.check(response).await?;

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut buf = String::new();
            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AssistantError::NetworkError(e.to_string()));
                        break;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some((pos, sep_len)) = find_frame_end(&buf) {
                    let frame = buf[..pos].to_string();
                    buf.drain(..pos + sep_len);

                    let Some((event, data)) = parse_sse_frame(&frame) else {
                        continue;
                    };
                    if event == "done" || data.trim() == "[DONE]" {
                        break 'outer;
                    }
                    if let Some(mapped) = map_stream_event(&event, &data) {
                        let terminal = !matches!(
                            mapped,
                            RunStreamEvent::RunCreated { .. } | RunStreamEvent::TextDelta { .. }
                        );
                        yield Ok(mapped);
                        if terminal {
                            break 'outer;
                        }
                    }
                }
            }
        };

        Ok(stream.boxed())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<(), AssistantError> {
        let response = self
            .request(
                Method::POST,
                &format!("/threads/{}/runs/{}/cancel", thread_id, run_id),
            )
            .send()
            .await
            .map_err(network)?;
        self.check(response).await?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AssistantError> {
        let mut all = Vec::new();
        let mut after: Option<String> = None;

        // Хронологический порядок задаёт удалённый сервис (order=asc)
        loop {
            let mut request = self
                .request(Method::GET, &format!("/threads/{}/messages", thread_id))
                .query(&[("order", "asc"), ("limit", "100")]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }
            let response = request.send().await.map_err(network)?;
            let page: MessageList = self.check(response).await?.json().await.map_err(network)?;

            let last_id = page.data.last().map(|m| m.id.clone());
            all.extend(page.data);
            if !page.has_more {
                break;
            }
            match last_id {
                Some(id) => after = Some(id),
                None => break,
            }
        }

        Ok(all)
    }

    async fn file_metadata(&self, file_id: &str) -> Result<FileObject, AssistantError> {
        let response = self
            .request(Method::GET, &format!("/files/{}", file_id))
            .send()
            .await
            .map_err(network)?;
        self.check(response)
            .await?
            .json::<FileObject>()
            .await
            .map_err(network)
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>, AssistantError> {
        let response = self
            .request(Method::GET, &format!("/files/{}/content", file_id))
            .send()
            .await
            .map_err(network)?;
        let bytes = self.check(response).await?.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_frame() {
        let frame = "event: thread.message.delta\r\ndata: {\"x\":1}";
        let (event, data) = parse_sse_frame(frame).unwrap();
        assert_eq!(event, "thread.message.delta");
        assert_eq!(data, "{\"x\":1}");
    }

    #[test]
    fn test_parse_sse_frame_without_event_is_skipped() {
        assert!(parse_sse_frame(": keep-alive comment").is_none());
    }

    #[test]
    fn test_frame_end_handles_both_line_endings() {
        // LF-поток
        assert_eq!(find_frame_end("event: a\ndata: {}\n\nrest"), Some((17, 2)));
        // CRLF-поток: "\n\n" в нём не встречается вовсе
        let crlf = "event: a\r\ndata: {}\r\n\r\nevent: b\r\n";
        assert_eq!(find_frame_end(crlf), Some((18, 4)));
        let (pos, sep) = find_frame_end(crlf).unwrap();
        let (event, data) = parse_sse_frame(&crlf[..pos]).unwrap();
        assert_eq!(event, "a");
        assert_eq!(data, "{}");
        assert_eq!(&crlf[pos + sep..], "event: b\r\n");
        // Неполный кадр ждёт следующих чанков
        assert!(find_frame_end("event: a\r\ndata: {}").is_none());
    }

    #[test]
    fn test_map_delta_concatenates_blocks() {
        let data = r#"{"delta":{"content":[
            {"index":0,"type":"text","text":{"value":"avg "}},
            {"index":0,"type":"text","text":{"value":"volume"}}
        ]}}"#;
        let ev = map_stream_event("thread.message.delta", data).unwrap();
        assert_eq!(
            ev,
            RunStreamEvent::TextDelta {
                text: "avg volume".to_string()
            }
        );
    }

    #[test]
    fn test_map_run_failed_extracts_last_error() {
        let data = r#"{"id":"run_1","last_error":{"code":"server_error","message":"boom"}}"#;
        let ev = map_stream_event("thread.run.failed", data).unwrap();
        assert_eq!(
            ev,
            RunStreamEvent::Failed {
                detail: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_map_ignores_progress_events() {
        assert!(map_stream_event("thread.run.in_progress", "{}").is_none());
        assert!(map_stream_event("thread.run.step.created", "{}").is_none());
    }

    #[test]
    fn test_map_run_created_yields_run_id() {
        let ev = map_stream_event("thread.run.created", r#"{"id":"run_42"}"#).unwrap();
        assert_eq!(
            ev,
            RunStreamEvent::RunCreated {
                run_id: "run_42".to_string()
            }
        );
    }
}
