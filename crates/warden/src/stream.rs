//! Event-stream reassembly
//!
//! When an upstream ignores the non-streaming rewrite and answers with
//! server-sent events, the frames are folded back into the single
//! completion object a non-streaming call would have returned, so the
//! outbound scanner always sees one buffer.
//!
//! OpenAI chunks look like:
//! ```json
//! {"id":"chatcmpl-123","model":"gpt-4o","choices":[{"index":0,"delta":{"content":"Hel"}}]}
//! ```

use serde_json::{Value, json};

const DEFAULT_ROLE: &str = "assistant";
const DEFAULT_FINISH_REASON: &str = "stop";

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// Data event containing the payload
    Data(String),
    /// Terminal [DONE] marker
    Done,
}

/// Split a raw event-stream body into events.
///
/// Consecutive `data:` lines form one event; blank lines end it. Comments,
/// `event:`/`id:` fields and anything else are ignored.
pub fn parse_sse_events(raw: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();
    let mut current_data = String::new();

    for line in raw.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            if data == "[DONE]" {
                if !current_data.is_empty() {
                    events.push(SseEvent::Data(std::mem::take(&mut current_data)));
                }
                events.push(SseEvent::Done);
            } else if !current_data.is_empty() {
                current_data.push('\n');
                current_data.push_str(data);
            } else {
                current_data = data.to_string();
            }
        } else if line.is_empty() && !current_data.is_empty() {
            events.push(SseEvent::Data(std::mem::take(&mut current_data)));
        }
    }

    if !current_data.is_empty() {
        events.push(SseEvent::Data(current_data));
    }

    events
}

/// Whether a response body should be treated as an event stream
pub fn is_event_stream(content_type: Option<&str>, body: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/event-stream")) {
        return true;
    }
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(b"data:")
}

/// Accumulates streamed deltas into one completion
#[derive(Debug, Default)]
pub struct StreamAssembler {
    id: String,
    model: String,
    created: Option<Value>,
    role: String,
    content: String,
    finish_reason: String,
    usage: Option<Value>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one decoded chunk into the running state
    pub fn push_chunk(&mut self, chunk: &Value) {
        set_if_non_empty(&mut self.id, chunk.get("id"));
        set_if_non_empty(&mut self.model, chunk.get("model"));

        if let Some(created) = chunk.get("created").filter(|c| !c.is_null()) {
            self.created = Some(created.clone());
        }
        if let Some(usage) = chunk.get("usage").filter(|u| u.is_object()) {
            self.usage = Some(usage.clone());
        }

        let Some(choice) = chunk
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        else {
            return;
        };

        if let Some(delta) = choice.get("delta") {
            set_if_non_empty(&mut self.role, delta.get("role"));
            if let Some(text) = delta.get("content").and_then(Value::as_str) {
                self.content.push_str(text);
            }
        } else if let Some(text) = choice.get("text").and_then(Value::as_str) {
            // Legacy completions stream bare `text` pieces
            self.content.push_str(text);
        }
        set_if_non_empty(&mut self.finish_reason, choice.get("finish_reason"));
    }

    /// Fold one raw event payload; undecodable payloads are skipped
    pub fn push_event(&mut self, data: &str) {
        if let Ok(chunk) = serde_json::from_str::<Value>(data) {
            self.push_chunk(&chunk);
        }
    }

    pub fn finish(self) -> Value {
        let role = if self.role.is_empty() {
            DEFAULT_ROLE.to_string()
        } else {
            self.role
        };
        let finish_reason = if self.finish_reason.is_empty() {
            DEFAULT_FINISH_REASON.to_string()
        } else {
            self.finish_reason
        };

        let mut completion = json!({
            "id": self.id,
            "object": "chat.completion",
            "created": self.created.unwrap_or(Value::from(0)),
            "model": self.model,
            "choices": [{
                "index": 0,
                "message": {
                    "role": role,
                    "content": self.content,
                },
                "finish_reason": finish_reason,
            }],
        });

        if let (Some(usage), Some(obj)) = (self.usage, completion.as_object_mut()) {
            obj.insert("usage".to_string(), usage);
        }

        completion
    }
}

fn set_if_non_empty(slot: &mut String, value: Option<&Value>) {
    if let Some(s) = value.and_then(Value::as_str).filter(|s| !s.is_empty()) {
        *slot = s.to_string();
    }
}

/// Reassemble a raw event-stream body into completion JSON text
pub fn assemble(raw: &str) -> String {
    let mut assembler = StreamAssembler::new();
    for event in parse_sse_events(raw) {
        if let SseEvent::Data(data) = event {
            assembler.push_event(&data);
        }
    }
    assembler.finish().to_string()
}
