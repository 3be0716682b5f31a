//! Incremental decoder for OpenAI-style server-sent-event completion bodies.

use crate::error::ProviderError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    /// A choice reported a `finish_reason`; the completion is whole even if `[DONE]` never
    /// arrives.
    Finished,
    Done,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamErrorBody>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamErrorBody {
    message: String,
}

pub type Decoded = Vec<Result<SseEvent, ProviderError>>;

/// Buffers raw bytes and yields one event per complete `data:` line.
///
/// Bytes are held until a newline arrives, so multi-byte characters split across network
/// chunks are decoded whole. Decoding stops at the first bad line; events before it are
/// still returned, followed by the error.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Decoded {
        self.buffer.extend_from_slice(chunk);
        let mut decoded = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if !decode_line(&line, &mut decoded) {
                self.buffer.clear();
                break;
            }
        }
        decoded
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Decoded {
        let mut decoded = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            decode_line(&line, &mut decoded);
        }
        decoded
    }
}

/// Appends the line's events; returns false when the line was an error.
fn decode_line(line: &[u8], decoded: &mut Decoded) -> bool {
    match parse_line(&String::from_utf8_lossy(line)) {
        Ok(events) => {
            decoded.extend(events.into_iter().map(Ok));
            true
        }
        Err(err) => {
            decoded.push(Err(err));
            false
        }
    }
}

fn parse_line(line: &str) -> Result<Vec<SseEvent>, ProviderError> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    // Comments, `event:`, `id:` and blank separators carry nothing for us.
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(Vec::new());
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(vec![SseEvent::Done]);
    }
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| ProviderError::Stream(format!("invalid stream chunk {:?}: {}", data, e)))?;
    if let Some(error) = chunk.error {
        return Err(ProviderError::Stream(error.message));
    }
    let mut finished = false;
    let mut content = String::new();
    for choice in chunk.choices {
        if let Some(text) = choice.delta.content {
            content.push_str(&text);
        }
        finished |= choice.finish_reason.is_some();
    }
    let mut events = Vec::new();
    if !content.is_empty() {
        events.push(SseEvent::Delta(content));
    }
    if finished {
        events.push(SseEvent::Finished);
    }
    Ok(events)
}
