//! Server-Sent Events frame decoder shared by the HTTP providers
//!
//! Both the OpenAI and the Claude streaming endpoints speak plain SSE:
//!
//! ```text
//! event: content_block_delta
//! data: {"type":"content_block_delta",...}
//!
//! data: [DONE]
//! ```
//!
//! This module only splits the byte stream into frames. Each provider
//! interprets the `data` payload itself.

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

/// A single decoded SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` line, if present
    pub event: Option<String>,
    /// Joined `data:` lines
    pub data: String,
}

/// Raw byte stream as returned by `reqwest::Response::bytes_stream`
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Split a byte stream into SSE frames
///
/// Bytes are buffered until a blank line closes a frame. Frames without a
/// `data:` line (comments, keep-alives) are dropped. A UTF-8 sequence split
/// across two chunks is held back until the rest arrives.
pub fn decode_frames(
    byte_stream: ByteStream,
) -> Pin<Box<dyn Stream<Item = Result<SseFrame, LlmError>> + Send>> {
    let mut pending: Vec<u8> = Vec::new();
    let mut buffer = String::new();

    let frames = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        pending.extend_from_slice(&chunk);
        let valid_up_to = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                pending.clear();
                return futures::stream::iter(vec![Err(LlmError::StreamError(format!(
                    "Invalid UTF-8 in stream: {}",
                    e
                )))]);
            }
        };

        let complete: Vec<u8> = pending.drain(..valid_up_to).collect();
        buffer.push_str(&String::from_utf8_lossy(&complete));
        // A trailing \r stays buffered until its \n arrives
        if buffer.contains("\r\n") {
            buffer = buffer.replace("\r\n", "\n");
        }

        let mut out = Vec::new();
        while let Some(end) = buffer.find("\n\n") {
            let raw: String = buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_frame(&raw) {
                out.push(Ok(frame));
            }
        }

        futures::stream::iter(out)
    });

    Box::pin(frames)
}

/// Parse one frame of text (without the trailing blank line)
fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("event:") {
            event = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data.is_empty() {
        return None;
    }

    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}
