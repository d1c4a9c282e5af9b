// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newline-delimited JSON parser for Ollama streaming chat responses.
//!
//! Converts a reqwest response byte stream into a [`TokenStream`]. Lines may
//! be split across network chunks; they are reassembled before decoding.
//! Transport failures become one final human-readable token.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use localmind_core::TokenStream;
use tracing::{debug, warn};

use crate::types::ChatChunk;

/// Token sent when the backend cannot be reached.
pub fn unavailable_token(detail: &str) -> String {
    format!("[Error] The generation service is unavailable: {detail}")
}

/// Token sent when the backend does not know the requested model.
pub fn model_not_found_token(model: &str) -> String {
    format!("[Error] Model '{model}' was not found. Pull it before chatting.")
}

/// Token sent for any other non-success status.
pub fn status_token(status: reqwest::StatusCode, body: &str) -> String {
    format!("[Error] The generation service returned {status}: {body}")
}

/// Token sent when the stream breaks after it started.
pub fn interrupted_token(detail: &str) -> String {
    format!("[Error] The response stream was interrupted: {detail}")
}

/// What one NDJSON line means for the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A non-empty content fragment.
    Token(String),
    /// The stream is complete. A final fragment may ride along.
    Done(Option<String>),
    /// The backend reported an error in-band.
    Error(String),
    /// Blank, malformed, or content-free line.
    Skip,
}

/// Decode a single NDJSON line.
pub fn parse_line(line: &[u8]) -> LineEvent {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return LineEvent::Skip;
    }
    let chunk: ChatChunk = match serde_json::from_slice(trimmed) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "skipping malformed stream line");
            return LineEvent::Skip;
        }
    };
    if let Some(error) = chunk.error {
        return LineEvent::Error(error);
    }
    let content = chunk
        .message
        .map(|m| m.content)
        .filter(|c| !c.is_empty());
    match (chunk.done, content) {
        (true, content) => LineEvent::Done(content),
        (false, Some(content)) => LineEvent::Token(content),
        (false, None) => LineEvent::Skip,
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

struct NdjsonState {
    bytes: ByteStream,
    buf: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
}

impl NdjsonState {
    /// Feed one decoded line. Returns true once the stream is complete.
    fn push_line(&mut self, line: &[u8]) -> bool {
        match parse_line(line) {
            LineEvent::Token(t) => {
                self.pending.push_back(t);
                false
            }
            LineEvent::Done(last) => {
                self.pending.extend(last);
                true
            }
            LineEvent::Error(e) => {
                warn!(error = %e, "generation backend reported an error mid-stream");
                self.pending.push_back(interrupted_token(&e));
                true
            }
            LineEvent::Skip => false,
        }
    }

    /// Split every complete line out of the buffer.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if self.push_line(&line) {
                self.finished = true;
                self.buf.clear();
                return;
            }
        }
    }
}

/// Parses a streaming chat response into a stream of tokens.
pub fn parse_ndjson_stream(response: reqwest::Response) -> TokenStream {
    token_stream(Box::pin(response.bytes_stream()))
}

fn token_stream(bytes: ByteStream) -> TokenStream {
    let state = NdjsonState {
        bytes,
        buf: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let tokens = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(token) = st.pending.pop_front() {
                return Some((token, st));
            }
            if st.finished {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.buf.extend_from_slice(&chunk);
                    st.drain_lines();
                }
                Some(Err(e)) => {
                    warn!(error = %e, "chat stream interrupted");
                    st.pending.push_back(interrupted_token(&e.to_string()));
                    st.finished = true;
                }
                None => {
                    // A final line without a trailing newline still counts.
                    let rest = std::mem::take(&mut st.buf);
                    st.push_line(&rest);
                    st.finished = true;
                }
            }
        }
    });

    Box::pin(tokens)
}

/// A stream carrying exactly one token.
pub fn single_token(token: String) -> TokenStream {
    Box::pin(stream::once(async move { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_chunks(chunks: Vec<&'static str>) -> TokenStream {
        let bytes = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, reqwest::Error>(Bytes::from_static(c.as_bytes()))),
        );
        token_stream(Box::pin(bytes))
    }

    #[test]
    fn parse_line_token() {
        let line = br#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#;
        assert_eq!(parse_line(line), LineEvent::Token("Hel".into()));
    }

    #[test]
    fn parse_line_done_without_content() {
        let line = br#"{"message":{"role":"assistant","content":""},"done":true,"total_duration":1}"#;
        assert_eq!(parse_line(line), LineEvent::Done(None));
    }

    #[test]
    fn parse_line_skips_blank_and_garbage() {
        assert_eq!(parse_line(b"   \r\n"), LineEvent::Skip);
        assert_eq!(parse_line(b"not json"), LineEvent::Skip);
        assert_eq!(parse_line(br#"{"done":false}"#), LineEvent::Skip);
    }

    #[test]
    fn parse_line_in_band_error() {
        assert_eq!(
            parse_line(br#"{"error":"out of memory"}"#),
            LineEvent::Error("out of memory".into())
        );
    }

    #[tokio::test]
    async fn tokens_arrive_in_order_and_stop_at_done() {
        let s = from_chunks(vec![
            "{\"message\":{\"content\":\"Hello\"},\"done\":false}\n",
            "{\"message\":{\"content\":\" Ido\"},\"done\":false}\n",
            "{\"message\":{\"content\":\"\"},\"done\":true}\n",
            "{\"message\":{\"content\":\"ignored\"},\"done\":false}\n",
        ]);
        let tokens: Vec<String> = s.collect().await;
        assert_eq!(tokens, vec!["Hello", " Ido"]);
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_reassembled() {
        let s = from_chunks(vec![
            "{\"message\":{\"con",
            "tent\":\"Hi\"},\"done\":false}\n{\"message\":",
            "{\"content\":\"!\"},\"done\":true}",
        ]);
        let tokens: Vec<String> = s.collect().await;
        assert_eq!(tokens, vec!["Hi", "!"]);
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let s = from_chunks(vec![
            "garbage\n\n",
            "{\"message\":{\"content\":\"ok\"},\"done\":false}\n",
            "{\"done\":true}\n",
        ]);
        let tokens: Vec<String> = s.collect().await;
        assert_eq!(tokens, vec!["ok"]);
    }

    #[tokio::test]
    async fn in_band_error_ends_with_error_token() {
        let s = from_chunks(vec![
            "{\"message\":{\"content\":\"partial\"},\"done\":false}\n",
            "{\"error\":\"model crashed\"}\n",
            "{\"message\":{\"content\":\"never\"},\"done\":false}\n",
        ]);
        let tokens: Vec<String> = s.collect().await;
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], "partial");
        assert_eq!(tokens[1], interrupted_token("model crashed"));
    }

    #[tokio::test]
    async fn stream_without_done_ends_at_eof() {
        let s = from_chunks(vec!["{\"message\":{\"content\":\"a\"},\"done\":false}\n"]);
        let tokens: Vec<String> = s.collect().await;
        assert_eq!(tokens, vec!["a"]);
    }

    #[tokio::test]
    async fn single_token_yields_once() {
        let tokens: Vec<String> = single_token("x".into()).collect().await;
        assert_eq!(tokens, vec!["x"]);
    }

    #[test]
    fn error_tokens_are_prefixed() {
        assert!(unavailable_token("refused").starts_with("[Error]"));
        assert_eq!(
            model_not_found_token("llama3"),
            "[Error] Model 'llama3' was not found. Pull it before chatting."
        );
        assert!(status_token(reqwest::StatusCode::BAD_GATEWAY, "x").contains("502"));
    }
}
