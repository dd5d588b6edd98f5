use futures::StreamExt;

use crate::errors::ChatResult;
use crate::providers::base::ByteStream;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecoderState {
    #[default]
    Open,
    Terminated,
}

/// Splits server-sent-event bytes into `data:` payloads.
///
/// Lines are cut at the byte level before decoding, so a multi-byte character
/// split across chunks is reassembled before it is ever turned into text. An
/// unterminated trailing line stays buffered until more bytes arrive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    state: DecoderState,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        if self.state == DecoderState::Open {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// Next complete data payload, if one is buffered
    pub fn next_event(&mut self) -> Option<String> {
        while self.state == DecoderState::Open {
            let newline = self.buffer.iter().position(|b| *b == b'\n')?;
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim_end_matches(['\n', '\r']);

            if line.trim().is_empty() {
                continue;
            }

            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                tracing::trace!(line, "ignoring non-data line");
                continue;
            };
            let payload = payload.strip_prefix(' ').unwrap_or(payload);

            if payload.trim() == DONE_MARKER {
                self.terminate();
                return None;
            }
            return Some(payload.to_string());
        }
        None
    }

    /// Whether the terminator line has been seen
    pub fn is_terminated(&self) -> bool {
        self.state == DecoderState::Terminated
    }

    /// Drop whatever partial line is still buffered, returning its size in bytes
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        discarded
    }

    fn terminate(&mut self) {
        self.state = DecoderState::Terminated;
        self.buffer.clear();
    }
}

/// Result of one [`EventStream::pull`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull {
    Event(String),
    End,
}

/// Pulls event payloads out of a response body, one read at a time
pub struct EventStream {
    body: ByteStream,
    decoder: SseDecoder,
    exhausted: bool,
}

impl EventStream {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: SseDecoder::new(),
            exhausted: false,
        }
    }

    /// Next payload in arrival order, or `End` once the terminator line is
    /// seen or the body is exhausted. A failed read ends the stream.
    pub async fn pull(&mut self) -> ChatResult<Pull> {
        loop {
            if let Some(payload) = self.decoder.next_event() {
                return Ok(Pull::Event(payload));
            }
            if self.exhausted || self.decoder.is_terminated() {
                return Ok(Pull::End);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.decoder.feed(&chunk),
                Some(Err(e)) => {
                    self.exhausted = true;
                    self.decoder.finish();
                    return Err(e);
                }
                None => {
                    self.exhausted = true;
                    let discarded = self.decoder.finish();
                    if !self.decoder.is_terminated() {
                        tracing::warn!(discarded, "stream ended without a terminator line");
                    }
                }
            }
        }
    }
}
