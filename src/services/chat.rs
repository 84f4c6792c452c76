use crate::models::Speaker;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the chat-completion API
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API returned error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Stream of reply tokens in arrival order
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for an OpenAI-compatible chat-completion endpoint (Groq by default)
///
/// Each call sends a system prompt and a single user message and streams
/// the reply back as server-sent events.
pub struct ChatClient {
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl ChatClient {
    pub fn new(
        base_url: String,
        temperature: f32,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self, ChatError> {
        // Idle limit per read, not a cap on the whole streamed reply
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs)))
            .read_timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            temperature,
            max_tokens,
            client,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Start a streamed completion
    ///
    /// Failures before the reply starts (network, auth, rate limit) are
    /// returned directly; failures after that arrive as stream items.
    pub async fn stream_completion(
        &self,
        api_key: &str,
        model: &str,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<TokenStream, ChatError> {
        let body = CompletionRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: Speaker::You.role(), content: user_message },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let url = self.completions_url();
        tracing::debug!("Requesting completion from {} with model {}", url, model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::warn!("Chat completion failed: {} - {}", status, text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ChatError::Unauthorized,
                StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimited(extract_error_message(&text)),
                _ => ChatError::ApiError {
                    status: status.as_u16(),
                    message: extract_error_message(&text),
                },
            });
        }

        Ok(decode_event_stream(Box::pin(response.bytes_stream())))
    }
}

/// Pull the `error.message` out of an API error body, falling back to the raw text
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<CompletionChunk>(body)
        .ok()
        .and_then(|chunk| chunk.error)
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}

/// Tokens decoded from one network chunk
///
/// An upstream error event ends the frame but keeps the tokens decoded
/// before it, so they still reach the client ahead of the error.
#[derive(Debug, Default)]
pub struct DecodedFrame {
    pub tokens: Vec<String>,
    pub done: bool,
    pub error: Option<ChatError>,
}

/// Incremental server-sent-events decoder
///
/// Buffers raw bytes so lines (and UTF-8 sequences) split across network
/// chunks are reassembled before parsing.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> DecodedFrame {
        self.buffer.extend_from_slice(chunk);
        let mut frame = DecodedFrame::default();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            match parse_line(line.trim(), &mut frame.tokens) {
                Ok(false) => {}
                Ok(true) => {
                    frame.done = true;
                    self.buffer.clear();
                    break;
                }
                Err(e) => {
                    frame.error = Some(e);
                    self.buffer.clear();
                    break;
                }
            }
        }

        frame
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> DecodedFrame {
        let rest = std::mem::take(&mut self.buffer);
        let mut frame = DecodedFrame::default();
        let line = String::from_utf8_lossy(&rest);
        match parse_line(line.trim(), &mut frame.tokens) {
            Ok(done) => frame.done = done,
            Err(e) => frame.error = Some(e),
        }
        frame
    }
}

/// Parse one SSE line, returning true on the terminal `[DONE]` marker
fn parse_line(line: &str, tokens: &mut Vec<String>) -> Result<bool, ChatError> {
    if line.is_empty() || line.starts_with(':') {
        return Ok(false);
    }

    let Some(data) = line.strip_prefix("data:") else {
        return Ok(false);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(true);
    }

    let chunk: CompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!("Skipping malformed stream chunk: {}", e);
            return Ok(false);
        }
    };

    if let Some(error) = chunk.error {
        return Err(ChatError::InvalidResponse(error.message));
    }

    if let Some(content) = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
    {
        if !content.is_empty() {
            tokens.push(content);
        }
    }

    Ok(false)
}

struct DecodeState<S> {
    inner: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    failure: Option<ChatError>,
    finished: bool,
}

/// Turn a raw byte stream into a stream of reply tokens
pub fn decode_event_stream<S, B>(inner: S) -> TokenStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        inner,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        failure: None,
        finished: false,
    };

    let tokens = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(token) = state.pending.pop_front() {
                return Some((Ok(token), state));
            }
            if let Some(e) = state.failure.take() {
                return Some((Err(e), state));
            }
            if state.finished {
                return None;
            }

            let frame = match state.inner.next().await {
                Some(Ok(chunk)) => state.decoder.feed(chunk.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(ChatError::RequestError(e)), state));
                }
                None => {
                    state.finished = true;
                    state.decoder.finish()
                }
            };

            state.pending.extend(frame.tokens);
            if frame.done || frame.error.is_some() {
                state.finished = true;
            }
            state.failure = frame.error;
        }
    });

    Box::pin(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":{}}}}}]}}\n\n",
            serde_json::to_string(content).unwrap()
        )
    }

    #[test]
    fn test_completions_url() {
        let client = ChatClient::new("https://api.groq.com/openai/v1/".to_string(), 0.7, 512, 30).unwrap();
        assert_eq!(client.completions_url(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn test_decoder_reassembles_split_lines() {
        let mut decoder = SseDecoder::default();
        let payload = chunk("Hello");
        let (first, second) = payload.split_at(10);

        let frame = decoder.feed(first.as_bytes());
        assert!(frame.tokens.is_empty());

        let frame = decoder.feed(second.as_bytes());
        assert_eq!(frame.tokens, vec!["Hello"]);
        assert!(!frame.done);
    }

    #[test]
    fn test_decoder_skips_null_content_and_stops_at_done() {
        let mut decoder = SseDecoder::default();
        let payload = format!(
            "{}data: {{\"choices\":[{{\"delta\":{{\"content\":null}}}}]}}\n\n: keep-alive\n{}data: [DONE]\n\n{}",
            chunk("A"),
            chunk("B"),
            chunk("ignored")
        );

        let frame = decoder.feed(payload.as_bytes());
        assert_eq!(frame.tokens, vec!["A", "B"]);
        assert!(frame.done);
    }

    #[test]
    fn test_decoder_surfaces_stream_error() {
        let mut decoder = SseDecoder::default();
        let frame = decoder.feed(b"data: {\"error\":{\"message\":\"overloaded\"}}\n");
        assert!(frame.tokens.is_empty());
        assert!(matches!(frame.error, Some(ChatError::InvalidResponse(m)) if m == "overloaded"));
    }

    #[test]
    fn test_decoder_keeps_tokens_before_error() {
        let mut decoder = SseDecoder::default();
        let payload = format!(
            "{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n\n{}",
            chunk("Part "),
            chunk("dropped")
        );

        let frame = decoder.feed(payload.as_bytes());
        assert_eq!(frame.tokens, vec!["Part "]);
        assert!(matches!(frame.error, Some(ChatError::InvalidResponse(ref m)) if m == "overloaded"));
        assert!(!frame.done);
    }

    #[tokio::test]
    async fn test_decode_event_stream_yields_tokens_then_error() {
        let parts: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(chunk("Start ").into_bytes()),
            Ok(format!("{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n\n", chunk("Part ")).into_bytes()),
            Ok(chunk("never").into_bytes()),
        ];

        let items: Vec<Result<String, ChatError>> = decode_event_stream(stream::iter(parts)).collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), "Start ");
        assert_eq!(items[1].as_ref().unwrap(), "Part ");
        assert!(matches!(&items[2], Err(ChatError::InvalidResponse(m)) if m == "overloaded"));
    }

    #[test]
    fn test_decoder_flushes_unterminated_line() {
        let mut decoder = SseDecoder::default();
        let payload = chunk("tail");
        let frame = decoder.feed(payload.trim_end().as_bytes());
        assert!(frame.tokens.is_empty());

        let frame = decoder.finish();
        assert_eq!(frame.tokens, vec!["tail"]);
    }

    #[tokio::test]
    async fn test_decode_event_stream_concatenates_tokens() {
        let parts: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(chunk("Your ").into_bytes()),
            Ok(chunk("score ").into_bytes()),
            Ok(format!("{}data: [DONE]\n\n", chunk("is good.")).into_bytes()),
        ];

        let tokens: Vec<String> = decode_event_stream(stream::iter(parts))
            .map(|t| t.unwrap())
            .collect()
            .await;

        assert_eq!(tokens.concat(), "Your score is good.");
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Invalid API Key");
        assert_eq!(extract_error_message("plain text"), "plain text");
    }
}
