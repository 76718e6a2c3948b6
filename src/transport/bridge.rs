//! HTTP bridge to the chat network
//!
//! `GET /events` streams newline-delimited JSON frames for as long as the
//! bridge's chat session is up. `POST /messages` sends a text message.

use super::{EventStream, TransportError, TransportEvent};
use futures::{future, StreamExt};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;

/// Name of the credential file inside the auth folder
const TOKEN_FILE: &str = "token";

const MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    to: &'a str,
    text: &'a str,
}

/// Client for the bridge's HTTP API
pub struct BridgeTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BridgeTransport {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, TransportError> {
        // No overall timeout: the event stream is long-lived
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Read the bearer token from `<auth_dir>/token`, if there is one
    pub fn load_token(auth_dir: &Path) -> Option<String> {
        let path = auth_dir.join(TOKEN_FILE);
        match std::fs::read_to_string(&path) {
            Ok(token) => {
                let token = token.trim().to_string();
                (!token.is_empty()).then_some(token)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "No bridge token, connecting without credentials");
                None
            }
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Open the inbound event stream
    pub async fn open_events(&self) -> Result<EventStream, TransportError> {
        let response = self
            .authorize(self.client.get(format!("{}/events", self.base_url)))
            .header("accept", "application/x-ndjson")
            .send()
            .await
            .map_err(|e| classify_request_error(&e))?;
        let response = check_status(response).await?;

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let lines = FramedRead::new(
            StreamReader::new(bytes),
            LinesCodec::new_with_max_length(MAX_FRAME_BYTES),
        );

        Ok(lines.filter_map(|line| future::ready(decode_frame(line))).boxed())
    }

    /// Send a text message to `to`
    pub async fn post_text(&self, to: &str, text: &str) -> Result<(), TransportError> {
        let response = self
            .authorize(self.client.post(format!("{}/messages", self.base_url)))
            .json(&SendTextRequest { to, text })
            .send()
            .await
            .map_err(|e| classify_request_error(&e))?;
        check_status(response).await?;
        Ok(())
    }
}

fn classify_request_error(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::timeout(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        TransportError::network(format!("Connection failed: {e}"))
    } else {
        TransportError::unknown(format!("Request failed: {e}"))
    }
}

async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::from_status(status.as_u16(), &body))
}

/// Turn one line into a frame. Blank and undecodable lines are skipped.
fn decode_frame(line: Result<String, LinesCodecError>) -> Option<Result<TransportEvent, TransportError>> {
    match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => match serde_json::from_str(&line) {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable bridge frame");
                None
            }
        },
        Err(LinesCodecError::MaxLineLengthExceeded) => Some(Err(TransportError::protocol(format!(
            "Bridge frame exceeds {MAX_FRAME_BYTES} bytes"
        )))),
        Err(LinesCodecError::Io(e)) => Some(Err(TransportError::network(format!("Event stream failed: {e}")))),
    }
}
