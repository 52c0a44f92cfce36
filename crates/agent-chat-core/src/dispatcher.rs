//! Request lifecycle for one chat turn.
//!
//! A send is split into three steps so a UI can keep its event loop free while
//! the network call runs:
//!
//! 1. [`begin`] validates the input, appends the user message and marks the
//!    transcript pending. It returns the request to post, or `None` when the
//!    send is skipped.
//! 2. [`ChatClient::post`] performs the single HTTP round trip.
//! 3. [`complete`] reduces the result into exactly one agent message and
//!    clears the pending flag.
//!
//! No step retries, times out, or cancels.

use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::Credentials;
use crate::session::SessionId;
use crate::transcript::{Sender, Transcript};

/// Shown when the backend answers 2xx with a missing or empty `answer`.
pub const FALLBACK_ANSWER: &str = "Sorry, I could not process your request.";

const ERROR_PREFIX: &str = "Sorry, there was an error";

#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    pub gemini_api_key: String,
    pub mcp_user: String,
    pub mcp_password: String,
}

impl ChatRequest {
    pub fn new(message: &str, session_id: &SessionId, credentials: &Credentials) -> Self {
        Self {
            message: message.to_string(),
            session_id: session_id.as_str().to_string(),
            gemini_api_key: credentials.api_key().to_string(),
            mcp_user: credentials.proxy_user().to_string(),
            mcp_password: credentials.proxy_password().to_string(),
        }
    }
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("message", &self.message)
            .field("session_id", &self.session_id)
            .field("mcp_user", &self.mcp_user)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default, deserialize_with = "answer_text")]
    pub answer: Option<String>,
}

/// Accept any JSON `answer`: strings as-is, other non-null values rendered as JSON.
fn answer_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No usable response: connection failure or a body that is not JSON.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx status. `detail` carries the backend's own explanation when it
    /// sent one.
    #[error("{}", http_message(.status, .reason, .detail))]
    Http {
        status: u16,
        reason: String,
        detail: Option<String>,
    },
}

/// What a send did to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Precondition failed; nothing was appended and nothing was sent.
    Skipped,
    /// The backend answered; holds the agent text that was appended.
    Answered(String),
    /// The request failed; an error bubble was appended.
    Failed(DispatchError),
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn post(&self, request: &ChatRequest) -> Result<ChatReply, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "chat backend responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http_error(status, &body));
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }
}

fn http_message(status: &u16, reason: &str, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("HTTP {}: {}", status, reason),
    }
}

fn http_error(status: StatusCode, body: &str) -> DispatchError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|value| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });

    DispatchError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        detail,
    }
}

/// Steps 1-3 of a send. Returns `None` (and touches nothing) when the text is
/// blank, credentials are missing, or a request is already pending.
pub fn begin(
    transcript: &mut Transcript,
    session_id: &SessionId,
    credentials: Option<&Credentials>,
    text: &str,
) -> Option<ChatRequest> {
    if text.trim().is_empty() || transcript.is_pending() {
        return None;
    }
    let credentials = credentials.filter(|c| c.is_complete())?;

    transcript.append(Sender::User, text);
    transcript.set_pending(true);
    tracing::info!(session = %session_id, "dispatching chat message");

    Some(ChatRequest::new(text, session_id, credentials))
}

/// Steps 4-6 of a send: append exactly one agent message and clear pending.
pub fn complete(transcript: &mut Transcript, result: Result<ChatReply, DispatchError>) -> Outcome {
    let outcome = match result {
        Ok(reply) => {
            let text = reply
                .answer
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| FALLBACK_ANSWER.to_string());
            transcript.append(Sender::Agent, text.clone());
            Outcome::Answered(text)
        }
        Err(err) => {
            tracing::warn!(error = %err, "chat request failed");
            transcript.append(Sender::Agent, format!("{}: {}", ERROR_PREFIX, err));
            Outcome::Failed(err)
        }
    };

    transcript.set_pending(false);
    outcome
}
