//! The per-run session context.
//!
//! One [`Session`] owns everything that lives for a single run of the client:
//! the session token, the credentials captured at login, the screen flow and
//! the transcript. It is constructed explicitly and handed to whatever needs it.

use std::fmt;

use uuid::Uuid;

use crate::credentials::Credentials;
use crate::dispatcher::{self, ChatClient, ChatReply, ChatRequest, DispatchError, Outcome};
use crate::error::ChatError;
use crate::flow::{FlowEvent, Screen, ScreenFlow};
use crate::transcript::{Sender, Transcript};

pub const WELCOME_MESSAGE: &str =
    "Hello! I am an intelligent agent. How can I assist you with your tasks today?";

/// Opaque token echoed to the backend with every request. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    credentials: Option<Credentials>,
    flow: ScreenFlow,
    transcript: Transcript,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::generate())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            credentials: None,
            flow: ScreenFlow::new(),
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn screen(&self) -> Screen {
        self.flow.screen()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.transcript.is_pending()
    }

    /// Apply a flow event, storing credentials or seeding the welcome message
    /// as the reached screen requires.
    pub fn advance(&mut self, event: FlowEvent) -> Result<Screen, ChatError> {
        let screen = self.flow.advance(&event)?;

        match (screen, event) {
            (Screen::AwaitingProxyConfirmation, FlowEvent::CredentialsSubmitted(creds)) => {
                self.credentials = Some(creds);
            }
            (Screen::Active, _) => {
                self.transcript.append(Sender::Agent, WELCOME_MESSAGE);
            }
            _ => {}
        }

        Ok(screen)
    }

    pub fn submit_credentials(&mut self, credentials: Credentials) -> Result<Screen, ChatError> {
        self.advance(FlowEvent::CredentialsSubmitted(credentials))
    }

    pub fn confirm_proxy(&mut self) -> Result<Screen, ChatError> {
        self.advance(FlowEvent::ProxyConfirmed)
    }

    /// Start a send. `None` means the send was skipped and nothing changed.
    pub fn begin_send(&mut self, text: &str) -> Option<ChatRequest> {
        dispatcher::begin(&mut self.transcript, &self.id, self.credentials.as_ref(), text)
    }

    pub fn complete_send(&mut self, result: Result<ChatReply, DispatchError>) -> Outcome {
        dispatcher::complete(&mut self.transcript, result)
    }

    /// Run a whole send inline: begin, post, complete.
    pub async fn send(&mut self, client: &ChatClient, text: &str) -> Outcome {
        let Some(request) = self.begin_send(text) else {
            return Outcome::Skipped;
        };
        let result = client.post(&request).await;
        self.complete_send(result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
