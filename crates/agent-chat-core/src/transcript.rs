//! UI-agnostic conversation state
//!
//! The transcript is the ordered list of exchanged messages plus the pending
//! flag. It is append-only: there is no API to remove or edit a message.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
}

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug)]
pub struct Transcript {
    messages: Vec<Message>,
    pending: bool,
    next_id: u64,
    revision: watch::Sender<u64>,
}

impl Transcript {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            messages: Vec::new(),
            pending: false,
            next_id: 1,
            revision,
        }
    }

    /// Append a message to the end of the transcript and return it.
    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> &Message {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            text: text.into(),
            sender,
        });
        self.bump();
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        if self.pending != pending {
            self.pending = pending;
            self.bump();
        }
    }

    /// Subscribe to mutations. The value is a revision counter that increases
    /// on every append and every pending change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&mut self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_ids() {
        let mut transcript = Transcript::new();
        transcript.append(Sender::Agent, "hello");
        transcript.append(Sender::User, "hi");
        transcript.append(Sender::Agent, "how can I help?");

        let texts: Vec<&str> = transcript.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "hi", "how can I help?"]);

        let ids: Vec<u64> = transcript.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_starts_empty_and_idle() {
        let transcript = Transcript::new();
        assert!(transcript.is_empty());
        assert!(!transcript.is_pending());
        assert_eq!(transcript.revision(), 0);
    }

    #[test]
    fn test_subscriber_sees_appends_and_pending() {
        let mut transcript = Transcript::new();
        let mut rx = transcript.subscribe();
        assert!(!rx.has_changed().unwrap());

        transcript.append(Sender::User, "ping");
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        transcript.set_pending(true);
        assert_eq!(*rx.borrow_and_update(), 2);

        // Setting the same value again is not a change
        transcript.set_pending(true);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&Sender::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
    }
}
