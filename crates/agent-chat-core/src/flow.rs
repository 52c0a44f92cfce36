use std::fmt;

use crate::credentials::Credentials;
use crate::error::ChatError;

/// Which screen the client is showing. Progression is strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    AwaitingCredentials,
    AwaitingProxyConfirmation,
    Active,
}

impl Screen {
    pub fn display_name(&self) -> &'static str {
        match self {
            Screen::AwaitingCredentials => "awaiting credentials",
            Screen::AwaitingProxyConfirmation => "awaiting proxy confirmation",
            Screen::Active => "active",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    CredentialsSubmitted(Credentials),
    ProxyConfirmed,
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::CredentialsSubmitted(_) => "credentials submission",
            FlowEvent::ProxyConfirmed => "proxy confirmation",
        }
    }
}

#[derive(Debug, Default)]
pub struct ScreenFlow {
    screen: Screen,
}

impl ScreenFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The single forward-transition function.
    ///
    /// Returns the screen reached. Any (screen, event) pair outside the linear
    /// sequence is rejected and leaves the flow where it was.
    pub fn advance(&mut self, event: &FlowEvent) -> Result<Screen, ChatError> {
        let next = match (self.screen, event) {
            (Screen::AwaitingCredentials, FlowEvent::CredentialsSubmitted(_)) => {
                Screen::AwaitingProxyConfirmation
            }
            (Screen::AwaitingProxyConfirmation, FlowEvent::ProxyConfirmed) => Screen::Active,
            (from, event) => return Err(ChatError::invalid(from, event)),
        };

        tracing::info!(from = %self.screen, to = %next, "screen transition");
        self.screen = next;
        Ok(next)
    }
}
