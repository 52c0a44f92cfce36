//! User-supplied secrets captured once at login.
//!
//! Credentials live only in memory for the lifetime of a [`Session`](crate::Session).
//! They are never written to the config file or the log.

use std::fmt;

use crate::error::ChatError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    proxy_user: String,
    proxy_password: String,
}

impl Credentials {
    /// Build a credential set, rejecting any field that is blank after trimming.
    ///
    /// Values are stored as entered; trimming only decides emptiness.
    pub fn new(
        api_key: impl Into<String>,
        proxy_user: impl Into<String>,
        proxy_password: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let credentials = Self {
            api_key: api_key.into(),
            proxy_user: proxy_user.into(),
            proxy_password: proxy_password.into(),
        };

        if let Some(field) = credentials.first_missing() {
            return Err(ChatError::MissingCredential(field));
        }

        Ok(credentials)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn proxy_user(&self) -> &str {
        &self.proxy_user
    }

    pub fn proxy_password(&self) -> &str {
        &self.proxy_password
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    fn first_missing(&self) -> Option<&'static str> {
        [
            ("api_key", &self.api_key),
            ("proxy_user", &self.proxy_user),
            ("proxy_password", &self.proxy_password),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("proxy_user", &self.proxy_user)
            .field("proxy_password", &"<redacted>")
            .finish()
    }
}
