pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod proxy;
pub mod session;
pub mod transcript;

// Re-export main types for convenience
pub use config::Config;
pub use credentials::Credentials;
pub use dispatcher::{ChatClient, ChatReply, ChatRequest, DispatchError, Outcome};
pub use error::ChatError;
pub use flow::{FlowEvent, Screen, ScreenFlow};
pub use session::{Session, SessionId};
pub use transcript::{Message, Sender, Transcript};
