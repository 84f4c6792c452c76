// Service exports
pub mod chat;
pub mod credentials;
pub mod session;

pub use chat::{ChatClient, ChatError, TokenStream};
pub use credentials::{ApiCredential, CredentialSource, CredentialStore};
pub use session::{SessionError, SessionState, SessionStore};
