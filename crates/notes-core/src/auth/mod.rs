//! Credential verification, token issuance and request authentication.

mod authenticator;
pub mod password;
pub mod request;
pub mod tokens;

pub use authenticator::Authenticator;
pub use password::Passwords;
pub use request::{KEYWORD, RequestAuthenticator, parse_authorization};
pub use tokens::TokenRegistry;
