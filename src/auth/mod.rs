//! Credential state and the login flows that populate it.

mod service;
mod store;

pub use service::{validate_api_key_format, AdminLoginRequest, AdminLoginResponse, AuthService, DEFAULT_ADMIN_USERNAME};
pub use store::{AuthCredential, AuthStore, PersistedAuth};
