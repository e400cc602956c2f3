//! HTTP access to the UniSearch REST API.

mod client;
mod navigator;
mod status;

pub use client::{unwrap_envelope, ApiClient, API_KEY_HEADER};
pub use navigator::{Navigator, ADMIN_LOGIN_ROUTE, ADMIN_ROUTE, HOME_ROUTE, LOGIN_ROUTE};
pub use status::{message_for_status, server_message};
