//! Request middleware
//!
//! Author: hephaex@gmail.com

pub mod security_headers;
pub mod session;

pub use security_headers::security_headers_middleware;
pub use session::{session_middleware, ActiveSession, SESSION_HEADER};
