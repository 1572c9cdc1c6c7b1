//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): the error taxonomy shared by every layer
//! - [`context`]: helpers turning `io::Error` into `NetError` with context

pub mod context;
pub mod neterror;
