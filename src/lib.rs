//! # wirehttp
//!
//! An HTTP/1.x client library with a hand-written wire layer.
//!
//! `wirehttp` sends requests either over its own raw-socket transport or
//! through hyper, and wraps both in a middleware pipeline with a cookie jar
//! and pluggable body codecs.
//!
//! ## Features
//!
//! - **Two transports**: raw socket (chunked, Content-Length and read-to-EOF
//!   framing) and a hyper HTTP/1 engine, sharing one redirect policy
//! - **Cookie Management**: domain/path matching, replacement rules,
//!   persistence to a key-value store
//! - **Proxy Support**: HTTP CONNECT and SOCKS5 (with username/password)
//! - **TLS**: BoringSSL, with SNI and certificate verification
//! - **Middlewares**: sort-keyed request/response interceptors, including
//!   retry with exponential backoff and basic/bearer auth
//! - **Codecs**: JSON, URL-encoded forms and multipart uploads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wirehttp::{Client, Config};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wirehttp::NetError> {
//!     let client = Client::builder()
//!         .config(Config::default().with_timeout(Duration::from_secs(10)))
//!         .build()?;
//!     let response = client.get("http://example.com/").send().await?;
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`config`] - Client configuration
//! - [`cookies`] - Cookie parsing, matching, storage and persistence
//! - [`http`] - Request/response values, wire parsing, transactions
//! - [`handler`] - Transport handlers
//! - [`middleware`] - Middleware pipeline and shipped middlewares
//! - [`codec`] - Body codecs and registries
//! - [`socket`] - Connections, TLS and proxy tunnels

pub mod base;
pub mod client;
pub mod codec;
pub mod config;
pub mod cookies;
pub mod handler;
pub mod http;
pub mod middleware;
pub mod socket;

pub use base::neterror::{ErrorKind, NetError};
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use config::Config;
pub use cookies::cookie::Cookie;
pub use cookies::storage::CookieStorage;
pub use crate::http::{Method, Request, Response, Uri, Version};
pub use socket::proxy::{Proxy, ProxyType};
