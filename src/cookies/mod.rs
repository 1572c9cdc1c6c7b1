//! Cookie jar.
//!
//! - [`cookie::Cookie`] parses and renders `Set-Cookie` values.
//! - [`matching`] holds the domain and path rules.
//! - [`storage::CookieStorage`] is the jar with its replace/no-op rules.
//! - [`persistence`] saves and loads the jar through a [`persistence::KeyValueStore`].
//!
//! ```rust
//! use wirehttp::cookies::cookie::Cookie;
//! use wirehttp::cookies::storage::CookieStorage;
//!
//! let jar = CookieStorage::new();
//! let cookie = Cookie::from_set_cookie("sid=1; Path=/", "example.com", "/login").unwrap();
//! jar.add_cookie(cookie);
//!
//! let sent = jar.get_cookies_with_condition("www.example.com", "/app", Some("https"));
//! assert_eq!(sent.len(), 1);
//! ```

pub mod cookie;
pub mod matching;
pub mod persistence;
pub mod storage;
