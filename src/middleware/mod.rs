//! Request/response interceptors.
//!
//! Middlewares run in ascending sort-key order before the transport and in
//! descending order after it, like a stack. Either leg can stop the chain;
//! a stopped request leg returns the current response without touching the
//! network.

pub mod auth;
pub mod retry;

use crate::base::neterror::NetError;
use crate::client::Client;
use crate::http::request::Request;
use crate::http::response::Response;
use futures::future::BoxFuture;
use std::sync::Arc;

pub use auth::{BasicAuth, BearerAuth};
pub use retry::RetryMiddleware;

pub const DEFAULT_SORT_KEY: u32 = 500;

/// What the pipeline does after a middleware returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Continue,
    Stop,
}

/// The request in flight and the response built so far.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
    original: Request,
}

impl Exchange {
    pub fn new(request: Request) -> Self {
        Self {
            original: request.clone(),
            request,
            response: Response::new(),
        }
    }

    /// The request as handed to [`Client::send`], before prefix merge,
    /// default headers and cookies. Resends start from this one.
    pub fn original(&self) -> &Request {
        &self.original
    }
}

pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    /// Lower runs earlier on the way out and later on the way back.
    fn sort_key(&self) -> u32 {
        DEFAULT_SORT_KEY
    }

    /// Runs before the transport. May rewrite the request or fill in a
    /// response and stop.
    fn handle_request(&self, _exchange: &mut Exchange) -> Result<Next, NetError> {
        Ok(Next::Continue)
    }

    /// Runs after the transport. `client` allows sending the request again.
    fn handle_response<'a>(
        &'a self,
        _client: &'a Client,
        _exchange: &'a mut Exchange,
    ) -> BoxFuture<'a, Result<Next, NetError>> {
        Box::pin(futures::future::ready(Ok(Next::Continue)))
    }
}

/// A middleware together with the sort key it was registered under.
#[derive(Clone)]
pub struct MiddlewareEntry {
    pub sort_key: u32,
    pub middleware: Arc<dyn Middleware>,
}

impl MiddlewareEntry {
    pub fn new(middleware: Arc<dyn Middleware>) -> Self {
        Self {
            sort_key: middleware.sort_key(),
            middleware,
        }
    }

    pub fn with_sort_key(middleware: Arc<dyn Middleware>, sort_key: u32) -> Self {
        Self {
            sort_key,
            middleware,
        }
    }
}

impl std::fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("name", &self.middleware.name())
            .field("sort_key", &self.sort_key)
            .finish()
    }
}

/// Merge client and request lists into request-leg order.
///
/// The sort is stable, so equal keys keep client-before-request and
/// registration order.
pub fn merge(client: &[MiddlewareEntry], request: &[MiddlewareEntry]) -> Vec<MiddlewareEntry> {
    let mut all: Vec<MiddlewareEntry> = client.iter().chain(request.iter()).cloned().collect();
    all.sort_by_key(|e| e.sort_key);
    all
}
