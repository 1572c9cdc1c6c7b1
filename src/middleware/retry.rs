use super::{Exchange, Middleware, Next};
use crate::base::neterror::NetError;
use crate::client::Client;
use crate::http::retry::{calculate_backoff, should_retry, RetryConfig};
use futures::future::BoxFuture;
use std::time::Duration;

/// Request attribute marking a resend, so the nested pass does not retry again.
pub const RETRY_ATTEMPT: &str = "retry-attempt";

/// Resends the request while the response has an error status (>= 400).
///
/// Each resend goes through the full client pipeline. The task sleeps for
/// the backoff before every attempt.
#[derive(Debug, Clone, Default)]
pub struct RetryMiddleware {
    config: RetryConfig,
}

impl RetryMiddleware {
    pub fn new(count: usize) -> Self {
        Self {
            config: RetryConfig::new(count),
        }
    }

    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.config = self.config.with_base_delay(delay);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Middleware for RetryMiddleware {
    fn name(&self) -> &str {
        "retry"
    }

    fn handle_response<'a>(
        &'a self,
        client: &'a Client,
        exchange: &'a mut Exchange,
    ) -> BoxFuture<'a, Result<Next, NetError>> {
        Box::pin(async move {
            if exchange.request.attribute(RETRY_ATTEMPT).is_some() || !exchange.response.has_errors() {
                return Ok(Next::Continue);
            }

            let mut attempt = 0;
            while should_retry(attempt, &self.config) && exchange.response.has_errors() {
                attempt += 1;
                let delay = calculate_backoff(attempt, &self.config);
                tracing::debug!(
                    attempt,
                    status = exchange.response.status(),
                    delay_ms = delay.as_millis() as u64,
                    url = %exchange.request.uri(),
                    "Retrying request"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let request = exchange
                    .original()
                    .with_attribute(RETRY_ATTEMPT, attempt.to_string());
                exchange.response = client.send(request).await?;
            }

            if exchange.response.has_errors() {
                tracing::warn!(
                    attempts = attempt,
                    status = exchange.response.status(),
                    "Giving up after retries"
                );
            }
            Ok(Next::Continue)
        })
    }
}
