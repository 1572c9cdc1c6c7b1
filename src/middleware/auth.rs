use super::{Exchange, Middleware, Next};
use crate::base::neterror::NetError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

/// Sets `Authorization: Basic ...` unless the request already has one.
pub struct BasicAuth {
    username: String,
    password: Zeroizing<String>,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    fn header_value(&self) -> String {
        let token = Zeroizing::new(format!("{}:{}", self.username, self.password.as_str()));
        format!("Basic {}", STANDARD.encode(token.as_bytes()))
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Middleware for BasicAuth {
    fn name(&self) -> &str {
        "basic-auth"
    }

    fn handle_request(&self, exchange: &mut Exchange) -> Result<Next, NetError> {
        exchange
            .request
            .headers_mut()
            .set_default("Authorization", &self.header_value())?;
        Ok(Next::Continue)
    }
}

/// Sets `Authorization: Bearer <token>` unless the request already has one.
pub struct BearerAuth {
    token: Zeroizing<String>,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerAuth(<redacted>)")
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &str {
        "bearer-auth"
    }

    fn handle_request(&self, exchange: &mut Exchange) -> Result<Next, NetError> {
        exchange
            .request
            .headers_mut()
            .set_default("Authorization", &format!("Bearer {}", self.token.as_str()))?;
        Ok(Next::Continue)
    }
}
