use crate::base::neterror::NetError;
use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::uri::Uri;

/// When to follow `Location` and how many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub allow: bool,
    /// 0 means unlimited.
    pub max: u32,
}

impl RedirectPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            allow: config.allow_redirects,
            max: config.max_redirects,
        }
    }

    /// Target of the next hop, if the response asks for one.
    ///
    /// Any non-empty `Location` counts, regardless of status. `followed` is
    /// the number of hops already taken; exceeding the limit fails with the
    /// URL the caller first asked for.
    pub fn next_hop(
        &self,
        current: &Uri,
        response: &Response,
        followed: u32,
        original: &Uri,
    ) -> Result<Option<Uri>, NetError> {
        if !self.allow {
            return Ok(None);
        }
        let location = match response.header("Location").map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => return Ok(None),
        };
        if self.max != 0 && followed >= self.max {
            return Err(NetError::TooManyRedirects {
                url: original.to_string(),
                limit: self.max,
            });
        }
        current.join(location).map(Some)
    }
}

/// Headers that carry credentials for the current origin only.
const CREDENTIAL_HEADERS: [&str; 2] = ["Authorization", "Cookie"];

/// The request for the next hop: same method, headers and body, new URI and
/// a `Host` header matching it.
///
/// Credentials are dropped when the hop leaves the current authority.
pub fn redirected(request: &Request, target: Uri) -> Result<Request, NetError> {
    let host = target
        .authority()
        .ok_or_else(|| NetError::InvalidUrl(format!("{target}: missing host")))?;
    let same_origin = request
        .uri()
        .authority()
        .is_some_and(|current| current.eq_ignore_ascii_case(&host));
    tracing::debug!(from = %request.uri(), to = %target, same_origin, "Following redirect");

    let mut next = request.with_uri(target).with_header("Host", &host)?;
    if !same_origin {
        for name in CREDENTIAL_HEADERS {
            next = next.without_header(name);
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::ErrorKind;
    use crate::http::method::Method;

    fn redirect_to(location: &str) -> Response {
        let mut resp = Response::new();
        resp.set_status(302, "Found");
        resp.headers_mut().append("Location", location).unwrap();
        resp
    }

    #[test]
    fn test_relative_location() {
        let policy = RedirectPolicy { allow: true, max: 1 };
        let uri = Uri::parse("http://example.com/a/b").unwrap();
        let next = policy.next_hop(&uri, &redirect_to("/new"), 0, &uri).unwrap().unwrap();
        assert_eq!(next.to_string(), "http://example.com/new");
    }

    #[test]
    fn test_limit_names_original_url() {
        let policy = RedirectPolicy { allow: true, max: 1 };
        let original = Uri::parse("http://example.com/start").unwrap();
        let current = Uri::parse("http://example.com/new").unwrap();

        let err = policy
            .next_hop(&current, &redirect_to("/again"), 1, &original)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RedirectLimit);
        assert!(err.to_string().contains("http://example.com/start"));
        assert!(err.to_string().contains("limit 1"));
    }

    #[test]
    fn test_unlimited_and_disabled() {
        let uri = Uri::parse("http://example.com/").unwrap();
        let unlimited = RedirectPolicy { allow: true, max: 0 };
        assert!(unlimited.next_hop(&uri, &redirect_to("/x"), 500, &uri).unwrap().is_some());

        let disabled = RedirectPolicy { allow: false, max: 0 };
        assert!(disabled.next_hop(&uri, &redirect_to("/x"), 0, &uri).unwrap().is_none());

        let empty = redirect_to("  ");
        assert!(unlimited.next_hop(&uri, &empty, 0, &uri).unwrap().is_none());
    }

    #[test]
    fn test_redirected_rewrites_host() {
        let req = Request::parse(Method::Post, "http://a.example/x")
            .unwrap()
            .with_header("Host", "a.example")
            .unwrap();
        let next = redirected(&req, Uri::parse("http://b.example:8080/y").unwrap()).unwrap();
        assert_eq!(next.method(), Method::Post);
        assert_eq!(next.header("Host"), Some("b.example:8080"));
    }

    #[test]
    fn test_redirected_drops_credentials_across_hosts() {
        let req = Request::parse(Method::Get, "http://a.example/x")
            .unwrap()
            .with_header("Authorization", "Bearer secret")
            .unwrap()
            .with_header("Cookie", "sid=abc")
            .unwrap()
            .with_header("X-Trace", "1")
            .unwrap();

        let same = redirected(&req, Uri::parse("http://A.example/y").unwrap()).unwrap();
        assert_eq!(same.header("Authorization"), Some("Bearer secret"));
        assert_eq!(same.header("Cookie"), Some("sid=abc"));

        let other = redirected(&req, Uri::parse("http://b.example/y").unwrap()).unwrap();
        assert!(other.header("Authorization").is_none());
        assert!(other.header("Cookie").is_none());
        assert_eq!(other.header("X-Trace"), Some("1"));
    }
}
