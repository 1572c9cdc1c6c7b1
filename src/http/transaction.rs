//! Per-request state machine driven by [`Client::send`].
//!
//! `Build -> PreMiddleware -> Transport -> PostMiddleware -> Done`. The
//! request leg may jump straight to `Done`; the response leg may send the
//! request again through the client, which starts a fresh transaction.

use crate::base::neterror::NetError;
use crate::client::Client;
use crate::codec::mime;
use crate::cookies::cookie::Cookie;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::uri::Uri;
use crate::middleware::{self, Exchange, MiddlewareEntry, Next};

/// Internal state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Build,
    PreMiddleware,
    Transport,
    PostMiddleware,
    Done,
}

pub struct Transaction<'a> {
    client: &'a Client,
    state: State,
    exchange: Exchange,
    middlewares: Vec<MiddlewareEntry>,
}

impl<'a> Transaction<'a> {
    pub fn new(client: &'a Client, request: Request) -> Self {
        let middlewares = middleware::merge(client.middlewares(), request.middlewares());
        Self {
            client,
            state: State::Build,
            exchange: Exchange::new(request),
            middlewares,
        }
    }

    pub async fn run(mut self) -> Result<Response, NetError> {
        loop {
            match self.state {
                State::Build => {
                    self.exchange.request = self.build(&self.exchange.request)?;
                    self.state = State::PreMiddleware;
                }
                State::PreMiddleware => {
                    self.state = State::Transport;
                    for entry in &self.middlewares {
                        if entry.middleware.handle_request(&mut self.exchange)? == Next::Stop {
                            tracing::debug!(middleware = entry.middleware.name(), "Request leg stopped");
                            self.state = State::Done;
                            break;
                        }
                    }
                }
                State::Transport => {
                    let request = self.with_cookie_header(&self.exchange.request)?;
                    let handler = (self.client.handler_factory())(self.client.config());
                    let mut response = handler.send(request.clone()).await?;
                    self.store_cookies(&request, &mut response);
                    self.decode(&mut response);
                    self.exchange.request = request;
                    self.exchange.response = response;
                    self.state = State::PostMiddleware;
                }
                State::PostMiddleware => {
                    self.state = State::Done;
                    for entry in self.middlewares.iter().rev() {
                        let next = entry
                            .middleware
                            .handle_response(self.client, &mut self.exchange)
                            .await?;
                        if next == Next::Stop {
                            tracing::debug!(middleware = entry.middleware.name(), "Response leg stopped");
                            break;
                        }
                    }
                }
                State::Done => return Ok(self.exchange.response),
            }
        }
    }

    /// Prefix merge and default headers.
    fn build(&self, request: &Request) -> Result<Request, NetError> {
        let config = self.client.config();
        let mut request = match &config.prefix_url {
            Some(prefix) => request.with_uri(request.uri().with_prefix(prefix)),
            None => request.clone(),
        };

        let authority = request
            .uri()
            .authority()
            .ok_or_else(|| NetError::InvalidUrl(format!("{}: missing host", request.uri())))?;
        let accept = request.expects().map(mime::resolve);
        let content_type = request.body().content_type().map(str::to_string);
        let body_len = request.body().len();

        let headers = request.headers_mut();
        headers.set_default("Host", &authority)?;
        headers.set_default("Connection", "close")?;
        if let Some(accept) = accept {
            headers.set_default("Accept", &accept)?;
        }
        if let Some(compress) = &config.compress {
            headers.set_default("Accept-Encoding", compress)?;
        }
        if body_len > 0 {
            if let Some(ct) = content_type {
                headers.set_default("Content-Type", &ct)?;
            }
            headers.set_default("Content-Length", &body_len.to_string())?;
        }
        Ok(request)
    }

    /// Stored cookies for this URI plus request-local ones, the latter
    /// winning by name.
    fn with_cookie_header(&self, request: &Request) -> Result<Request, NetError> {
        let uri = request.uri();
        let mut cookies: Vec<Cookie> = if self.client.config().cookie {
            self.client.cookies().get_cookies_with_condition(
                uri.host().unwrap_or(""),
                cookie_path(uri),
                uri.scheme(),
            )
        } else {
            Vec::new()
        };
        for local in request.cookies() {
            cookies.retain(|c| c.name != local.name);
            cookies.push(local.clone());
        }

        let pairs: Vec<String> = cookies
            .iter()
            .filter(|c| !c.name.is_empty() && !c.value.is_empty())
            .map(Cookie::pair)
            .collect();
        if pairs.is_empty() {
            return Ok(request.clone());
        }

        let value = match request.header("Cookie") {
            Some(existing) if !existing.is_empty() => format!("{existing}; {}", pairs.join("; ")),
            _ => pairs.join("; "),
        };
        request.with_header("Cookie", &value)
    }

    /// Parse `Set-Cookie` against the final URI and, with the jar enabled,
    /// store them and attach every cookie that now matches.
    fn store_cookies(&self, request: &Request, response: &mut Response) {
        let uri = response.uri().cloned().unwrap_or_else(|| request.uri().clone());
        let host = uri.host().unwrap_or("");
        let path = cookie_path(&uri);

        let received: Vec<Cookie> = response
            .headers()
            .get_all("Set-Cookie")
            .filter_map(|line| {
                let parsed = Cookie::from_set_cookie(line, host, path);
                if parsed.is_none() {
                    tracing::debug!(line, "Ignoring malformed Set-Cookie");
                }
                parsed
            })
            .collect();

        if !self.client.config().cookie {
            response.set_cookies(received);
            return;
        }

        let storage = self.client.cookies();
        for cookie in received {
            tracing::trace!(name = %cookie.name, domain = ?cookie.domain, "Storing cookie");
            storage.add_cookie(cookie);
        }
        response.set_cookies(storage.get_cookies_with_condition(host, path, uri.scheme()));
    }

    /// Parse the body with the response codec registered for its type.
    fn decode(&self, response: &mut Response) {
        let Some(content_type) = response.content_type().map(str::to_string) else {
            return;
        };
        let Some(codec) = self.client.registries().response.get(&content_type) else {
            return;
        };
        match codec.decode(response.body()) {
            Ok(value) => response.set_decoded(Some(value)),
            Err(e) => tracing::debug!(error = %e, content_type = %content_type, "Response body not decoded"),
        }
    }
}

fn cookie_path(uri: &Uri) -> &str {
    match uri.path() {
        "" => "/",
        path => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::Handler;
    use crate::http::method::Method;
    use crate::middleware::Middleware;
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use std::sync::{Arc, Mutex};

    /// Answers 200 with a JSON body, echoing request headers back.
    struct Echo;

    impl Handler for Echo {
        fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, NetError>> {
            Box::pin(async move {
                let mut resp = Response::new();
                resp.set_status(200, "OK");
                for h in request.headers() {
                    resp.headers_mut()
                        .append(&format!("X-Echo-{}", h.name()), h.value().unwrap_or(""))?;
                }
                resp.headers_mut().append("Set-Cookie", "sid=abc; Path=/")?;
                resp.set_body(Bytes::from_static(br#"{"ok":true}"#));
                resp.set_content_type(Some("application/json".into()), None);
                resp.set_uri(request.uri().clone());
                Ok(resp)
            })
        }
    }

    struct Unreachable;

    impl Handler for Unreachable {
        fn send(&self, _request: Request) -> BoxFuture<'_, Result<Response, NetError>> {
            Box::pin(async { Err(NetError::connection("transport must not run")) })
        }
    }

    fn client(handler: Arc<dyn Handler>, config: Config) -> Client {
        Client::builder()
            .config(config)
            .handler(Arc::new(move |_: &Config| handler.clone()))
            .build()
            .unwrap()
    }

    struct Recorder {
        name: &'static str,
        key: u32,
        log: Arc<Mutex<Vec<String>>>,
        stop: bool,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn sort_key(&self) -> u32 {
            self.key
        }

        fn handle_request(&self, exchange: &mut Exchange) -> Result<Next, NetError> {
            self.log.lock().unwrap().push(format!("req:{}", self.name));
            if self.stop {
                exchange.response.set_status(418, "Stopped");
                return Ok(Next::Stop);
            }
            Ok(Next::Continue)
        }

        fn handle_response<'a>(
            &'a self,
            _client: &'a Client,
            _exchange: &'a mut Exchange,
        ) -> BoxFuture<'a, Result<Next, NetError>> {
            self.log.lock().unwrap().push(format!("resp:{}", self.name));
            Box::pin(async { Ok(Next::Continue) })
        }
    }

    #[tokio::test]
    async fn test_default_headers_and_decode() {
        let client = client(Arc::new(Echo), Config::default().with_compress(Some("gzip")));
        let resp = client
            .post("http://example.com:8080/x")
            .json(&serde_json::json!({"a": 1}))
            .expects("json")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.header("X-Echo-Host"), Some("example.com:8080"));
        assert_eq!(resp.header("X-Echo-Connection"), Some("close"));
        assert_eq!(resp.header("X-Echo-Accept"), Some("application/json"));
        assert_eq!(resp.header("X-Echo-Accept-Encoding"), Some("gzip"));
        assert_eq!(resp.header("X-Echo-Content-Type"), Some("application/json"));
        assert_eq!(resp.header("X-Echo-Content-Length"), Some("7"));
        assert_eq!(resp.decoded(), Some(&serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_cookies_round_trip() {
        let client = client(Arc::new(Echo), Config::default());

        let first = client.get("http://example.com/").send().await.unwrap();
        assert!(first.header("X-Echo-Cookie").is_none());
        assert_eq!(first.cookies().len(), 1);
        assert_eq!(client.cookies().len(), 1);

        let second = client
            .get("http://example.com/page")
            .cookie(Cookie::new("local", "1"))
            .send()
            .await
            .unwrap();
        assert_eq!(second.header("X-Echo-Cookie"), Some("sid=abc; local=1"));
    }

    #[tokio::test]
    async fn test_cookie_jar_disabled() {
        let client = client(Arc::new(Echo), Config::default().with_cookie(false));
        let resp = client.get("http://example.com/").send().await.unwrap();
        assert_eq!(resp.cookies()[0].name, "sid");
        assert!(client.cookies().is_empty());
    }

    #[tokio::test]
    async fn test_prefix_url() {
        let config = Config::default()
            .with_prefix_url("https://api.example.com/v1/")
            .unwrap();
        let client = client(Arc::new(Echo), config);
        let resp = client.get("/users").send().await.unwrap();
        assert_eq!(resp.uri().unwrap().to_string(), "https://api.example.com/v1/users");
        assert_eq!(resp.header("X-Echo-Host"), Some("api.example.com"));
    }

    #[tokio::test]
    async fn test_middleware_order_and_stop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mw = |name, key, stop| {
            Arc::new(Recorder {
                name,
                key,
                log: log.clone(),
                stop,
            }) as Arc<dyn Middleware>
        };

        let client = client(Arc::new(Echo), Config::default());
        client
            .get("http://example.com/")
            .middleware(mw("b", 200, false))
            .middleware(mw("a", 100, false))
            .send()
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["req:a", "req:b", "resp:b", "resp:a"]
        );

        log.lock().unwrap().clear();
        let client = self::client(Arc::new(Unreachable), Config::default());
        let resp = client
            .get("http://example.com/")
            .middleware(mw("stop", 100, true))
            .middleware(mw("later", 200, false))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 418);
        assert_eq!(*log.lock().unwrap(), vec!["req:stop"]);
    }

    #[tokio::test]
    async fn test_relative_uri_without_prefix() {
        let client = client(Arc::new(Echo), Config::default());
        let err = client.get("/nohost").send().await.unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }
}
