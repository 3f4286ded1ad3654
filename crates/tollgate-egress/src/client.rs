// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client factory.
//!
//! [`build_client`] returns a plain timeout-only client for trusted calls, or
//! a guarded client whose every connection goes through [`SafeDialer`].

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, Url, redirect};
use serde::Serialize;
use tollgate_core::EgressError;
use tracing::{debug, warn};

use crate::classify::AddressPolicy;
use crate::dial::{HostResolver, SafeDialer, SystemResolver};

/// Maximum redirect hops a guarded client follows.
const MAX_REDIRECTS: usize = 10;

/// Configuration for [`build_client`]. Immutable once handed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Overall request timeout; also bounds resolution and connect.
    pub timeout: Duration,
    /// Route every connection through the safe dialer.
    pub block_private_networks: bool,
    /// Deployment additions to the classifier.
    pub policy: AddressPolicy,
}

impl ClientConfig {
    pub fn new(timeout: Duration, block_private_networks: bool) -> Self {
        Self {
            timeout,
            block_private_networks,
            policy: AddressPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AddressPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// An outbound request: method, URL, headers and optional body.
///
/// Builder errors are deferred until [`Client::execute`], the way reqwest's
/// own request builder behaves.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    error: Option<String>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Result<Self, EgressError> {
        let parsed = Url::parse(url)
            .map_err(|e| EgressError::InvalidRequest(format!("invalid URL {url:?}: {e}")))?;
        Ok(Self::from_url(method, parsed))
    }

    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    pub fn get(url: &str) -> Result<Self, EgressError> {
        Self::new(Method::GET, url)
    }

    pub fn post(url: &str) -> Result<Self, EgressError> {
        Self::new(Method::POST, url)
    }

    /// Set a header, replacing any previous value.
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => self.fail(format!("invalid value for header {name}: {e}")),
        }
        self
    }

    /// Serialize `payload` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Self {
        match serde_json::to_vec(payload) {
            Ok(body) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.body = Some(body);
            }
            Err(e) => self.fail(format!("unable to encode request body: {e}")),
        }
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

/// HTTP client returned by [`build_client`].
///
/// Cheap to clone and safe to share between tasks. The underlying reqwest
/// client is private so no request can skip the guard.
#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    config: ClientConfig,
    dialer: Option<SafeDialer>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("guarded", &self.is_guarded())
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Whether the safe dial hook is installed in the transport.
    pub fn is_guarded(&self) -> bool {
        self.dialer.is_some()
    }

    /// Send a request.
    ///
    /// Egress errors (`Blocked`, `ResolutionFailed`, `MalformedAddress`,
    /// `Timeout`) come back as themselves, whichever layer raised them.
    /// Non-2xx statuses are not errors here.
    pub async fn execute(&self, request: Request) -> Result<Response, EgressError> {
        if let Some(message) = request.error {
            return Err(EgressError::InvalidRequest(message));
        }
        if self.is_guarded() {
            // The connector skips the resolver for IP-literal hosts.
            check_literal_host(&request.url, &self.config.policy)?;
        }

        debug!(
            method = %request.method,
            host = request.url.host_str().unwrap_or_default(),
            guarded = self.is_guarded(),
            "sending outbound request"
        );

        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
            .send()
            .await
            .map_err(|e| match EgressError::from_transport(e) {
                EgressError::Transport(e) if e.is_timeout() => EgressError::Timeout {
                    duration: self.config.timeout,
                },
                other => other,
            })
    }
}

/// Build a client from `config` using the system resolver.
pub fn build_client(config: &ClientConfig) -> Result<Client, EgressError> {
    build_client_with_resolver(config, Arc::new(SystemResolver))
}

/// Build a client whose guarded path resolves through `resolver`.
///
/// The resolver is ignored when `block_private_networks` is false.
pub fn build_client_with_resolver(
    config: &ClientConfig,
    resolver: Arc<dyn HostResolver>,
) -> Result<Client, EgressError> {
    if !config.block_private_networks {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(client_build_error)?;
        return Ok(Client {
            inner,
            config: config.clone(),
            dialer: None,
        });
    }

    let dialer = SafeDialer::new(config.timeout)
        .with_resolver(resolver)
        .with_policy(config.policy.clone());

    let inner = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .dns_resolver(Arc::new(dialer.clone()))
        .redirect(redirect_policy(Arc::new(config.policy.clone())))
        // A proxy would become the dialed address instead of the target.
        .no_proxy()
        .build()
        .map_err(client_build_error)?;

    Ok(Client {
        inner,
        config: config.clone(),
        dialer: Some(dialer),
    })
}

fn client_build_error(e: reqwest::Error) -> EgressError {
    warn!("failed to build HTTP client: {e}");
    EgressError::ClientBuild(e.to_string())
}

/// Re-check every redirect hop whose host is an IP literal.
fn redirect_policy(policy: Arc<AddressPolicy>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match check_literal_host(attempt.url(), &policy) {
            Ok(()) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    })
}

/// Classify the URL host when it is an IP literal. Hostnames pass; they are
/// checked by the resolver hook at connect time.
fn check_literal_host(url: &Url, policy: &AddressPolicy) -> Result<(), EgressError> {
    let ip = match url.host() {
        Some(url::Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(url::Host::Ipv6(v6)) => IpAddr::V6(v6),
        _ => return Ok(()),
    };
    match policy.check(ip) {
        None => Ok(()),
        Some(reason) => {
            let host = url.host_str().unwrap_or_default().to_string();
            warn!(host = %host, %reason, "egress blocked: literal address is non-public");
            Err(EgressError::Blocked { host })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(block: bool) -> ClientConfig {
        ClientConfig::new(Duration::from_secs(5), block)
    }

    async fn ok_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn unguarded_client_has_no_dial_hook() {
        let client = build_client(&config(false)).unwrap();
        assert!(!client.is_guarded());
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn guarded_client_installs_dial_hook() {
        let client = build_client(&config(true)).unwrap();
        assert!(client.is_guarded());
        assert!(client.config().block_private_networks);
    }

    #[test]
    fn request_rejects_bad_url() {
        let err = Request::get("not a url").unwrap_err();
        assert!(matches!(err, EgressError::InvalidRequest(_)));
    }

    #[test]
    fn request_json_sets_content_type() {
        let req = Request::post("https://api.example.com/1/messages.json")
            .unwrap()
            .json(&serde_json::json!({"message": "hi"}));
        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn raw_body_is_sent_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("token=abc&user=u"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(&config(false)).unwrap();
        let req = Request::post(&format!("{}/upload", server.uri()))
            .unwrap()
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("token=abc&user=u");
        let resp = client.execute(req).await.unwrap();
        assert_eq!(resp.status(), 204);
    }

    #[tokio::test]
    async fn bad_header_value_surfaces_on_execute() {
        let client = build_client(&config(false)).unwrap();
        let req = Request::get("http://example.invalid/")
            .unwrap()
            .header(reqwest::header::USER_AGENT, "bad\nvalue");
        let err = client.execute(req).await.unwrap_err();
        assert!(matches!(err, EgressError::InvalidRequest(m) if m.contains("user-agent")));
    }

    #[test]
    fn literal_check_blocks_private_hosts() {
        let policy = AddressPolicy::default();
        for url in [
            "http://127.0.0.1:8080/",
            "http://[::1]/",
            "http://169.254.169.254/latest/meta-data/",
            "http://[::ffff:10.0.0.1]/",
        ] {
            let url = Url::parse(url).unwrap();
            assert!(
                matches!(check_literal_host(&url, &policy), Err(EgressError::Blocked { .. })),
                "{url} should be blocked"
            );
        }
    }

    #[test]
    fn literal_check_passes_hostnames_and_public_literals() {
        let policy = AddressPolicy::default();
        for url in ["https://example.com/", "http://93.184.216.34/", "http://localhost/"] {
            let url = Url::parse(url).unwrap();
            assert!(check_literal_host(&url, &policy).is_ok(), "{url}");
        }
    }

    #[tokio::test]
    async fn unguarded_client_reaches_loopback() {
        let server = ok_server().await;
        let client = build_client(&config(false)).unwrap();
        let resp = client
            .execute(Request::get(&server.uri()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn guarded_client_blocks_loopback_literal() {
        let server = ok_server().await;
        let client = build_client(&config(true)).unwrap();
        let err = client
            .execute(Request::get(&server.uri()).unwrap())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.ends_with("destination is a non-public address"));
        match err {
            EgressError::Blocked { host } => assert_eq!(host, "127.0.0.1"),
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn guarded_client_blocks_localhost_via_resolver_hook() {
        let server = ok_server().await;
        let port = server.address().port();
        let client = build_client(&config(true)).unwrap();
        let err = client
            .execute(Request::get(&format!("http://localhost:{port}/")).unwrap())
            .await
            .unwrap_err();
        match err {
            EgressError::Blocked { host } => assert_eq!(host, "localhost"),
            other => panic!("expected Blocked, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn guarded_client_with_allowlisted_loopback_succeeds() {
        let server = ok_server().await;
        let policy = AddressPolicy::new().allow_ip("127.0.0.1".parse().unwrap());
        let client = build_client(&config(true).with_policy(policy)).unwrap();
        let resp = client
            .execute(Request::get(&server.uri()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn guarded_client_blocks_redirect_to_metadata_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "http://169.254.169.254/latest/meta-data/"),
            )
            .mount(&server)
            .await;

        let policy = AddressPolicy::new().allow_ip("127.0.0.1".parse().unwrap());
        let client = build_client(&config(true).with_policy(policy)).unwrap();
        let err = client
            .execute(Request::get(&format!("{}/feed", server.uri())).unwrap())
            .await
            .unwrap_err();
        match err {
            EgressError::Blocked { host } => assert_eq!(host, "169.254.169.254"),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_2xx_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let client = build_client(&config(false)).unwrap();
        let resp = client
            .execute(Request::get(&server.uri()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
    }
}
