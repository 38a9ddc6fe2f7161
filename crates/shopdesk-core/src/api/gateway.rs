//! Authenticated request gateway.
//!
//! All calls that need a session go through [`Gateway::send`]. The gateway
//! owns the credential lifecycle around a single request:
//!
//! 1. no stored token: redirect to login without touching the network
//! 2. otherwise send with `Authorization: Bearer <token>` merged into the
//!    caller's headers
//! 3. apply a rotated token from the response's `Authorization` header
//! 4. on 401 clear the session and redirect to login; on any other failure
//!    surface the server's message
//!
//! There are no retries.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::auth::SessionStore;
use crate::navigation::Navigator;

use super::ApiError;

/// Scheme prefix on request and response credentials.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Strip the bearer scheme from an `Authorization` header value.
pub fn strip_bearer(raw: &str) -> &str {
    raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim()
}

#[derive(Debug, Clone)]
enum RequestBody {
    Json(Vec<u8>),
    Form(Vec<(String, String)>),
}

/// One outbound call: method, resource path, and caller-supplied options.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl AuthRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        self.body = Some(RequestBody::Json(bytes));
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.body = Some(RequestBody::Form(fields));
        self
    }
}

/// Sends requests on behalf of the current session.
/// Clone is cheap: the HTTP client, session and navigator are shared handles.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    session: SessionStore,
    navigator: Navigator,
}

impl Gateway {
    /// Create a gateway for `base_url`. `timeout` of `None` means requests
    /// wait as long as the server takes.
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        session: SessionStore,
        navigator: Navigator,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Self::with_client(client, base_url, session, navigator)
    }

    /// Create a gateway sharing an existing connection pool.
    pub fn with_client(
        client: Client,
        base_url: &str,
        session: SessionStore,
        navigator: Navigator,
    ) -> Result<Self, ApiError> {
        // Validate once so later joins only fail on bad paths
        Url::parse(base_url)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, for calls made before a session exists.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for a resource path such as `/admin/members/3`.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", self.base_url, path))?)
    }

    fn auth_headers(mut headers: HeaderMap, token: &str) -> Result<HeaderMap, ApiError> {
        let mut value = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, token))?;
        value.set_sensitive(true);
        // insert() replaces any caller-supplied credential
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Apply a rotated credential from a response, if present.
    pub(crate) fn rotate_token(&self, headers: &HeaderMap) {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return;
        };
        match value.to_str() {
            Ok(raw) => {
                let token = strip_bearer(raw);
                if token.is_empty() {
                    warn!("Ignoring empty rotated credential");
                    return;
                }
                if self.session.get().as_deref() != Some(token) {
                    debug!("Session token rotated by server");
                }
                self.session.set(token);
            }
            Err(_) => warn!("Ignoring non-ASCII Authorization response header"),
        }
    }

    /// Send an authenticated request.
    ///
    /// Returns the response untouched on 2xx. On 401 the session is cleared
    /// and the navigator is sent to login before `ApiError::Unauthorized` is
    /// returned.
    pub async fn send(&self, request: AuthRequest) -> Result<Response, ApiError> {
        let Some(token) = self.session.get() else {
            debug!(path = %request.path, "No session token, skipping request");
            self.navigator.redirect_to_login_from_current();
            return Err(ApiError::NotAuthenticated);
        };

        let url = self.url(&request.path)?;
        let mut headers = Self::auth_headers(request.headers, &token)?;

        let mut builder = self.client.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        match request.body {
            Some(RequestBody::Json(bytes)) => {
                headers
                    .entry(header::CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                builder = builder.headers(headers).body(bytes);
            }
            Some(RequestBody::Form(fields)) => {
                builder = builder.headers(headers).form(&fields);
            }
            None => {
                builder = builder.headers(headers);
            }
        }

        debug!(method = %request.method, path = %request.path, "Sending request");
        let response = builder.send().await.map_err(|e| {
            warn!(path = %request.path, error = %e, "Request failed before a response");
            ApiError::Transport(e)
        })?;

        self.rotate_token(response.headers());

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path, "Session rejected by server, logging out");
            self.session.clear();
            self.navigator.redirect_to_login_from_current();
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.map_err(|e| {
            warn!(path = %request.path, %status, error = %e, "Failed to read error response");
            ApiError::Transport(e)
        })?;
        debug!(path = %request.path, %status, "Request rejected");
        Err(ApiError::from_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{AdminSection, Route};
    use serde_json::json;
    use wiremock::matchers::{body_json, header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> Gateway {
        Gateway::new(
            &server.uri(),
            None,
            SessionStore::ephemeral(),
            Navigator::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer xyz789"), "xyz789");
        assert_eq!(strip_bearer("xyz789"), "xyz789");
        assert_eq!(strip_bearer("Bearer "), "");
    }

    #[test]
    fn test_url_join() {
        let gw = Gateway::new(
            "http://localhost:8080/",
            None,
            SessionStore::ephemeral(),
            Navigator::default(),
        )
        .unwrap();
        assert_eq!(
            gw.url("/admin/members/3").unwrap().as_str(),
            "http://localhost:8080/admin/members/3"
        );
        assert_eq!(gw.url("api/member").unwrap().as_str(), "http://localhost:8080/api/member");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Gateway::new(
            "not a url",
            None,
            SessionStore::ephemeral(),
            Navigator::default(),
        );
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_no_token_skips_network_and_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.navigator().navigate(Route::Admin(AdminSection::Users));

        let result = gw.send(AuthRequest::get("/admin/users")).await;

        assert!(matches!(result, Err(ApiError::NotAuthenticated)));
        assert_eq!(gw.navigator().route(), Route::Login);
        assert_eq!(
            gw.navigator().return_destination(),
            Route::Admin(AdminSection::Users)
        );
        server.verify().await;
    }

    #[tokio::test]
    async fn test_bearer_injected_and_rotated_token_stored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/member"))
            .and(header_is("authorization", "Bearer abc123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Authorization", "Bearer xyz789")
                    .set_body_json(json!({ "username": "user" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.session().set("abc123");

        let response = gw.send(AuthRequest::get("/api/member")).await.unwrap();

        assert_eq!(gw.session().get().as_deref(), Some("xyz789"));
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "username": "user" }));
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_and_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
            )
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.session().set("abc123");
        gw.navigator().navigate(Route::OrderHistory);

        let result = gw.send(AuthRequest::get("/api/orders")).await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(gw.session().get(), None);
        assert_eq!(gw.navigator().route(), Route::Login);
        assert_eq!(gw.navigator().return_destination(), Route::OrderHistory);
    }

    #[tokio::test]
    async fn test_unauthorized_with_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(401).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.session().set("abc123");

        let result = gw.send(AuthRequest::delete("/admin/members/1")).await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(gw.session().get(), None);
        assert_eq!(gw.navigator().route(), Route::Login);
    }

    #[tokio::test]
    async fn test_server_error_surfaces_message_and_keeps_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "DB error" })),
            )
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.session().set("abc123");
        gw.navigator().navigate(Route::Products);

        let err = gw.send(AuthRequest::get("/api/products")).await.unwrap_err();

        assert_eq!(err.to_string(), "DB error");
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(gw.session().get().as_deref(), Some("abc123"));
        assert_eq!(gw.navigator().route(), Route::Products);
    }

    #[tokio::test]
    async fn test_rotation_applies_on_failed_response() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("Authorization", "Bearer fresh")
                    .set_body_json(json!({ "message": "Invalid price" })),
            )
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.session().set("abc123");

        let err = gw
            .send(AuthRequest::put("/admin/products/1"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid price");
        assert_eq!(gw.session().get().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_caller_headers_query_and_json_body_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/roles"))
            .and(query_param("dryRun", "true"))
            .and(header_is("x-request-source", "shopdesk"))
            .and(header_is("authorization", "Bearer abc123"))
            .and(header_is("content-type", "application/json"))
            .and(body_json(json!({ "name": "ROLE_STAFF" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let gw = gateway(&server);
        gw.session().set("abc123");

        let request = AuthRequest::post("/admin/roles")
            .query("dryRun", true)
            .header(
                HeaderName::from_static("x-request-source"),
                HeaderValue::from_static("shopdesk"),
            )
            // The session credential wins over a caller-supplied one
            .header(header::AUTHORIZATION, HeaderValue::from_static("Bearer stale"))
            .json(&json!({ "name": "ROLE_STAFF" }))
            .unwrap();

        gw.send(request).await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_and_keeps_session() {
        // Nothing listens on this port once the listener is dropped
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let uri = format!("http://127.0.0.1:{}", port);
        let gw = Gateway::new(&uri, None, SessionStore::ephemeral(), Navigator::default())
            .unwrap();
        gw.session().set("abc123");

        let err = gw.send(AuthRequest::get("/api/member")).await.unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!err.is_auth_failure());
        assert_eq!(gw.session().get().as_deref(), Some("abc123"));
        assert_eq!(gw.navigator().route(), Route::Home);
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_transport_failure() {
        use std::io::{Read, Write};

        // Promises 100 body bytes, sends 5, then hangs up
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            while !received.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            stream
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort",
                )
                .unwrap();
        });

        let uri = format!("http://127.0.0.1:{}", port);
        let gw = Gateway::new(&uri, None, SessionStore::ephemeral(), Navigator::default())
            .unwrap();
        gw.session().set("abc123");

        let err = gw.send(AuthRequest::get("/api/member")).await.unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)), "got {:?}", err);
        assert_eq!(gw.session().get().as_deref(), Some("abc123"));
    }
}
