use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;

use crate::error::{FetchError, ParseAuthKindError, ParseMethodError};

/// Default whole-request timeout: 15 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(900_000);

/// HTTP methods the relay can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Wire form of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

/// Authentication scheme selector, before credential fields are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthKind {
    #[default]
    None,
    Basic,
    Bearer,
}

impl AuthKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::None => "none",
            AuthKind::Basic => "basic",
            AuthKind::Bearer => "bearer",
        }
    }
}

impl FromStr for AuthKind {
    type Err = ParseAuthKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(AuthKind::None),
            "basic" => Ok(AuthKind::Basic),
            "bearer" => Ok(AuthKind::Bearer),
            _ => Err(ParseAuthKindError(s.to_string())),
        }
    }
}

/// Authentication to apply to the outgoing request.
///
/// Exactly one variant is active, and a variant cannot exist without its
/// credential fields, so an invalid (scheme, missing-field) combination never
/// reaches the network layer. Use [`AuthSpec::from_parts`] to assemble one
/// from loose option values.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthSpec {
    #[default]
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl AuthSpec {
    /// Assemble an auth spec from loose option values.
    ///
    /// Fails with [`FetchError::AuthConfig`] when the selected scheme is
    /// missing a required field; empty strings count as missing.
    pub fn from_parts(
        kind: AuthKind,
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Result<Self, FetchError> {
        let require = |value: Option<String>, missing: &'static str| {
            value
                .filter(|v| !v.is_empty())
                .ok_or(FetchError::AuthConfig {
                    kind: kind.as_str(),
                    missing,
                })
        };
        match kind {
            AuthKind::None => Ok(AuthSpec::None),
            AuthKind::Basic => Ok(AuthSpec::Basic {
                username: require(username, "auth-username")?,
                password: require(password, "auth-password")?,
            }),
            AuthKind::Bearer => Ok(AuthSpec::Bearer {
                token: require(token, "auth-token")?,
            }),
        }
    }

    /// The `Authorization` header value this spec produces, if any.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            AuthSpec::None => None,
            AuthSpec::Basic { username, password } => {
                let credentials = BASE64.encode(format!("{username}:{password}"));
                Some(format!("Basic {credentials}"))
            }
            AuthSpec::Bearer { token } => Some(format!("Bearer {token}")),
        }
    }
}

impl fmt::Debug for AuthSpec {
    // Credentials stay out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthSpec::None => f.write_str("None"),
            AuthSpec::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthSpec::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// A fully specified request for the source document.
///
/// Immutable once constructed; the builder methods consume and return the
/// request.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gcsrelay_fetch::{Method, TransferRequest};
///
/// let request = TransferRequest::new("https://example.com/data.bin")
///     .method(Method::Get)
///     .header("Accept", "application/octet-stream")
///     .timeout(Duration::from_secs(30))
///     .retry_enabled(true);
/// ```
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Duration,
    pub retry_enabled: bool,
    pub auth: AuthSpec,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::default(),
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            retry_enabled: false,
            auth: AuthSpec::default(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a single request header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Replace the header set.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a request body. Attached for any method, as configured.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Whole-request timeout, connection establishment included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry_enabled(mut self, retry_enabled: bool) -> Self {
        self.retry_enabled = retry_enabled;
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: AuthSpec) -> Self {
        self.auth = auth;
        self
    }
}
