//! Connection settings, session handling, and response classification.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use qbt_core::{ClientError, ClientResult};
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const OP_LOGIN: &str = "login";

/// HTTP basic-auth credentials for daemons behind a reverse proxy.
#[derive(Clone)]
pub struct BasicAuth {
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

impl Debug for BasicAuth {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings used to reach and authenticate against a daemon.
#[derive(Debug, Clone)]
pub struct QbitConfig {
    /// Web UI base URL, e.g. `http://127.0.0.1:8080`.
    pub base_url: Url,
    /// Web UI user; login is skipped when neither user nor password is set.
    pub username: Option<String>,
    /// Web UI password.
    pub password: Option<String>,
    /// Optional basic-auth credentials sent with every request.
    pub basic_auth: Option<BasicAuth>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl QbitConfig {
    /// Settings for an unauthenticated daemon at `base_url`.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            username: None,
            password: None,
            basic_auth: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Authenticated handle to a qBittorrent daemon.
#[derive(Debug, Clone)]
pub struct QbitClient {
    http: Client,
    api_base: Url,
    basic_auth: Option<BasicAuth>,
    session: Option<String>,
}

impl QbitClient {
    /// Build the HTTP client and log in when credentials are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] when the daemon cannot be reached,
    /// [`ClientError::Unauthorized`] when it refuses the credentials, and
    /// [`ClientError::Rejected`] for any other login failure.
    pub async fn connect(config: QbitConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::connection("build_client", err))?;

        let mut client = Self {
            http,
            api_base: api_base(&config.base_url),
            basic_auth: config.basic_auth,
            session: None,
        };

        if config.username.is_some() || config.password.is_some() {
            client
                .login(
                    config.username.as_deref().unwrap_or_default(),
                    config.password.as_deref().unwrap_or_default(),
                )
                .await?;
        } else {
            debug!("no web UI credentials configured; skipping login");
        }
        Ok(client)
    }

    /// Whether a session cookie was obtained during login.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session.is_some()
    }

    async fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        let response = self
            .request(Method::POST, "auth/login")?
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|err| ClientError::connection(OP_LOGIN, err))?;

        let status = response.status();
        let session = session_cookie(response.headers());
        let body = response
            .text()
            .await
            .map_err(|err| ClientError::connection(OP_LOGIN, err))?;

        if status == StatusCode::FORBIDDEN || body.trim() == "Fails." {
            return Err(ClientError::Unauthorized {
                operation: OP_LOGIN,
            });
        }
        if !status.is_success() {
            return Err(ClientError::Rejected {
                operation: OP_LOGIN,
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        self.session = session;
        debug!(session = self.session.is_some(), "logged in to qBittorrent");
        Ok(())
    }

    /// Start a request against `path`, relative to `/api/v2/`.
    pub(crate) fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self
            .api_base
            .join(path)
            .map_err(|err| ClientError::connection("build_url", err))?;
        let mut builder = self.http.request(method, url);
        if let Some(auth) = &self.basic_auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(session) = &self.session {
            builder = builder.header(COOKIE, session);
        }
        Ok(builder)
    }
}

/// Map a non-success response onto the client error taxonomy.
pub(crate) async fn ensure_success(
    operation: &'static str,
    response: Response,
) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::FORBIDDEN {
        return Err(ClientError::Unauthorized { operation });
    }
    let message = response.text().await.unwrap_or_default();
    Err(ClientError::Rejected {
        operation,
        status: status.as_u16(),
        message: message.trim().to_string(),
    })
}

fn api_base(base: &Url) -> Url {
    let mut url = base.clone();
    let path = format!("{}/api/v2/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    url
}

/// Extract the `name=value` pair of the session cookie, if one was set.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, value)| name.ends_with("SID") && !value.is_empty())
        })
        .map(str::to_string)
}
