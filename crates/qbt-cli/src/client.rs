//! Daemon settings, error types, and telemetry wiring for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use qbt_client::{BasicAuth, QbitConfig};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::cli::Cli;

pub(crate) const TELEMETRY_ENDPOINT_ENV: &str = "QBT_TELEMETRY_ENDPOINT";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

/// Application context passed to command handlers.
#[derive(Debug, Clone)]
pub(crate) struct AppContext {
    pub(crate) daemon: QbitConfig,
}

impl AppContext {
    /// Validate the global connection flags.
    pub(crate) fn from_cli(cli: &Cli) -> CliResult<Self> {
        if cli.timeout == 0 {
            return Err(CliError::validation("--timeout must be at least 1 second"));
        }

        let basic_auth = match (&cli.basic_user, &cli.basic_pass) {
            (None, None) => None,
            (Some(username), Some(password)) => Some(BasicAuth {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => {
                return Err(CliError::validation(
                    "--basic-user and --basic-pass must be provided together",
                ));
            }
        };

        Ok(Self {
            daemon: QbitConfig {
                base_url: cli.host.clone(),
                username: non_blank(cli.username.as_deref()),
                password: non_blank(cli.password.as_deref()),
                basic_auth,
                timeout: Duration::from_secs(cli.timeout),
            },
        })
    }
}

/// Blank credentials count as unset; anything else is passed through verbatim.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

/// Telemetry emitter used to forward CLI outcomes.
#[derive(Clone)]
pub(crate) struct TelemetryEmitter {
    pub(crate) client: Client,
    pub(crate) endpoint: Url,
}

impl TelemetryEmitter {
    #[must_use]
    pub(crate) fn from_env() -> Option<Self> {
        let endpoint = std::env::var(TELEMETRY_ENDPOINT_ENV).ok()?;
        let endpoint = endpoint.parse().ok()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .ok()?;
        Some(Self { client, endpoint })
    }

    pub(crate) async fn emit(
        &self,
        trace_id: &str,
        command: &str,
        outcome: &str,
        exit_code: i32,
        message: Option<&str>,
    ) {
        let event = TelemetryEvent {
            command,
            outcome,
            trace_id,
            exit_code,
            message,
            timestamp_ms: timestamp_now_ms(),
        };

        if let Err(err) = self
            .client
            .post(self.endpoint.clone())
            .json(&event)
            .send()
            .await
        {
            tracing::debug!(error = %err, "telemetry emit failed");
        }
    }
}

#[derive(Serialize)]
struct TelemetryEvent<'a> {
    command: &'a str,
    outcome: &'a str,
    trace_id: &'a str,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    timestamp_ms: u64,
}

/// Parse the daemon URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    let url = input
        .trim()
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(format!(
            "invalid URL '{input}': expected http:// or https:// followed by a host"
        )),
    }
}

/// Millisecond timestamp helper for telemetry.
#[must_use]
pub(crate) fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Wrap an error that prevented reaching or authenticating with the daemon.
pub(crate) fn connection_failed(error: impl Into<anyhow::Error>) -> CliError {
    CliError::failure(error.into().context("connection failed"))
}

/// Error reported when the command is cut short by a shutdown signal.
pub(crate) fn interrupted() -> CliError {
    CliError::failure(anyhow!("interrupted before the command completed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use clap::Parser;
    use httpmock::prelude::*;
    use qbt_core::ClientError;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments parse")
    }

    #[test]
    fn exit_codes_separate_validation_from_failures() {
        let validation = CliError::validation("bad flag");
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "bad flag");

        let failure = CliError::failure(anyhow!("daemon down"));
        assert_eq!(failure.exit_code(), 3);
        assert_eq!(failure.to_string(), "daemon down");
    }

    #[test]
    fn connection_failures_render_full_cause_chain() {
        let err = connection_failed(ClientError::Unauthorized { operation: "login" });
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.display_message(),
            "connection failed: torrent daemon refused authentication during login"
        );
    }

    #[test]
    fn parse_url_requires_http_scheme_and_host() {
        assert!(parse_url("http://127.0.0.1:8080").is_ok());
        assert!(parse_url(" https://nas.local/qbt/ ").is_ok());

        let err = parse_url("127.0.0.1:8080").expect_err("no scheme");
        assert!(err.contains("invalid URL"));
        let err = parse_url("localhost:8080").expect_err("host parsed as scheme");
        assert!(err.contains("http://"));
    }

    #[test]
    fn context_maps_connection_flags() {
        let cli = parse(&[
            "qbt",
            "--host",
            "http://nas.local:8080",
            "--username",
            "admin",
            "--password",
            "adminadmin",
            "--basic-user",
            "proxy",
            "--basic-pass",
            "secret",
            "--timeout",
            "30",
            "torrent",
            "remove",
            "--all",
        ]);
        let ctx = AppContext::from_cli(&cli).expect("valid flags");
        assert_eq!(ctx.daemon.base_url.as_str(), "http://nas.local:8080/");
        assert_eq!(ctx.daemon.username.as_deref(), Some("admin"));
        assert_eq!(ctx.daemon.password.as_deref(), Some("adminadmin"));
        assert_eq!(ctx.daemon.timeout, Duration::from_secs(30));
        let auth = ctx.daemon.basic_auth.expect("basic auth configured");
        assert_eq!(auth.username, "proxy");
        assert_eq!(auth.password, "secret");
    }

    #[test]
    fn context_treats_blank_credentials_as_absent() {
        let cli = parse(&["qbt", "--username", "  ", "torrent", "remove", "--all"]);
        let ctx = AppContext::from_cli(&cli).expect("valid flags");
        assert!(ctx.daemon.username.is_none());
        assert!(ctx.daemon.password.is_none());
    }

    #[test]
    fn context_keeps_credential_whitespace() {
        let cli = parse(&[
            "qbt",
            "--username",
            " admin",
            "--password",
            " pass word ",
            "torrent",
            "remove",
            "--all",
        ]);
        let ctx = AppContext::from_cli(&cli).expect("valid flags");
        assert_eq!(ctx.daemon.username.as_deref(), Some(" admin"));
        assert_eq!(ctx.daemon.password.as_deref(), Some(" pass word "));
    }

    #[test]
    fn context_rejects_half_configured_basic_auth() {
        let cli = parse(&["qbt", "--basic-user", "proxy", "torrent", "remove", "--all"]);
        let err = AppContext::from_cli(&cli).expect_err("missing basic password");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn context_rejects_zero_timeout() {
        let cli = parse(&["qbt", "--timeout", "0", "torrent", "remove", "--all"]);
        let err = AppContext::from_cli(&cli).expect_err("zero timeout");
        assert!(err.display_message().contains("--timeout"));
    }

    #[tokio::test]
    async fn telemetry_emitter_emits_event() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/telemetry")
                .json_body_includes(
                    json!({
                        "command": "torrent_remove",
                        "outcome": "error",
                        "trace_id": "trace",
                        "exit_code": 3,
                        "message": "connection failed"
                    })
                    .to_string(),
                );
            then.status(200);
        });

        let emitter = TelemetryEmitter {
            client: Client::new(),
            endpoint: format!("{}/telemetry", server.base_url())
                .parse()
                .map_err(|_| anyhow!("invalid URL"))?,
        };

        emitter
            .emit(
                "trace",
                "torrent_remove",
                "error",
                3,
                Some("connection failed"),
            )
            .await;

        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn telemetry_emit_failure_is_swallowed() -> Result<()> {
        let emitter = TelemetryEmitter {
            client: Client::new(),
            endpoint: "http://127.0.0.1:9/telemetry".parse()?,
        };
        emitter.emit("trace", "torrent_remove", "success", 0, None).await;
        Ok(())
    }
}
