//! Command-line interface for pruning torrents on a qBittorrent daemon.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use clap::{Args, Parser, Subcommand};
use qbt_core::{DEFAULT_BATCH_SIZE, RemoveTorrents, SelectionCriteria, TorrentFilter};
use qbt_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, TelemetryEmitter, interrupted, parse_url};
use crate::commands::torrents::handle_torrent_remove;

const DEFAULT_HOST: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Parses CLI arguments, executes the requested command, and handles
/// user-facing telemetry emission. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format,
        build_sha: option_env!("QBT_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }
    let telemetry = TelemetryEmitter::from_env();

    let result = tokio::select! {
        result = dispatch(cli) => result,
        () = shutdown_signal() => Err(interrupted()),
    };

    let (exit_code, message, outcome) = match result {
        Ok(()) => (0, None, "success"),
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            eprintln!("error: {message}");
            (exit_code, Some(message), "error")
        }
    };

    if let Some(emitter) = &telemetry {
        emitter
            .emit(
                &trace_id,
                command_name,
                outcome,
                exit_code,
                message.as_deref(),
            )
            .await;
    }

    exit_code
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::from_cli(&cli)?;

    match cli.command {
        Command::Torrent(torrents) => match torrents {
            TorrentCommand::Remove(args) => handle_torrent_remove(&ctx, &args).await,
        },
    }
}

/// Resolves once Ctrl-C or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl-C; abandoning in-flight request"),
            Err(err) => {
                warn!(error = %err, "failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("received SIGTERM; abandoning in-flight request");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[derive(Parser)]
#[command(
    name = "qbt",
    version,
    about = "Manage torrents on a remote qBittorrent daemon"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "QBT_HOST",
        value_parser = parse_url,
        default_value = DEFAULT_HOST,
        help = "Web UI base URL of the daemon"
    )]
    pub(crate) host: Url,
    #[arg(long, global = true, env = "QBT_USERNAME", help = "Web UI user")]
    pub(crate) username: Option<String>,
    #[arg(
        long,
        global = true,
        env = "QBT_PASSWORD",
        hide_env_values = true,
        help = "Web UI password"
    )]
    pub(crate) password: Option<String>,
    #[arg(
        long,
        global = true,
        env = "QBT_BASIC_USER",
        help = "HTTP basic-auth user for a fronting proxy"
    )]
    pub(crate) basic_user: Option<String>,
    #[arg(
        long,
        global = true,
        env = "QBT_BASIC_PASS",
        hide_env_values = true,
        help = "HTTP basic-auth password for a fronting proxy"
    )]
    pub(crate) basic_pass: Option<String>,
    #[arg(
        long,
        global = true,
        env = "QBT_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Per-request timeout in seconds"
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "QBT_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level or filter directive; RUST_LOG takes precedence"
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "QBT_LOG_FORMAT",
        default_value = "compact",
        help = "Log output format: compact, pretty, or json"
    )]
    pub(crate) log_format: LogFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Torrent management commands.
    #[command(subcommand)]
    Torrent(TorrentCommand),
}

#[derive(Subcommand)]
pub(crate) enum TorrentCommand {
    /// Remove torrents selected by state, category, tags, or hash.
    Remove(TorrentRemoveArgs),
}

#[derive(Args, Debug)]
pub(crate) struct TorrentRemoveArgs {
    #[arg(long, help = "Report what would be removed without removing anything")]
    pub(crate) dry_run: bool,
    #[arg(long, help = "Remove every torrent; overrides all other selectors")]
    pub(crate) all: bool,
    #[arg(long, help = "Also delete downloaded data from disk")]
    pub(crate) delete_files: bool,
    #[arg(
        long,
        value_name = "STATE",
        help = "Select torrents matching a state filter (e.g. completed, stalled_uploading)"
    )]
    pub(crate) filter: Option<TorrentFilter>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Always remove these hashes, whatever the other selectors match"
    )]
    pub(crate) hashes: Vec<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Select torrents in these categories"
    )]
    pub(crate) include_category: Vec<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Within the selected categories, keep only torrents with one of these tags"
    )]
    pub(crate) include_tags: Vec<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Within the selected categories, skip torrents with any of these tags"
    )]
    pub(crate) exclude_tags: Vec<String>,
    #[arg(
        long,
        default_value_t = DEFAULT_BATCH_SIZE,
        help = "Maximum number of hashes per delete request"
    )]
    pub(crate) batch_size: NonZeroUsize,
}

impl TorrentRemoveArgs {
    /// Selection criteria described by the flags. Blank list entries are dropped.
    pub(crate) fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            remove_all: self.all,
            state_filter: self.filter,
            categories: cleaned(&self.include_category),
            include_tags: cleaned(&self.include_tags),
            exclude_tags: cleaned(&self.exclude_tags),
            explicit_hashes: cleaned(&self.hashes),
        }
    }

    pub(crate) const fn options(&self) -> RemoveTorrents {
        RemoveTorrents {
            delete_files: self.delete_files,
        }
    }
}

fn cleaned(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Torrent(TorrentCommand::Remove(_)) => "torrent_remove",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    fn remove_args(cli: Cli) -> TorrentRemoveArgs {
        match cli.command {
            Command::Torrent(TorrentCommand::Remove(args)) => args,
        }
    }

    #[test]
    fn remove_flags_map_onto_selection_criteria() {
        let cli = parse(&[
            "qbt",
            "torrent",
            "remove",
            "--filter",
            "completed",
            "--include-category",
            "tv, movies,",
            "--include-tags",
            "seed",
            "--exclude-tags",
            "keep,pinned",
            "--hashes",
            "abc,def",
            "--delete-files",
        ])
        .expect("valid arguments");
        assert_eq!(command_label(&cli.command), "torrent_remove");

        let args = remove_args(cli);
        let criteria = args.criteria();
        assert!(!criteria.remove_all);
        assert_eq!(criteria.state_filter, Some(TorrentFilter::Completed));
        assert_eq!(
            criteria.categories.iter().collect::<Vec<_>>(),
            ["movies", "tv"]
        );
        assert_eq!(criteria.include_tags.len(), 1);
        assert_eq!(criteria.exclude_tags.len(), 2);
        assert_eq!(criteria.explicit_hashes.len(), 2);
        assert!(args.options().delete_files);
        assert!(!args.dry_run);
        assert_eq!(args.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = parse(&[
            "qbt",
            "torrent",
            "remove",
            "--all",
            "--dry-run",
            "--host",
            "https://nas.local/qbt/",
            "--log-format",
            "json",
            "--batch-size",
            "25",
        ])
        .expect("valid arguments");
        assert_eq!(cli.host.as_str(), "https://nas.local/qbt/");
        assert_eq!(cli.log_format, LogFormat::Json);

        let args = remove_args(cli);
        assert!(args.criteria().remove_all);
        assert!(args.dry_run);
        assert_eq!(args.batch_size.get(), 25);
    }

    #[test]
    fn unknown_filter_is_a_usage_error() {
        let err = parse(&["qbt", "torrent", "remove", "--filter", "sleeping"])
            .err()
            .expect("filter rejected");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn zero_batch_size_is_a_usage_error() {
        let err = parse(&["qbt", "torrent", "remove", "--all", "--batch-size", "0"])
            .err()
            .expect("zero batch size rejected");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn host_without_scheme_is_a_usage_error() {
        let err = parse(&["qbt", "--host", "nas.local:8080", "torrent", "remove"])
            .err()
            .expect("host rejected");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn no_selectors_yields_empty_criteria() {
        let cli = parse(&["qbt", "torrent", "remove"]).expect("valid arguments");
        assert_eq!(remove_args(cli).criteria(), SelectionCriteria::default());
    }
}
