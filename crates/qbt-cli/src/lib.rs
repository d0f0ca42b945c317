#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for pruning torrents on a remote qBittorrent daemon.
//!
//! Layout:
//! - `cli.rs`: argument parsing, logging setup, signal handling, and command dispatch
//! - `commands/`: command handlers grouped by concern
//! - `client.rs`: daemon settings, errors, and telemetry helpers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;

pub use cli::run;
