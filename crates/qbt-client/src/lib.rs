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

//! qBittorrent Web API v2 adapter for the qbt core traits.
//!
//! Layout:
//! - `client.rs`: connection settings, login, and request plumbing
//! - `torrents.rs`: inventory listing and bulk delete
//! - `models.rs`: wire payloads returned by the daemon

mod client;
mod models;
mod torrents;

pub use client::{BasicAuth, DEFAULT_TIMEOUT, QbitClient, QbitConfig};

/// Hash list token understood by the daemon as "every torrent".
pub const ALL_HASHES: &str = "all";
