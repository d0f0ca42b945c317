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

//! Client-agnostic torrent selection and batched removal.
//!
//! Layout:
//! - `model/`: torrents, state filters, selection criteria, and target sets
//! - `service/`: collaborator traits implemented by daemon adapters
//! - `select.rs`: resolves selection criteria into a target set
//! - `batch.rs`: chunked, stop-on-first-failure application of bulk mutations
//! - `error.rs`: collaborator and selection errors

pub mod batch;
pub mod error;
pub mod model;
pub mod select;
pub mod service;

pub use batch::{BatchSummary, DEFAULT_BATCH_SIZE, plan_batches, run_batched};
pub use error::{ClientError, ClientResult, Criterion, SelectionError, SelectionResult};
pub use model::{
    ParseFilterError, RemoveTorrents, SelectionCriteria, TargetSet, Torrent, TorrentFilter,
    TorrentQuery,
};
pub use select::select_targets;
pub use service::{TorrentInspector, TorrentRemover};
