//! Collaborator traits implemented by torrent daemon adapters.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::model::{RemoveTorrents, Torrent, TorrentQuery};

/// Read access to the daemon's torrent inventory.
#[async_trait]
pub trait TorrentInspector: Send + Sync {
    /// List torrents matching the query restrictions.
    async fn list(&self, query: &TorrentQuery) -> ClientResult<Vec<Torrent>>;
}

/// Bulk removal of torrents on the daemon.
#[async_trait]
pub trait TorrentRemover: Send + Sync {
    /// Remove exactly the given hashes, optionally deleting their data.
    async fn delete(&self, hashes: &[String], options: RemoveTorrents) -> ClientResult<()>;
}
