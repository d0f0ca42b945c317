//! Wire payloads returned by the daemon.

use std::collections::BTreeSet;

use qbt_core::Torrent;
use serde::Deserialize;

/// Entry of `GET /api/v2/torrents/info`. Only the fields selection needs are decoded.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TorrentInfo {
    pub(crate) hash: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) category: String,
    /// Comma-separated tag list, e.g. `"keep, x265"`.
    #[serde(default)]
    pub(crate) tags: String,
}

impl From<TorrentInfo> for Torrent {
    fn from(info: TorrentInfo) -> Self {
        Self {
            tags: split_tags(&info.tags),
            hash: info.hash,
            name: info.name,
            state: info.state,
            category: info.category,
        }
    }
}

fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
