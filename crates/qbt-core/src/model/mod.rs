//! Torrent inventory types, selection criteria, and resolved target sets.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Snapshot of a torrent as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Torrent {
    /// Info-hash identifying the torrent.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// Daemon-specific state label (e.g. `uploading`, `pausedDL`).
    pub state: String,
    /// Category; empty when uncategorised.
    pub category: String,
    /// Tags attached to the torrent.
    pub tags: BTreeSet<String>,
}

impl Torrent {
    /// Whether the torrent carries at least one of `tags`.
    #[must_use]
    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// State filter vocabulary understood by the daemon's listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TorrentFilter {
    /// Every torrent.
    All,
    /// Torrents still downloading.
    Downloading,
    /// Torrents seeding.
    Seeding,
    /// Torrents with all data present.
    Completed,
    /// Paused torrents.
    Paused,
    /// Torrents with transfer activity.
    Active,
    /// Torrents without transfer activity.
    Inactive,
    /// Torrents that are not paused.
    Resumed,
    /// Stalled torrents in either direction.
    Stalled,
    /// Stalled while seeding.
    StalledUploading,
    /// Stalled while downloading.
    StalledDownloading,
    /// Torrents in an error state.
    Errored,
}

impl TorrentFilter {
    /// Every filter, in the order the daemon documents them.
    pub const VARIANTS: [Self; 12] = [
        Self::All,
        Self::Downloading,
        Self::Seeding,
        Self::Completed,
        Self::Paused,
        Self::Active,
        Self::Inactive,
        Self::Resumed,
        Self::Stalled,
        Self::StalledUploading,
        Self::StalledDownloading,
        Self::Errored,
    ];

    /// Wire value sent to the daemon.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Downloading => "downloading",
            Self::Seeding => "seeding",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Resumed => "resumed",
            Self::Stalled => "stalled",
            Self::StalledUploading => "stalled_uploading",
            Self::StalledDownloading => "stalled_downloading",
            Self::Errored => "errored",
        }
    }
}

impl Display for TorrentFilter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a state filter string is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state filter '{value}'")]
pub struct ParseFilterError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for TorrentFilter {
    type Err = ParseFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::VARIANTS
            .into_iter()
            .find(|filter| filter.as_str() == normalized)
            .ok_or_else(|| ParseFilterError {
                value: value.to_string(),
            })
    }
}

/// Options narrowing an inventory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TorrentQuery {
    /// Restrict to torrents matching this state filter.
    pub filter: Option<TorrentFilter>,
    /// Restrict to torrents in this category.
    pub category: Option<String>,
}

impl TorrentQuery {
    /// Query restricted by state filter only.
    #[must_use]
    pub const fn by_filter(filter: TorrentFilter) -> Self {
        Self {
            filter: Some(filter),
            category: None,
        }
    }

    /// Query restricted by a single category only.
    #[must_use]
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            filter: None,
            category: Some(category.into()),
        }
    }
}

/// Options accompanying a delete request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveTorrents {
    /// Also delete downloaded data from disk.
    pub delete_files: bool,
}

/// User-supplied description of which torrents to remove.
///
/// Empty sets mean "not requested". `remove_all` overrides every other field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Target every torrent on the daemon.
    pub remove_all: bool,
    /// Restrict by execution state.
    pub state_filter: Option<TorrentFilter>,
    /// Categories whose torrents are candidates.
    pub categories: BTreeSet<String>,
    /// Keep category candidates carrying at least one of these tags.
    pub include_tags: BTreeSet<String>,
    /// Drop category candidates carrying any of these tags.
    pub exclude_tags: BTreeSet<String>,
    /// Hashes always included in the result.
    pub explicit_hashes: BTreeSet<String>,
}

impl SelectionCriteria {
    /// Apply the include/exclude tag gate to a category candidate.
    #[must_use]
    pub fn admits_tags(&self, torrent: &Torrent) -> bool {
        let included = self.include_tags.is_empty() || torrent.has_any_tag(&self.include_tags);
        let excluded = !self.exclude_tags.is_empty() && torrent.has_any_tag(&self.exclude_tags);
        included && !excluded
    }
}

/// Resolved removal target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSet {
    /// Every torrent, without enumerating hashes.
    All,
    /// A concrete set of hashes.
    Hashes(BTreeSet<String>),
}

impl TargetSet {
    /// `true` when no torrent is targeted. `All` is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Hashes(hashes) => hashes.is_empty(),
        }
    }

    /// Number of targeted hashes, or `None` for `All`.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::All => None,
            Self::Hashes(hashes) => Some(hashes.len()),
        }
    }
}
