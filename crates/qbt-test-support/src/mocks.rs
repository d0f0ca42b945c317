//! In-memory torrent daemon implementing the core collaborator traits.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use qbt_client::ALL_HASHES;
use qbt_core::{
    ClientError, ClientResult, RemoveTorrents, Torrent, TorrentFilter, TorrentInspector,
    TorrentQuery, TorrentRemover,
};

/// Delete request observed by the fake daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    /// Hashes carried by the request, in request order.
    pub hashes: Vec<String>,
    /// Whether data deletion was requested.
    pub delete_files: bool,
}

/// Fake daemon that records every query and delete call.
///
/// Listing honours both the state filter and the category restriction. Deleting removes
/// the named torrents from the inventory, so later listings observe the removal.
#[derive(Debug, Default)]
pub struct FakeDaemon {
    torrents: Mutex<Vec<Torrent>>,
    queries: Mutex<Vec<TorrentQuery>>,
    deletes: Mutex<Vec<DeleteCall>>,
    failing_categories: BTreeSet<String>,
    rejected_filters: BTreeSet<TorrentFilter>,
    unreachable: bool,
    rejected_delete_call: Option<usize>,
}

impl FakeDaemon {
    /// Daemon seeded with `torrents`.
    #[must_use]
    pub fn new(torrents: Vec<Torrent>) -> Self {
        Self {
            torrents: Mutex::new(torrents),
            ..Self::default()
        }
    }

    /// Fail listings for `category` with a server error.
    #[must_use]
    pub fn with_failing_category(mut self, category: &str) -> Self {
        self.failing_categories.insert(category.to_string());
        self
    }

    /// Reject listings using `filter` as an unknown filter.
    #[must_use]
    pub fn with_rejected_filter(mut self, filter: TorrentFilter) -> Self {
        self.rejected_filters.insert(filter);
        self
    }

    /// Fail every call as if the daemon could not be reached.
    #[must_use]
    pub const fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Reject the delete call with zero-based position `index`.
    #[must_use]
    pub const fn with_rejected_delete(mut self, index: usize) -> Self {
        self.rejected_delete_call = Some(index);
        self
    }

    /// Queries received so far, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<TorrentQuery> {
        lock(&self.queries).clone()
    }

    /// Delete calls received so far, in order, including rejected ones.
    #[must_use]
    pub fn delete_calls(&self) -> Vec<DeleteCall> {
        lock(&self.deletes).clone()
    }

    /// Hashes still present in the inventory.
    #[must_use]
    pub fn remaining_hashes(&self) -> BTreeSet<String> {
        lock(&self.torrents)
            .iter()
            .map(|torrent| torrent.hash.clone())
            .collect()
    }
}

#[async_trait]
impl TorrentInspector for FakeDaemon {
    async fn list(&self, query: &TorrentQuery) -> ClientResult<Vec<Torrent>> {
        lock(&self.queries).push(query.clone());
        if self.unreachable {
            return Err(ClientError::connection("list", "connection refused"));
        }
        if let Some(filter) = query.filter
            && self.rejected_filters.contains(&filter)
        {
            return Err(ClientError::InvalidFilter {
                value: filter.to_string(),
            });
        }
        if let Some(category) = &query.category
            && self.failing_categories.contains(category)
        {
            return Err(ClientError::Rejected {
                operation: "list",
                status: 500,
                message: format!("category {category} unavailable"),
            });
        }

        Ok(lock(&self.torrents)
            .iter()
            .filter(|torrent| {
                query
                    .filter
                    .is_none_or(|filter| filter_matches(filter, &torrent.state))
            })
            .filter(|torrent| {
                query
                    .category
                    .as_ref()
                    .is_none_or(|category| &torrent.category == category)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TorrentRemover for FakeDaemon {
    async fn delete(&self, hashes: &[String], options: RemoveTorrents) -> ClientResult<()> {
        let index = {
            let mut deletes = lock(&self.deletes);
            deletes.push(DeleteCall {
                hashes: hashes.to_vec(),
                delete_files: options.delete_files,
            });
            deletes.len() - 1
        };
        if self.unreachable {
            return Err(ClientError::connection("delete", "connection refused"));
        }
        if self.rejected_delete_call == Some(index) {
            return Err(ClientError::Rejected {
                operation: "delete",
                status: 409,
                message: format!("delete call {index} rejected"),
            });
        }

        let mut torrents = lock(&self.torrents);
        if hashes == [ALL_HASHES] {
            torrents.clear();
        } else {
            torrents.retain(|torrent| !hashes.contains(&torrent.hash));
        }
        Ok(())
    }
}

/// Approximation of the daemon's state filter over its state labels.
#[must_use]
pub fn filter_matches(filter: TorrentFilter, state: &str) -> bool {
    const DOWNLOADING: &[&str] = &[
        "downloading",
        "metaDL",
        "forcedMetaDL",
        "stalledDL",
        "checkingDL",
        "pausedDL",
        "stoppedDL",
        "queuedDL",
        "forcedDL",
        "allocating",
    ];
    const SEEDING: &[&str] = &["uploading", "stalledUP", "checkingUP", "queuedUP", "forcedUP"];
    const PAUSED: &[&str] = &["pausedDL", "pausedUP", "stoppedDL", "stoppedUP"];
    const ACTIVE: &[&str] = &["downloading", "metaDL", "forcedDL", "uploading", "forcedUP"];
    const ERRORED: &[&str] = &["error", "missingFiles"];

    match filter {
        TorrentFilter::All => true,
        TorrentFilter::Downloading => DOWNLOADING.contains(&state),
        TorrentFilter::Seeding => SEEDING.contains(&state),
        TorrentFilter::Completed => state.ends_with("UP") || state == "uploading",
        TorrentFilter::Paused => PAUSED.contains(&state),
        TorrentFilter::Resumed => !PAUSED.contains(&state),
        TorrentFilter::Active => ACTIVE.contains(&state),
        TorrentFilter::Inactive => !ACTIVE.contains(&state),
        TorrentFilter::Stalled => state == "stalledUP" || state == "stalledDL",
        TorrentFilter::StalledUploading => state == "stalledUP",
        TorrentFilter::StalledDownloading => state == "stalledDL",
        TorrentFilter::Errored => ERRORED.contains(&state),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{torrent, torrent_in_state};

    #[tokio::test]
    async fn list_honours_filter_and_category() {
        let daemon = FakeDaemon::new(vec![
            torrent_in_state("a", "uploading", "movies", &[]),
            torrent_in_state("b", "pausedDL", "movies", &[]),
            torrent_in_state("c", "uploading", "tv", &[]),
        ]);

        let seeding = daemon
            .list(&TorrentQuery::by_filter(TorrentFilter::Seeding))
            .await
            .expect("list succeeds");
        assert_eq!(seeding.len(), 2);

        let movies = daemon
            .list(&TorrentQuery::by_category("movies"))
            .await
            .expect("list succeeds");
        assert_eq!(movies.len(), 2);
        assert_eq!(daemon.queries().len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_hashes_and_records_calls() {
        let daemon = FakeDaemon::new(vec![torrent("a", "", &[]), torrent("b", "", &[])]);
        daemon
            .delete(
                &["a".to_string()],
                RemoveTorrents { delete_files: true },
            )
            .await
            .expect("delete succeeds");

        assert_eq!(daemon.remaining_hashes().len(), 1);
        assert_eq!(
            daemon.delete_calls(),
            vec![DeleteCall {
                hashes: vec!["a".to_string()],
                delete_files: true,
            }]
        );
    }

    #[tokio::test]
    async fn delete_all_token_clears_inventory() {
        let daemon = FakeDaemon::new(vec![torrent("a", "", &[]), torrent("b", "", &[])]);
        daemon
            .delete(&[ALL_HASHES.to_string()], RemoveTorrents::default())
            .await
            .expect("delete succeeds");
        assert!(daemon.remaining_hashes().is_empty());
    }

    #[tokio::test]
    async fn all_token_among_other_hashes_is_a_literal_hash() {
        let daemon = FakeDaemon::new(vec![torrent("a", "", &[]), torrent("b", "", &[])]);
        daemon
            .delete(
                &[ALL_HASHES.to_string(), "a".to_string()],
                RemoveTorrents::default(),
            )
            .await
            .expect("delete succeeds");
        assert_eq!(daemon.remaining_hashes().len(), 1);
    }

    #[tokio::test]
    async fn configured_failures_surface_as_client_errors() {
        let daemon = FakeDaemon::new(Vec::new())
            .with_failing_category("tv")
            .with_rejected_filter(TorrentFilter::Errored)
            .with_rejected_delete(0);

        let err = daemon
            .list(&TorrentQuery::by_category("tv"))
            .await
            .expect_err("category fails");
        assert!(matches!(err, ClientError::Rejected { status: 500, .. }));

        let err = daemon
            .list(&TorrentQuery::by_filter(TorrentFilter::Errored))
            .await
            .expect_err("filter rejected");
        assert!(matches!(err, ClientError::InvalidFilter { value } if value == "errored"));

        let err = daemon
            .delete(&["a".to_string()], RemoveTorrents::default())
            .await
            .expect_err("delete rejected");
        assert!(matches!(err, ClientError::Rejected { status: 409, .. }));
    }

    #[test]
    fn filter_matching_covers_state_families() {
        assert!(filter_matches(TorrentFilter::Completed, "pausedUP"));
        assert!(!filter_matches(TorrentFilter::Completed, "pausedDL"));
        assert!(filter_matches(TorrentFilter::Paused, "stoppedUP"));
        assert!(filter_matches(TorrentFilter::Errored, "missingFiles"));
        assert!(filter_matches(TorrentFilter::Inactive, "stalledDL"));
    }
}
