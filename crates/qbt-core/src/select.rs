//! Resolution of selection criteria into a removal target set.
//!
//! # Design
//! - `remove_all` short-circuits before any inventory query.
//! - The state-filter set and the category/tag set are each computed only when
//!   requested; an unrequested set is `None` and never takes part in the intersection.
//! - Explicit hashes are unioned in last, so they survive every other test.
//! - Queries run one at a time; the first failure aborts the selection.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Criterion, SelectionError, SelectionResult};
use crate::model::{SelectionCriteria, TargetSet, TorrentFilter, TorrentQuery};
use crate::service::TorrentInspector;

/// Compute the set of torrents addressed by `criteria`.
///
/// # Errors
///
/// Returns [`SelectionError::Query`] naming the filter or category whose inventory
/// query failed. Results gathered before the failure are discarded.
pub async fn select_targets<I>(
    inspector: &I,
    criteria: &SelectionCriteria,
) -> SelectionResult<TargetSet>
where
    I: TorrentInspector + ?Sized,
{
    if criteria.remove_all {
        debug!("remove-all requested; skipping inventory queries");
        return Ok(TargetSet::All);
    }

    let filter_hashes = match criteria.state_filter {
        Some(filter) => Some(filter_set(inspector, filter).await?),
        None => None,
    };

    let category_hashes = if criteria.categories.is_empty() {
        None
    } else {
        Some(category_tag_set(inspector, criteria).await?)
    };

    let mut hashes = combine(filter_hashes, category_hashes);
    hashes.extend(criteria.explicit_hashes.iter().cloned());
    debug!(
        selected = hashes.len(),
        explicit = criteria.explicit_hashes.len(),
        "selection resolved"
    );
    Ok(TargetSet::Hashes(hashes))
}

async fn filter_set<I>(inspector: &I, filter: TorrentFilter) -> SelectionResult<BTreeSet<String>>
where
    I: TorrentInspector + ?Sized,
{
    let torrents = inspector
        .list(&TorrentQuery::by_filter(filter))
        .await
        .map_err(|source| SelectionError::Query {
            criterion: Criterion::Filter(filter),
            source,
        })?;
    debug!(filter = %filter, matched = torrents.len(), "state filter queried");
    Ok(torrents.into_iter().map(|torrent| torrent.hash).collect())
}

async fn category_tag_set<I>(
    inspector: &I,
    criteria: &SelectionCriteria,
) -> SelectionResult<BTreeSet<String>>
where
    I: TorrentInspector + ?Sized,
{
    let mut hashes = BTreeSet::new();
    for category in &criteria.categories {
        let torrents = inspector
            .list(&TorrentQuery::by_category(category.as_str()))
            .await
            .map_err(|source| SelectionError::Query {
                criterion: Criterion::Category(category.clone()),
                source,
            })?;
        let listed = torrents.len();
        let before = hashes.len();
        hashes.extend(
            torrents
                .into_iter()
                .filter(|torrent| criteria.admits_tags(torrent))
                .map(|torrent| torrent.hash),
        );
        debug!(
            category = %category,
            listed,
            admitted = hashes.len() - before,
            "category queried"
        );
    }
    Ok(hashes)
}

/// Merge the optional intermediate sets.
///
/// Both present: intersection. One present: that set. Neither: empty.
#[must_use]
pub fn combine(
    filter_hashes: Option<BTreeSet<String>>,
    category_hashes: Option<BTreeSet<String>>,
) -> BTreeSet<String> {
    match (filter_hashes, category_hashes) {
        (Some(filtered), Some(categorised)) => {
            filtered.intersection(&categorised).cloned().collect()
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => BTreeSet::new(),
    }
}
