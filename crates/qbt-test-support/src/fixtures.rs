//! Torrent fixtures.

use std::collections::BTreeSet;

use qbt_core::Torrent;

/// Seeding torrent in `category` carrying `tags`.
#[must_use]
pub fn torrent(hash: &str, category: &str, tags: &[&str]) -> Torrent {
    torrent_in_state(hash, "uploading", category, tags)
}

/// Torrent with an explicit daemon state label.
#[must_use]
pub fn torrent_in_state(hash: &str, state: &str, category: &str, tags: &[&str]) -> Torrent {
    Torrent {
        hash: hash.to_string(),
        name: format!("{hash}.mkv"),
        state: state.to_string(),
        category: category.to_string(),
        tags: tag_set(tags),
    }
}

/// Owned, ordered set built from string slices.
#[must_use]
pub fn tag_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

/// `count` uncategorised seeding torrents with hashes `hash-0000`, `hash-0001`, ...
#[must_use]
pub fn numbered_torrents(count: usize) -> Vec<Torrent> {
    (0..count)
        .map(|index| torrent(&format!("hash-{index:04}"), "", &[]))
        .collect()
}
