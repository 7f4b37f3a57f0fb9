//! Pure merge of parsed guide feeds.

use crate::feed::types::{MergedDocument, ParsedFeed};

/// Merge parsed feeds into a single document.
///
/// Entries are concatenated in input order: all entries of the first feed,
/// then all entries of the second, and so on. No deduplication or reordering
/// happens here; duplicate channels and programmes across feeds are kept.
pub fn merge(feeds: Vec<ParsedFeed>) -> MergedDocument {
    let total = feeds.iter().map(|f| f.entry_count()).sum();
    let mut entries = Vec::with_capacity(total);
    for feed in feeds {
        entries.extend(feed.entries);
    }
    MergedDocument { entries }
}
