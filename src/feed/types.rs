//! Guide feed types for EPGMUX.

/// Root element name of guide documents.
pub const GUIDE_ROOT_ELEMENT: &str = "tv";

/// A configured guide feed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// Feed URL.
    pub url: String,
}

impl FeedSource {
    /// Create a new feed source.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Guide entries parsed from one feed during one update cycle.
///
/// Each entry is the serialized XML of one direct child of the feed's root
/// element, kept in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Serialized entry elements in document order.
    pub entries: Vec<String>,
}

impl ParsedFeed {
    /// Create a parsed feed from its entries.
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Number of entries in the feed.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// The merged guide document produced by one update cycle.
///
/// Holds the concatenated entries of all successfully fetched feeds, in
/// source order. Serialization wraps them in a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    /// Serialized entry elements in merge order.
    pub entries: Vec<String>,
}

impl MergedDocument {
    /// Number of entries in the document.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Outcome counters for one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleResult {
    /// Number of feeds attempted.
    pub attempted: usize,
    /// Number of feeds fetched and parsed successfully.
    pub succeeded: usize,
    /// Number of entries in the merged document.
    pub entries: usize,
}
