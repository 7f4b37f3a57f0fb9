//! Guide feed handling.
//!
//! Fetching, merging, and the periodic update loop that keeps the
//! published guide fresh.

pub mod fetcher;
pub mod merge;
pub mod types;
pub mod updater;

pub use fetcher::{FeedFetcher, FetchError};
pub use merge::merge;
pub use types::{CycleResult, FeedSource, MergedDocument, ParsedFeed, GUIDE_ROOT_ELEMENT};
pub use updater::{spawn_guide_updater, GuideUpdater, UpdaterHandle};
