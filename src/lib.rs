//! EPGMUX - EPG merge service
//!
//! Periodically downloads gzip-compressed XMLTV guide feeds, merges them
//! into one document, and serves the compressed result over HTTP.

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{EpgmuxError, Result};
pub use feed::{spawn_guide_updater, FeedFetcher, FetchError, GuideUpdater, UpdaterHandle};
pub use store::{GuideStore, PublishedGuide};
pub use web::WebServer;
