//! Periodic guide update scheduler.
//!
//! Runs the fetch, merge, publish cycle on a fixed interval in a background
//! task. Each cycle fetches every configured feed concurrently, merges
//! whatever succeeded, and publishes the result. The loop stops when its
//! handle is shut down or dropped.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::FeedsConfig;
use crate::feed::fetcher::FeedFetcher;
use crate::feed::merge::merge;
use crate::feed::types::{CycleResult, FeedSource, ParsedFeed};
use crate::store::GuideStore;

/// Periodic updater for the published guide.
pub struct GuideUpdater {
    fetcher: FeedFetcher,
    store: Arc<GuideStore>,
    sources: Vec<FeedSource>,
    update_interval: Duration,
}

/// Handle to a running updater task.
pub struct UpdaterHandle {
    shutdown: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl UpdaterHandle {
    /// Stop the updater and wait for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(()).await;
        let _ = self.task.await;
    }
}

impl GuideUpdater {
    /// Create an updater from the feeds configuration.
    pub fn new(config: &FeedsConfig, store: Arc<GuideStore>) -> crate::Result<Self> {
        let fetcher = FeedFetcher::new(config)?;
        let sources = config.urls.iter().map(FeedSource::new).collect();

        Ok(Self {
            fetcher,
            store,
            sources,
            update_interval: Duration::from_secs(config.update_interval_secs),
        })
    }

    /// Run the update loop until a shutdown message arrives or the channel
    /// closes. The first cycle runs immediately.
    async fn run(self, mut shutdown: mpsc::Receiver<()>) {
        info!(
            "Guide updater started ({} feeds, update interval {}s)",
            self.sources.len(),
            self.update_interval.as_secs()
        );

        let mut timer = tokio::time::interval(self.update_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The interval's first tick completes at once, so the first cycle
        // runs at startup rather than one full interval in.
        timer.tick().await;
        self.run_cycle().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    info!("Guide updater stopping");
                    break;
                }
            }
        }
    }

    /// Run one fetch, merge, publish cycle.
    ///
    /// Fetches all feeds concurrently and publishes the merge of whatever
    /// succeeded. A cycle with zero successful feeds still publishes, so
    /// the artifact always reflects the latest attempt.
    pub async fn run_cycle(&self) -> CycleResult {
        info!("Starting guide update");

        let attempted = self.sources.len();
        let results = join_all(self.sources.iter().map(|s| self.fetch_one(s))).await;
        let feeds: Vec<ParsedFeed> = results.into_iter().flatten().collect();
        let succeeded = feeds.len();

        let doc = merge(feeds);
        let entries = doc.entry_count();

        match self.store.publish(&doc) {
            Ok(()) => info!(
                "Published merged guide: {} entries from {}/{} feeds",
                entries, succeeded, attempted
            ),
            Err(e) => error!("Failed to publish merged guide: {}", e),
        }

        info!("Next update in {}s", self.update_interval.as_secs());

        CycleResult {
            attempted,
            succeeded,
            entries,
        }
    }

    /// Fetch one feed, logging the outcome. Failures are swallowed so a
    /// broken feed cannot take down the cycle.
    async fn fetch_one(&self, source: &FeedSource) -> Option<ParsedFeed> {
        info!("Downloading feed: {}", source.url);
        match self.fetcher.fetch(&source.url).await {
            Ok(feed) => {
                info!(
                    "Downloaded {} entries from {}",
                    feed.entry_count(),
                    source.url
                );
                Some(feed)
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", source.url, e);
                None
            }
        }
    }
}

/// Spawn the updater on the runtime and return a handle to it.
pub fn spawn_guide_updater(updater: GuideUpdater) -> UpdaterHandle {
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let task = tokio::spawn(updater.run(shutdown_rx));

    UpdaterHandle {
        shutdown: shutdown_tx,
        task,
    }
}
