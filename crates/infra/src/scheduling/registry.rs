//! Per-property sync scheduler registry.
//!
//! Owns one recurring worker task per property with an active sync
//! requirement: register on first subscription, deregister when no active
//! feeds remain. Each worker performs an immediate sync on activation, then
//! one per interval tick. Cancelling a worker stops its timer; an in-flight
//! cycle is allowed to finish.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use keystay_core::FeedSyncService;
use keystay_domain::constants::SYNC_INTERVAL_SECS;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Configuration for the sync registry.
#[derive(Debug, Clone)]
pub struct SyncRegistryConfig {
    /// Interval between sync cycles for one property.
    pub interval: Duration,
    /// Timeout applied to a single property sync cycle.
    pub cycle_timeout: Duration,
    /// Timeout for awaiting a worker's join handle on deregistration.
    pub join_timeout: Duration,
}

impl Default for SyncRegistryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(SYNC_INTERVAL_SECS),
            cycle_timeout: Duration::from_secs(300),
            join_timeout: Duration::from_secs(5),
        }
    }
}

struct PropertyWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry owning the per-property sync workers.
pub struct SyncRegistry {
    sync_service: Arc<FeedSyncService>,
    config: SyncRegistryConfig,
    workers: Mutex<HashMap<String, PropertyWorker>>,
}

impl SyncRegistry {
    pub fn new(sync_service: Arc<FeedSyncService>, config: SyncRegistryConfig) -> Self {
        Self { sync_service, config, workers: Mutex::new(HashMap::new()) }
    }

    /// Start a recurring worker for the property: one immediate sync, then
    /// one per tick.
    ///
    /// # Errors
    /// [`SchedulerError::AlreadyRegistered`] when a worker already exists.
    #[instrument(skip(self))]
    pub async fn register(&self, property_id: &str) -> SchedulerResult<()> {
        let mut workers = self.workers.lock().await;

        if let Some(worker) = workers.get(property_id) {
            if !worker.handle.is_finished() {
                return Err(SchedulerError::AlreadyRegistered(property_id.to_string()));
            }
            // A finished worker (panicked or cancelled elsewhere) can be
            // replaced.
            workers.remove(property_id);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Self::run_loop(
            Arc::clone(&self.sync_service),
            property_id.to_string(),
            self.config.clone(),
            cancel.clone(),
        ));

        workers.insert(property_id.to_string(), PropertyWorker { cancel, handle });

        info!(property_id, "sync worker registered");
        Ok(())
    }

    /// Cancel the property's worker and await its exit. Only this property's
    /// timer is touched; other properties' workers keep running.
    #[instrument(skip(self))]
    pub async fn deregister(&self, property_id: &str) -> SchedulerResult<()> {
        let worker = self
            .workers
            .lock()
            .await
            .remove(property_id)
            .ok_or_else(|| SchedulerError::NotRegistered(property_id.to_string()))?;

        worker.cancel.cancel();

        let join_timeout = self.config.join_timeout;
        tokio::time::timeout(join_timeout, worker.handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
            .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;

        info!(property_id, "sync worker deregistered");
        Ok(())
    }

    /// Whether a live worker exists for the property.
    pub async fn is_registered(&self, property_id: &str) -> bool {
        self.workers
            .lock()
            .await
            .get(property_id)
            .map(|worker| !worker.handle.is_finished())
            .unwrap_or(false)
    }

    /// Currently registered property ids.
    pub async fn registered_properties(&self) -> Vec<String> {
        self.workers.lock().await.keys().cloned().collect()
    }

    /// Cancel and drain every worker.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        let workers: Vec<(String, PropertyWorker)> =
            self.workers.lock().await.drain().collect();

        for (property_id, worker) in workers {
            worker.cancel.cancel();
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, worker.handle).await {
                Ok(Ok(())) => debug!(property_id, "sync worker stopped"),
                Ok(Err(e)) => warn!(property_id, error = %e, "sync worker join failed"),
                Err(_) => {
                    warn!(property_id, "sync worker did not stop within the join timeout");
                }
            }
        }

        info!("sync registry shut down");
        Ok(())
    }

    async fn run_loop(
        sync_service: Arc<FeedSyncService>,
        property_id: String,
        config: SyncRegistryConfig,
        cancel: CancellationToken,
    ) {
        // Immediate sync on activation, then one per tick. The cycle itself
        // is never raced against cancellation, only the wait is, so an
        // in-flight attempt finishes before the worker exits.
        loop {
            Self::run_cycle(&sync_service, &property_id, &config).await;

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(property_id, "sync worker cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
    }

    async fn run_cycle(
        sync_service: &Arc<FeedSyncService>,
        property_id: &str,
        config: &SyncRegistryConfig,
    ) {
        match tokio::time::timeout(config.cycle_timeout, sync_service.sync_property(property_id))
            .await
        {
            Ok(Ok(report)) => {
                debug!(
                    property_id,
                    feeds_total = report.feeds_total,
                    feeds_failed = report.feeds_failed,
                    "sync cycle finished"
                );
            }
            Ok(Err(e)) => {
                // Feed-level failures are recorded per feed; this is the
                // cycle itself failing (e.g. the feed listing query).
                error!(property_id, error = %e, "sync cycle failed");
            }
            Err(_) => {
                warn!(
                    property_id,
                    timeout_secs = config.cycle_timeout.as_secs(),
                    "sync cycle timed out"
                );
            }
        }
    }
}

impl Drop for SyncRegistry {
    fn drop(&mut self) {
        if let Ok(workers) = self.workers.try_lock() {
            if !workers.is_empty() {
                warn!(count = workers.len(), "SyncRegistry dropped with live workers; cancelling");
                for worker in workers.values() {
                    worker.cancel.cancel();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use keystay_core::{CalendarRepository, FeedFetcher, FeedRepository};
    use tempfile::TempDir;

    use super::*;
    use crate::database::manager::DbManager;
    use crate::database::{SqliteCalendarRepository, SqliteFeedRepository};
    use crate::feeds::HttpFeedFetcher;

    fn fast_config() -> SyncRegistryConfig {
        SyncRegistryConfig {
            interval: Duration::from_millis(50),
            cycle_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }

    fn sync_service(temp_dir: &TempDir) -> Arc<FeedSyncService> {
        let db_path = temp_dir.path().join("test.db");
        let manager = DbManager::new(&db_path, 4).unwrap();
        manager.run_migrations().unwrap();
        let pool = Arc::clone(manager.pool());

        let feed_repo: Arc<dyn FeedRepository> =
            Arc::new(SqliteFeedRepository::new(Arc::clone(&pool)));
        let calendar_repo: Arc<dyn CalendarRepository> =
            Arc::new(SqliteCalendarRepository::new(pool));
        let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFeedFetcher::new().unwrap());

        Arc::new(
            FeedSyncService::new(feed_repo, calendar_repo, fetcher)
                .with_feed_pause(Duration::ZERO),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_register_and_deregister() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SyncRegistry::new(sync_service(&temp_dir), fast_config());

        registry.register("prop-1").await.expect("register succeeds");
        assert!(registry.is_registered("prop-1").await);

        registry.deregister("prop-1").await.expect("deregister succeeds");
        assert!(!registry.is_registered("prop-1").await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_register_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SyncRegistry::new(sync_service(&temp_dir), fast_config());

        registry.register("prop-1").await.expect("first register");
        let err = registry.register("prop-1").await.expect_err("second register fails");
        assert!(matches!(err, SchedulerError::AlreadyRegistered(_)));

        registry.deregister("prop-1").await.expect("deregister succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deregistering_one_property_leaves_the_other_running() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SyncRegistry::new(sync_service(&temp_dir), fast_config());

        registry.register("prop-1").await.expect("register prop-1");
        registry.register("prop-2").await.expect("register prop-2");

        registry.deregister("prop-1").await.expect("deregister prop-1");
        assert!(!registry.is_registered("prop-1").await);
        assert!(registry.is_registered("prop-2").await);

        registry.shutdown().await.expect("shutdown drains the rest");
        assert!(!registry.is_registered("prop-2").await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deregistering_unknown_property_fails() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SyncRegistry::new(sync_service(&temp_dir), fast_config());

        let err = registry.deregister("absent").await.expect_err("not registered");
        assert!(matches!(err, SchedulerError::NotRegistered(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reregistration_after_deregister_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let registry = SyncRegistry::new(sync_service(&temp_dir), fast_config());

        registry.register("prop-1").await.expect("register");
        registry.deregister("prop-1").await.expect("deregister");
        registry.register("prop-1").await.expect("register again");
        registry.deregister("prop-1").await.expect("deregister again");
    }
}
