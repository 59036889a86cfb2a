// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Coordinator - mirrors the remote manifest into the asset store
//!
//! One cycle:
//! 1. Fetch the manifest. Any failure aborts the cycle with nothing written.
//! 2. Skip every entry whose hash is already stored (no network traffic).
//! 3. Download the rest through a bounded pool of workers, retrying
//!    transient failures with exponential backoff.
//! 4. Commit each fully downloaded entry, then evict its superseded versions.
//! 5. Report per-entry failures in aggregate; they never abort siblings.
//!
//! Only one cycle runs at a time. Calls made while a cycle is in flight wait
//! for it and receive its result.

mod report;

pub use report::{AssetFailure, SyncError, SyncReport};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AssetConfig;
use crate::integrity::verify_checksum;
use crate::remote::{AssetFetcher, FetchError, ManifestClient};
use crate::store::{AssetStore, StoreError};
use crate::types::{Asset, ManifestEntry};

type SyncOutcome = Result<SyncReport, SyncError>;

/// Why a single entry was not committed
#[derive(Debug)]
enum EntryError {
    Fetch(FetchError),
    Store(StoreError),
    Cancelled,
}

impl From<FetchError> for EntryError {
    fn from(err: FetchError) -> Self {
        EntryError::Fetch(err)
    }
}

impl From<StoreError> for EntryError {
    fn from(err: StoreError) -> Self {
        EntryError::Store(err)
    }
}

impl EntryError {
    fn into_failure(self, entry: &ManifestEntry) -> AssetFailure {
        let (error, retryable) = match self {
            EntryError::Fetch(e) => (e.to_string(), e.is_retryable()),
            EntryError::Store(e) => (e.to_string(), true),
            EntryError::Cancelled => ("cancelled".to_string(), true),
        };
        AssetFailure {
            name: entry.name.clone(),
            hash: entry.hash.clone(),
            error,
            retryable,
        }
    }
}

/// Coordinates manifest diffing, bounded downloads and atomic commits
pub struct SyncCoordinator {
    manifest_client: Arc<dyn ManifestClient>,
    fetcher: Arc<dyn AssetFetcher>,
    store: Arc<AssetStore>,
    config: Arc<AssetConfig>,
    in_flight: Mutex<Option<watch::Receiver<Option<SyncOutcome>>>>,
    cancel_token: Mutex<Option<CancellationToken>>,
}

impl SyncCoordinator {
    pub fn new(
        config: AssetConfig,
        manifest_client: Arc<dyn ManifestClient>,
        fetcher: Arc<dyn AssetFetcher>,
        store: Arc<AssetStore>,
    ) -> Self {
        Self {
            manifest_client,
            fetcher,
            store,
            config: Arc::new(config),
            in_flight: Mutex::new(None),
            cancel_token: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<AssetStore> {
        &self.store
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Whether a cycle is currently running
    pub fn is_syncing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Whether a scheduled sync is due
    pub fn should_sync_now(&self) -> bool {
        if !self.config.remote_updates_enabled {
            return false;
        }

        let Some(last_sync) = self.store.last_sync_time() else {
            // Never synced before
            return true;
        };

        let elapsed = SystemTime::now()
            .duration_since(last_sync)
            .unwrap_or_default();

        elapsed >= self.config.check_interval
    }

    /// Request cancellation of the running cycle
    ///
    /// Takes effect at the next checkpoint between entry downloads; a commit
    /// that has started always completes. Returns false when idle.
    pub fn cancel(&self) -> bool {
        match self.cancel_token.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run one sync cycle, or join the one already running
    pub async fn update_all_assets(&self) -> SyncOutcome {
        let slot = {
            let mut in_flight = self.in_flight.lock();
            match in_flight.as_ref() {
                Some(rx) => Err(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *in_flight = Some(rx);
                    let token = CancellationToken::new();
                    *self.cancel_token.lock() = Some(token.clone());
                    Ok((tx, token))
                }
            }
        };

        let (tx, token) = match slot {
            Ok(leader) => leader,
            Err(rx) => {
                debug!("Sync already in flight, joining it");
                return wait_for_outcome(rx).await;
            }
        };

        let guard = InFlightGuard { coordinator: self };
        let outcome = self.run_cycle(&token).await;
        drop(guard);

        // Joined callers observe the same result
        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    async fn run_cycle(&self, token: &CancellationToken) -> SyncOutcome {
        if !self.config.remote_updates_enabled {
            return Err(SyncError::Disabled);
        }

        let manifest = match self.manifest_client.fetch_manifest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "Manifest fetch failed, sync aborted");
                return Err(e.into());
            }
        };
        info!(entries = manifest.len(), "Manifest fetched");

        let mut report = SyncReport::default();
        let mut pending = Vec::new();

        for entry in &manifest {
            match self.reconcile_stored(entry) {
                Ok(true) => report.unchanged += 1,
                Ok(false) => pending.push(entry.clone()),
                Err(e) => {
                    warn!(name = %entry.name, error = %e, "Cannot inspect stored versions");
                    report.failures.push(EntryError::Store(e).into_failure(entry));
                }
            }
        }

        debug!(
            unchanged = report.unchanged,
            to_download = pending.len(),
            "Manifest diff complete"
        );

        self.download_phase(pending, token, &mut report).await;
        report.cancelled = token.is_cancelled();

        if !report.cancelled {
            if self.config.prune_removed {
                self.prune_removed(&manifest, &mut report);
            }
            if let Err(e) = self.store.set_last_sync_time(SystemTime::now()) {
                warn!(error = %e, "Failed to record sync time");
            }
        }

        info!(
            updated = report.updated_count(),
            unchanged = report.unchanged,
            failed = report.failed_count(),
            not_evicted = report.eviction_failures.len(),
            skipped = report.skipped,
            pruned = report.pruned.len(),
            cancelled = report.cancelled,
            "Sync cycle complete"
        );
        Ok(report)
    }

    /// Returns true when `entry.hash` is already stored (repairing the
    /// current pointer and leftover versions without any network traffic).
    fn reconcile_stored(&self, entry: &ManifestEntry) -> Result<bool, StoreError> {
        let hashes = self.store.list_hashes(&entry.name)?;
        if !hashes.contains(&entry.hash) {
            return Ok(false);
        }

        if self.store.current_hash(&entry.name).as_deref() != Some(entry.hash.as_str()) {
            self.store.promote(&entry.name, &entry.hash)?;
        }
        if hashes.len() > 1 {
            self.store.evict_superseded(&entry.name, &entry.hash)?;
        }
        Ok(true)
    }

    async fn download_phase(
        &self,
        pending: Vec<ManifestEntry>,
        token: &CancellationToken,
        report: &mut SyncReport,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.config.download_slots()));
        let mut workers = JoinSet::new();
        let mut queue = pending.into_iter();

        while let Some(entry) = queue.next() {
            // Only spawn when a transfer slot is free
            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                _ = token.cancelled() => None,
            };
            let Some(permit) = permit else {
                report.skipped += 1 + queue.len();
                break;
            };
            if token.is_cancelled() {
                report.skipped += 1 + queue.len();
                break;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let config = Arc::clone(&self.config);
            let token = token.clone();

            workers.spawn(async move {
                let _permit = permit;
                let result = sync_entry(&entry, fetcher.as_ref(), &store, &config, &token).await;
                (entry, result)
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((entry, result)) => record_entry(report, entry, result),
                Err(e) => {
                    warn!(error = %e, "Download worker panicked");
                    report.failures.push(AssetFailure {
                        name: String::new(),
                        hash: String::new(),
                        error: e.to_string(),
                        retryable: true,
                    });
                }
            }
        }

        report.updated.sort();
    }

    fn prune_removed(&self, manifest: &[ManifestEntry], report: &mut SyncReport) {
        let listed: HashSet<&str> = manifest.iter().map(|e| e.name.as_str()).collect();
        for name in self.store.names() {
            if listed.contains(name.as_str()) {
                continue;
            }
            match self.store.remove_name(&name) {
                Ok(_) => {
                    debug!(name = %name, "Asset no longer listed, removed");
                    report.pruned.push(name);
                }
                Err(e) => warn!(name = %name, error = %e, "Failed to remove unlisted asset"),
            }
        }
    }
}

/// Clears the in-flight slot even if the leading call is dropped mid-cycle
struct InFlightGuard<'a> {
    coordinator: &'a SyncCoordinator,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.cancel_token.lock().take();
        self.coordinator.in_flight.lock().take();
    }
}

async fn wait_for_outcome(mut rx: watch::Receiver<Option<SyncOutcome>>) -> SyncOutcome {
    loop {
        let published = rx.borrow_and_update().clone();
        if let Some(outcome) = published {
            return outcome;
        }
        if rx.changed().await.is_err() {
            // Leader gone; it may still have published before dropping
            return rx.borrow().clone().unwrap_or(Err(SyncError::Aborted));
        }
    }
}

/// Fold one worker result into the report
fn record_entry(
    report: &mut SyncReport,
    entry: ManifestEntry,
    result: Result<Option<StoreError>, EntryError>,
) {
    match result {
        Ok(eviction) => {
            if let Some(e) = eviction {
                report
                    .eviction_failures
                    .push(EntryError::Store(e).into_failure(&entry));
            }
            report.updated.push(entry.name);
        }
        Err(EntryError::Cancelled) => report.skipped += 1,
        Err(e) => {
            let failure = e.into_failure(&entry);
            warn!(
                name = %failure.name,
                hash = %failure.hash,
                error = %failure.error,
                "Asset update failed"
            );
            report.failures.push(failure);
        }
    }
}

/// Download every variant of `entry`, then commit and evict older versions.
///
/// Returns the eviction error when the new version is committed but older
/// versions are still on disk.
async fn sync_entry(
    entry: &ManifestEntry,
    fetcher: &dyn AssetFetcher,
    store: &Arc<AssetStore>,
    config: &AssetConfig,
    token: &CancellationToken,
) -> Result<Option<StoreError>, EntryError> {
    if token.is_cancelled() {
        return Err(EntryError::Cancelled);
    }

    let mut asset = Asset::new(&entry.name, &entry.hash);
    for variant in &entry.variants {
        let data = fetch_with_retry(fetcher, &variant.url, config, token).await?;

        if data.len() as u64 > config.max_asset_size {
            return Err(FetchError::TooLarge {
                size: data.len() as u64,
                max: config.max_asset_size,
            }
            .into());
        }
        if let Some(checksum) = &variant.checksum {
            verify_checksum(&data, checksum).map_err(FetchError::from)?;
        }
        asset.variants.insert(variant.key(), data);
    }

    // Past this point the commit runs to completion regardless of cancellation
    let store = Arc::clone(store);
    let (committed, eviction) = tokio::task::spawn_blocking(
        move || -> Result<(Asset, Option<StoreError>), StoreError> {
            store.put(&asset)?;
            let eviction = match store.evict_superseded(&asset.name, &asset.hash) {
                Ok(removed) => {
                    if removed > 0 {
                        debug!(name = %asset.name, removed, "Superseded versions removed");
                    }
                    None
                }
                Err(e) => {
                    warn!(name = %asset.name, error = %e, "Eviction of old versions failed");
                    Some(e)
                }
            };
            Ok((asset, eviction))
        },
    )
    .await
    .map_err(|e| StoreError::Io(std::io::Error::other(e.to_string())))??;

    info!(
        name = %committed.name,
        hash = %committed.hash,
        variants = committed.variants.len(),
        "Asset updated"
    );
    Ok(eviction)
}

async fn fetch_with_retry(
    fetcher: &dyn AssetFetcher,
    url: &str,
    config: &AssetConfig,
    token: &CancellationToken,
) -> Result<Vec<u8>, EntryError> {
    let mut attempt = 1;
    let mut delay = config.retry_backoff;

    loop {
        let result = match tokio::time::timeout(config.timeout, fetcher.fetch_bytes(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Network(format!(
                "timed out after {:?}",
                config.timeout
            ))),
        };

        match result {
            Ok(data) => return Ok(data),
            Err(e) if e.is_retryable() && attempt < config.attempts() => {
                warn!(url = %url, attempt, error = %e, "Download failed, retrying");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => return Err(EntryError::Cancelled),
                }
                attempt += 1;
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e.into()),
        }
    }
}
