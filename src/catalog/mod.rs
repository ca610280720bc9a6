//! Shared snapshot cache for the Notion-backed catalogs.
//!
//! Every module that feeds a dropdown reads through the same machinery: a
//! snapshot behind an `RwLock`, one TTL definition, a single-permit semaphore
//! so at most one refresh is in flight, and a per-catalog worker that reloads
//! on an interval or on demand via a command channel.

pub mod loaders;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Semaphore};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("catalog source not configured")]
    NotConfigured,
    #[error("source error: {0}")]
    Source(String),
    #[error("another refresh is in progress")]
    AlreadyRefreshing,
}

impl From<crate::services::notion::NotionError> for LoadError {
    fn from(err: crate::services::notion::NotionError) -> Self {
        match err {
            crate::services::notion::NotionError::NotConfigured => LoadError::NotConfigured,
            other => LoadError::Source(other.to_string()),
        }
    }
}

/// Fetches the full contents of one catalog from its source.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    type Item: Clone + Send + Sync + Serialize + 'static;

    async fn load(&self) -> Result<Vec<Self::Item>, LoadError>;
}

pub enum Command {
    /// Refresh outside the normal interval. The worker acks with the result.
    Refresh(oneshot::Sender<Result<usize, LoadError>>),
    /// Stop the worker loop.
    Shutdown,
}

/// What a read sees: the data plus the staleness verdict every module shares.
#[derive(Debug, Serialize)]
pub struct CatalogSnapshot<T> {
    pub items: Vec<T>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub syncing: bool,
}

struct Inner<T> {
    items: Vec<T>,
    refreshed_at: Option<DateTime<Utc>>,
}

pub struct Catalog<T: Clone + Send + Sync + Serialize + 'static> {
    name: &'static str,
    ttl: Duration,
    inner: Arc<RwLock<Inner<T>>>,
    refresh_lock: Arc<Semaphore>,
    // Set once the first snapshot lands; the health endpoint reports it.
    ready: Arc<AtomicBool>,
    loader: Arc<dyn Loader<Item = T>>,
}

impl<T: Clone + Send + Sync + Serialize + 'static> Clone for Catalog<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            ttl: self.ttl,
            inner: Arc::clone(&self.inner),
            refresh_lock: Arc::clone(&self.refresh_lock),
            ready: Arc::clone(&self.ready),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<T: Clone + Send + Sync + Serialize + 'static> Catalog<T> {
    pub fn new(name: &'static str, ttl: Duration, loader: Arc<dyn Loader<Item = T>>) -> Self {
        Self {
            name,
            ttl,
            inner: Arc::new(RwLock::new(Inner {
                items: Vec::new(),
                refreshed_at: None,
            })),
            refresh_lock: Arc::new(Semaphore::new(1)),
            ready: Arc::new(AtomicBool::new(false)),
            loader,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn is_syncing(&self) -> bool {
        self.refresh_lock.available_permits() == 0
    }

    fn is_stale(&self, refreshed_at: Option<DateTime<Utc>>) -> bool {
        match refreshed_at {
            Some(at) => {
                let age = (Utc::now() - at).to_std().unwrap_or(Duration::ZERO);
                age >= self.ttl
            }
            None => true,
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot<T> {
        let guard = self.inner.read();
        CatalogSnapshot {
            items: guard.items.clone(),
            refreshed_at: guard.refreshed_at,
            stale: self.is_stale(guard.refreshed_at),
            syncing: self.is_syncing(),
        }
    }

    /// Run the loader and publish the result. Only one refresh may be in
    /// flight; callers that lose the race get `AlreadyRefreshing` and keep
    /// serving the current snapshot. A failed load leaves it untouched.
    pub async fn refresh(&self) -> Result<usize, LoadError> {
        let _permit = self
            .refresh_lock
            .clone()
            .try_acquire_owned()
            .map_err(|_| LoadError::AlreadyRefreshing)?;

        let items = self.loader.load().await?;
        let count = items.len();
        {
            let mut guard = self.inner.write();
            guard.items = items;
            guard.refreshed_at = Some(Utc::now());
        }
        self.ready.store(true, Ordering::Relaxed);
        Ok(count)
    }

    /// Block until the catalog has loaded at least once. Used on the read
    /// path so the first request after startup gets data instead of an empty
    /// snapshot.
    pub async fn ensure_loaded(&self) -> Result<(), LoadError> {
        if self.is_ready() {
            return Ok(());
        }
        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(LoadError::AlreadyRefreshing) => {
                // Someone else is doing the first load; wait for the permit
                // to free up and re-check.
                let permit = self
                    .refresh_lock
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| LoadError::Source("refresh lock closed".into()))?;
                drop(permit);
                if self.is_ready() {
                    Ok(())
                } else {
                    Err(LoadError::Source("initial load failed".into()))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Initial load, then reload on the interval or when a Refresh command
    /// arrives. Runs until Shutdown or until the channel closes.
    pub async fn run_worker(self, mut rx: mpsc::Receiver<Command>, interval: Duration) {
        tracing::info!("starting {} catalog sync", self.name);
        match self.refresh().await {
            Ok(count) => tracing::info!("{} catalog loaded ({} records)", self.name, count),
            Err(LoadError::AlreadyRefreshing) => {}
            Err(e) => tracing::warn!("{} catalog initial load failed: {}", self.name, e),
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial load above
        // already covered it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.refresh().await {
                        Ok(count) => {
                            tracing::info!("{} catalog refreshed ({} records)", self.name, count)
                        }
                        Err(LoadError::AlreadyRefreshing) => {}
                        Err(e) => tracing::warn!("{} catalog refresh failed: {}", self.name, e),
                    }
                }
                cmd = rx.recv() => match cmd {
                    Some(Command::Refresh(ack)) => {
                        let result = self.refresh().await;
                        if let Err(LoadError::Source(ref msg)) = result {
                            tracing::warn!("{} catalog refresh failed: {}", self.name, msg);
                        }
                        let _ = ack.send(result);
                    }
                    Some(Command::Shutdown) | None => {
                        tracing::info!("stopping {} catalog sync", self.name);
                        break;
                    }
                },
            }
        }
    }
}

/// A catalog plus the command channel of its running worker.
pub struct CatalogHandle<T: Clone + Send + Sync + Serialize + 'static> {
    catalog: Catalog<T>,
    commands: mpsc::Sender<Command>,
}

impl<T: Clone + Send + Sync + Serialize + 'static> Clone for CatalogHandle<T> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            commands: self.commands.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + Serialize + 'static> CatalogHandle<T> {
    /// Spawn the background worker and hand back the pair.
    pub fn spawn(catalog: Catalog<T>, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(catalog.clone().run_worker(rx, interval));
        Self {
            catalog,
            commands: tx,
        }
    }

    pub fn catalog(&self) -> &Catalog<T> {
        &self.catalog
    }

    pub fn is_ready(&self) -> bool {
        self.catalog.is_ready()
    }

    /// Ask the worker to refresh without waiting for the result.
    pub fn trigger_refresh(&self) -> bool {
        let (ack, _drop) = oneshot::channel();
        self.commands.try_send(Command::Refresh(ack)).is_ok()
    }

    /// Refresh through the worker and wait for its ack.
    pub async fn refresh_and_wait(&self) -> Result<usize, LoadError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(Command::Refresh(ack_tx))
            .await
            .map_err(|_| LoadError::Source("catalog worker stopped".into()))?;
        ack_rx
            .await
            .map_err(|_| LoadError::Source("catalog worker stopped".into()))?
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    /// The read path every catalog endpoint shares: wait for the first load,
    /// serve the snapshot, and kick a background refresh when the data is
    /// stale or the caller forced one. Mirrors the sync-then-serve flow the
    /// planning screen expects.
    pub async fn fetch(&self, force: bool) -> Result<CatalogSnapshot<T>, LoadError> {
        self.catalog.ensure_loaded().await?;

        let mut snapshot = self.catalog.snapshot();
        if (force || snapshot.stale) && !snapshot.syncing {
            snapshot.syncing = self.trigger_refresh();
        }
        Ok(snapshot)
    }
}
