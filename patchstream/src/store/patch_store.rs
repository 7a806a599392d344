//! Deduplicating patch fetch pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::patch::PatchInfo;
use crate::source::{AsyncHttpClient, AsyncReqwestClient, PatchSource, SourceRegistry};

/// Load pipeline from the registered sources into the catalog.
///
/// Cheap to clone; clones share the catalog, the in-flight set and the
/// revision channel.
pub struct PatchStore<C: AsyncHttpClient + 'static = AsyncReqwestClient> {
    catalog: Arc<Mutex<Catalog>>,
    sources: Arc<SourceRegistry<C>>,
    /// Filenames with a fetch currently in flight.
    requests: Arc<DashMap<String, ()>>,
    loading: Arc<AtomicBool>,
    revision: Arc<watch::Sender<u64>>,
}

impl<C: AsyncHttpClient + 'static> Clone for PatchStore<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            sources: Arc::clone(&self.sources),
            requests: Arc::clone(&self.requests),
            loading: Arc::clone(&self.loading),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<C: AsyncHttpClient + 'static> PatchStore<C> {
    /// Create a pipeline over `sources` feeding `catalog`.
    pub fn new(sources: SourceRegistry<C>, catalog: Arc<Mutex<Catalog>>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            catalog,
            sources: Arc::new(sources),
            requests: Arc::new(DashMap::new()),
            loading: Arc::new(AtomicBool::new(false)),
            revision: Arc::new(revision),
        }
    }

    /// Shared catalog handle.
    pub fn catalog(&self) -> Arc<Mutex<Catalog>> {
        Arc::clone(&self.catalog)
    }

    /// The source registry.
    pub fn sources(&self) -> &SourceRegistry<C> {
        &self.sources
    }

    /// Whether `init` is currently running.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Number of fetches currently in flight.
    pub fn requests_in_flight(&self) -> usize {
        self.requests.len()
    }

    /// Subscribe to patch arrivals; the value is a monotonic revision
    /// bumped on every push into the catalog.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Run the startup sequence: preload every source, then fully load.
    ///
    /// The preload pass registers bounds-only patches so queries and
    /// viewport fitting work before any payload lands. `is_loading` is
    /// set for the whole duration.
    pub async fn init(&self) {
        self.loading.store(true, Ordering::SeqCst);
        info!("patch store init: preload pass");
        self.preload().await;
        info!("patch store init: load pass");
        self.load().await;
        self.loading.store(false, Ordering::SeqCst);
        info!("patch store init complete");
    }

    /// Metadata-only pass: register every available patch without data.
    pub async fn preload(&self) {
        self.run_pass(false).await;
    }

    /// Full pass: fetch every available patch with data.
    pub async fn load(&self) {
        self.run_pass(true).await;
    }

    async fn run_pass(&self, include_data: bool) {
        let passes = self
            .sources
            .sources()
            .iter()
            .map(|source| self.load_source(source, include_data));
        join_all(passes).await;
    }

    /// Load everything one source offers, sequentially.
    async fn load_source(&self, source: &PatchSource<C>, include_data: bool) {
        if !source.is_available().await {
            warn!(source = source.name(), "source unavailable, skipping");
            return;
        }

        let infos = match source.available_patches().await {
            Ok(infos) => infos,
            Err(error) => {
                warn!(source = source.name(), %error, "failed to list patches");
                return;
            }
        };

        debug!(
            source = source.name(),
            count = infos.len(),
            include_data,
            "loading available patches"
        );

        for info in infos {
            match source.get_patch(&info, include_data).await {
                Ok(Some(patch)) => self.push(patch),
                Ok(None) => warn!(
                    source = source.name(),
                    filename = %info.filename,
                    "listed patch missing from source"
                ),
                Err(error) => warn!(
                    source = source.name(),
                    filename = %info.filename,
                    %error,
                    "patch load failed"
                ),
            }
        }
    }

    fn push(&self, patch: crate::patch::Patch) {
        self.catalog
            .lock()
            .expect("catalog lock poisoned")
            .push_patch(patch);
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Fire-and-forget fetch of one patch with data.
    ///
    /// No-op while a fetch for the same filename is in flight. On
    /// success the patch is pushed into the catalog; on failure the
    /// error is logged and the in-flight marker cleared without retry.
    /// Errors are not escalated to the caller.
    pub fn request(&self, source_name: &str, info: &PatchInfo) {
        if self
            .requests
            .insert(info.filename.clone(), ())
            .is_some()
        {
            debug!(filename = %info.filename, "request already in flight");
            return;
        }

        let store = self.clone();
        let source_name = source_name.to_string();
        let info = info.clone();

        tokio::spawn(async move {
            match store.sources.by_name(&source_name) {
                Some(source) => match source.get_patch(&info, true).await {
                    Ok(Some(patch)) => store.push(patch),
                    Ok(None) => warn!(
                        source = %source_name,
                        filename = %info.filename,
                        "requested patch missing from source"
                    ),
                    Err(error) => warn!(
                        source = %source_name,
                        filename = %info.filename,
                        %error,
                        "patch request failed"
                    ),
                },
                None => warn!(source = %source_name, "unknown source for request"),
            }
            store.requests.remove(&info.filename);
        });
    }
}
