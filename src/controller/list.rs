use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::client::RemoteClient;
use crate::controller::{lock, Liveness};
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::toast::NotificationSink;

#[derive(Debug, Clone)]
pub enum ListState<R> {
    /// Never loaded.
    Idle,
    Loaded(Vec<R>),
    Failed(Error),
}

/// Holds the collection for one resource kind. The collection only ever
/// changes through `reload`; mutations elsewhere ask for a reload instead of
/// patching it.
pub struct ListController<R, C> {
    client: Arc<C>,
    sink: Arc<dyn NotificationSink>,
    liveness: Liveness,
    state: Mutex<ListState<R>>,
    generation: AtomicU64,
}

impl<R: Resource, C: RemoteClient<R>> ListController<R, C> {
    pub fn new(client: Arc<C>, sink: Arc<dyn NotificationSink>, liveness: Liveness) -> Self {
        Self {
            client,
            sink,
            liveness,
            state: Mutex::new(ListState::Idle),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> ListState<R> {
        lock(&self.state).clone()
    }

    /// The loaded collection, or nothing if the last load failed or none ran.
    pub fn items(&self) -> Vec<R> {
        match &*lock(&self.state) {
            ListState::Loaded(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn find(&self, id: &str) -> Option<R> {
        match &*lock(&self.state) {
            ListState::Loaded(items) => items.iter().find(|r| r.id() == id).cloned(),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(&*lock(&self.state), ListState::Loaded(_))
    }

    /// Evaluates `f` over the loaded collection. Returns `None` unless the
    /// list is loaded.
    pub fn view<T>(&self, f: impl FnOnce(&[R]) -> T) -> Option<T> {
        match &*lock(&self.state) {
            ListState::Loaded(items) => Some(f(items)),
            _ => None,
        }
    }

    pub async fn reload(&self) -> Result<()> {
        let descriptor = R::descriptor();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("reloading {} (generation {})", descriptor.plural, generation);

        let result = self.client.list().await;

        if !self.liveness.is_alive() {
            debug!("dropping {} load for disposed page", descriptor.plural);
            return Err(Error::Disposed);
        }
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("dropping stale {} load (generation {})", descriptor.plural, generation);
            return result.map(|_| ());
        }

        match result {
            Ok(items) => {
                debug!("loaded {} {}", items.len(), descriptor.plural);
                *lock(&self.state) = ListState::Loaded(items);
                Ok(())
            }
            Err(e) => {
                warn!("loading {} failed: {}", descriptor.plural, e);
                *lock(&self.state) = ListState::Failed(e.clone());
                self.sink.failure(&descriptor.load_failed_message());
                Err(e)
            }
        }
    }

    /// Deletes `id` and, if that worked, reloads once. A failed delete
    /// leaves the collection as it was. The delete has already happened by
    /// the time the reload runs, so a failed reload is reported by its own
    /// toast and does not fail the delete.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let descriptor = R::descriptor();
        let result = self.client.delete(id).await;

        if !self.liveness.is_alive() {
            return Err(Error::Disposed);
        }

        match result {
            Ok(()) => {
                info!("deleted {} {}", descriptor.singular, id);
                self.sink.success(&descriptor.deleted_message());
                if let Err(e) = self.reload().await {
                    debug!("reload after deleting {} {} failed: {}", descriptor.singular, id, e);
                }
                Ok(())
            }
            Err(Error::NotAuthenticated) => {
                warn!("cannot delete {} {}: not signed in", descriptor.singular, id);
                Err(Error::NotAuthenticated)
            }
            Err(e) => {
                warn!("deleting {} {} failed: {}", descriptor.singular, id, e);
                self.sink.failure(&descriptor.delete_failed_message());
                Err(e)
            }
        }
    }
}
