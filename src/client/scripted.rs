use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::client::RemoteClient;
use crate::error::{RemoteError, Result};
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Insert,
    Update,
    Delete,
}

/// Wraps another client to count calls, add latency, fail operations on
/// demand, or hold them until released. Used to drive pages through the
/// failure and timing cases a real backend produces.
pub struct ScriptedClient<R, C> {
    inner: C,
    latency: Duration,
    calls: [AtomicUsize; 4],
    failures: Mutex<HashMap<Op, RemoteError>>,
    gates: Mutex<HashMap<Op, Arc<Semaphore>>>,
    _phantom: PhantomData<fn() -> R>,
}

impl<R: Resource, C: RemoteClient<R>> ScriptedClient<R, C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            latency: Duration::ZERO,
            calls: Default::default(),
            failures: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            _phantom: PhantomData,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of times `op` has been called, including failed calls.
    pub fn calls(&self, op: Op) -> usize {
        self.calls[op as usize].load(Ordering::SeqCst)
    }

    /// Makes every call to `op` fail with `error` until `heal` is called.
    pub fn fail(&self, op: Op, error: RemoteError) {
        lock(&self.failures).insert(op, error);
    }

    pub fn heal(&self, op: Op) {
        lock(&self.failures).remove(&op);
    }

    /// Calls to `op` wait until `release` is called.
    pub fn hold(&self, op: Op) {
        lock(&self.gates).insert(op, Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, op: Op) {
        if let Some(gate) = lock(&self.gates).remove(&op) {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    async fn before(&self, op: Op) -> Result<()> {
        self.calls[op as usize].fetch_add(1, Ordering::SeqCst);
        log::debug!("scripted {:?} on {}", op, R::descriptor().table);

        // the outcome is fixed when the call starts, even if it is slow or held
        let failure = lock(&self.failures).get(&op).cloned();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let gate = lock(&self.gates).get(&op).cloned();
        if let Some(gate) = gate {
            // only fails once the semaphore is closed, which never happens
            let _ = gate.acquire().await;
        }

        match failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl<R: Resource, C: RemoteClient<R>> RemoteClient<R> for ScriptedClient<R, C> {
    async fn list(&self) -> Result<Vec<R>> {
        self.before(Op::List).await?;
        self.inner.list().await
    }

    async fn insert(&self, fields: &R::Fields) -> Result<R> {
        self.before(Op::Insert).await?;
        self.inner.insert(fields).await
    }

    async fn update(&self, id: &str, fields: &R::Fields) -> Result<()> {
        self.before(Op::Update).await?;
        self.inner.update(id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.before(Op::Delete).await?;
        self.inner.delete(id).await
    }
}
