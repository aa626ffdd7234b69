//! Transient success/failure messages.
//!
//! A [`Toaster`] keeps toasts in the order they were raised and drops each one
//! once its time to live has passed. Nothing survives the process.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::notifier::Notifier;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
    pub raised_at: Instant,
}

/// Anything that can show a non-blocking message to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: ToastKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(ToastKind::Success, message);
    }

    fn failure(&self, message: &str) {
        self.notify(ToastKind::Failure, message);
    }
}

pub struct Toaster {
    ttl: Duration,
    queue: Mutex<VecDeque<Toast>>,
    next_id: AtomicU64,
    notifier: Notifier<Toast>,
}

impl Toaster {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            queue: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            notifier: Notifier::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Toasts still on screen right now, oldest first.
    pub fn visible(&self) -> Vec<Toast> {
        self.visible_at(Instant::now())
    }

    /// Toasts still on screen at `now`, oldest first. Expired toasts are
    /// dropped from the queue.
    pub fn visible_at(&self, now: Instant) -> Vec<Toast> {
        let mut queue = self.queue();
        self.expire(&mut queue, now);
        queue.iter().cloned().collect()
    }

    /// Removes a toast before it expires. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|t| t.id != id);
        queue.len() != before
    }

    /// A channel that receives every toast as it is raised.
    pub fn observer(&self) -> Receiver<Toast> {
        self.notifier.observer()
    }

    fn expire(&self, queue: &mut VecDeque<Toast>, now: Instant) {
        let ttl = self.ttl;
        queue.retain(|t| now.saturating_duration_since(t.raised_at) < ttl);
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NotificationSink for Toaster {
    fn notify(&self, kind: ToastKind, message: &str) {
        let toast = Toast {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            message: message.to_string(),
            raised_at: Instant::now(),
        };
        log::debug!("toast {:?}: {}", kind, message);
        let mut queue = self.queue();
        self.expire(&mut queue, toast.raised_at);
        queue.push_back(toast.clone());
        drop(queue);
        self.notifier.notify(toast);
    }
}
