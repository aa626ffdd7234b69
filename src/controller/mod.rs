//! Generic list and form controllers shared by every resource page.
//!
//! Controllers take `&self` and keep their state behind a mutex that is never
//! held across an `.await`, so a UI can share them freely. Every async method
//! checks the owner's [`Liveness`] when it resumes and drops its result if the
//! owner has been torn down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod form;
pub mod list;

pub use form::{FormController, FormMode, Submitted};
pub use list::{ListController, ListState};

/// Shared flag telling in-flight operations whether their owner still exists.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn dispose(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
