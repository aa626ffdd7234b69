//! One resource page: a list and a form over the same client, sharing a
//! lifetime.

use std::sync::Arc;

use log::debug;

use crate::client::RemoteClient;
use crate::controller::{FormController, Liveness, ListController, Submitted};
use crate::error::Result;
use crate::resource::{FormInput, Resource};
use crate::toast::NotificationSink;

pub struct Page<R, C> {
    list: ListController<R, C>,
    form: FormController<R, C>,
    liveness: Liveness,
}

impl<R: Resource, C: RemoteClient<R>> Page<R, C> {
    pub fn new(client: Arc<C>, sink: Arc<dyn NotificationSink>) -> Self {
        let liveness = Liveness::new();
        Self {
            list: ListController::new(client.clone(), sink.clone(), liveness.clone()),
            form: FormController::new(client, sink, liveness.clone()),
            liveness,
        }
    }

    pub fn list(&self) -> &ListController<R, C> {
        &self.list
    }

    pub fn form(&self) -> &FormController<R, C> {
        &self.form
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// First load when the page is shown.
    pub async fn mount(&self) -> Result<()> {
        debug!("mounting {} page", R::descriptor().plural);
        self.list.reload().await
    }

    pub fn open_create(&self) {
        self.form.open_create();
    }

    pub fn open_edit(&self, resource: &R) {
        self.form.open_edit(resource);
    }

    pub fn cancel(&self) {
        self.form.cancel();
    }

    /// Submits the form and reloads the list once if the write went
    /// through. A failed reload after a successful write is reported by the
    /// list itself and does not undo the submission.
    pub async fn submit(&self, values: FormInput) -> Result<Submitted<R>> {
        let outcome = self.form.submit(values).await?;
        if let Err(e) = self.list.reload().await {
            debug!("reload after saving {} failed: {}", R::descriptor().singular, e);
        }
        Ok(outcome)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.list.delete(id).await
    }

    /// Tears the page down. Anything still in flight finishes against the
    /// store but its result is dropped.
    pub fn dispose(&self) {
        debug!("disposing {} page", R::descriptor().plural);
        self.liveness.dispose();
    }
}
