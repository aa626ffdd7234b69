use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};

use crate::auth::Session;
use crate::client::{RemoteClient, SqliteClient};
use crate::config::{Config, DatabaseLocation};
use crate::controller::Liveness;
use crate::db::{schema, Db};
use crate::page::Page;
use crate::resource::Resource;
use crate::toast::{Toaster, DEFAULT_TTL};

/// The data-access context for one session. It owns the store, the
/// signed-in caller and the toast queue, and hands out clients and pages
/// wired to them. Built once, shut down once.
pub struct AppContext {
    db: Db,
    session: Arc<Session>,
    toaster: Arc<Toaster>,
    pages: Mutex<Vec<Liveness>>,
}

impl AppContext {
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn toaster(&self) -> &Arc<Toaster> {
        &self.toaster
    }

    pub fn client<R: Resource>(&self) -> Arc<SqliteClient<R>> {
        Arc::new(SqliteClient::new(self.db.clone(), self.session.clone()))
    }

    pub fn page<R: Resource>(&self) -> Page<R, SqliteClient<R>> {
        self.page_with(self.client())
    }

    /// A page over any client, still torn down by `shutdown`.
    pub fn page_with<R: Resource, C: RemoteClient<R>>(&self, client: Arc<C>) -> Page<R, C> {
        let page = Page::new(client, self.toaster.clone());
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(page.liveness());
        debug!("opened {} page", R::descriptor().plural);
        page
    }

    /// Disposes every page this context created.
    pub fn shutdown(&self) {
        let pages: Vec<Liveness> = self
            .pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for page in &pages {
            page.dispose();
        }
        info!("context shut down, {} pages disposed", pages.len());
    }
}

#[derive(Default)]
pub struct AppContextBuilder {
    location: Option<DatabaseLocation>,
    user: Option<String>,
    toast_ttl: Option<Duration>,
}

impl AppContextBuilder {
    /// Takes location, user and toast lifetime from `config`.
    pub fn config(mut self, config: &Config) -> Result<Self> {
        self.location = Some(config.database()?);
        self.user = config.user.clone();
        self.toast_ttl = Some(config.toast_ttl);
        Ok(self)
    }

    pub fn in_memory(mut self) -> Self {
        self.location = Some(DatabaseLocation::Memory);
        self
    }

    pub fn path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.location = Some(DatabaseLocation::File(path.into()));
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user = Some(user_id.into());
        self
    }

    pub fn toast_ttl(mut self, ttl: Duration) -> Self {
        self.toast_ttl = Some(ttl);
        self
    }

    /// Opens and migrates the store. Defaults to an in-memory store.
    pub fn build(self) -> Result<AppContext> {
        let db = self.location.unwrap_or(DatabaseLocation::Memory).open()?;
        db.migrate(&schema::migrations())?;

        let session = match self.user {
            Some(user_id) => Session::signed_in(user_id),
            None => Session::new(),
        };

        Ok(AppContext {
            db,
            session: Arc::new(session),
            toaster: Arc::new(Toaster::new(self.toast_ttl.unwrap_or(DEFAULT_TTL))),
            pages: Mutex::new(Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthProvider;
    use crate::resource::{form_input, Equipment, MaintenanceRecord};

    #[tokio::test]
    async fn pages_share_the_store() -> anyhow::Result<()> {
        let context = AppContext::builder().in_memory().user("u-1").build()?;
        let equipment = context.page::<Equipment>();
        let maintenance = context.page::<MaintenanceRecord>();

        equipment.open_create();
        equipment
            .submit(form_input([("name", "Crusher 1"), ("type", "Crusher")]))
            .await?;
        let crusher = equipment.list().items().remove(0);

        maintenance.mount().await?;
        maintenance.open_create();
        maintenance
            .submit(form_input([
                ("equipment_id", crusher.id.as_str()),
                ("type", "Liner change"),
                ("description", "Replace jaw liners"),
                ("scheduled_date", "2024-07-01"),
            ]))
            .await?;
        assert_eq!(maintenance.list().items()[0].equipment_id, crusher.id);
        assert_eq!(context.toaster().visible().len(), 2);
        Ok(())
    }

    #[test]
    fn builder_signs_in_configured_user() -> anyhow::Result<()> {
        let context = AppContext::builder().build()?;
        assert!(context.session().current_caller().is_none());

        let config = Config {
            database_url: "memory://".to_string(),
            user: Some("u-9".to_string()),
            toast_ttl: Duration::from_millis(250),
        };
        let context = AppContext::builder().config(&config)?.build()?;
        assert_eq!(context.session().current_caller().map(|c| c.user_id), Some("u-9".to_string()));
        assert_eq!(context.toaster().ttl(), Duration::from_millis(250));
        Ok(())
    }

    #[test]
    fn shutdown_disposes_pages() -> anyhow::Result<()> {
        let context = AppContext::builder().user("u-1").build()?;
        let page = context.page::<Equipment>();
        assert!(page.liveness().is_alive());
        context.shutdown();
        assert!(!page.liveness().is_alive());
        Ok(())
    }
}
