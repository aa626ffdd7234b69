use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{AuthProvider, Caller};
use crate::client::RemoteClient;
use crate::db::{Db, Row};
use crate::error::{Error, RemoteError, Result};
use crate::resource::Resource;

/// `RemoteClient` over the SQLite store. Rows are scoped to the signed-in
/// caller. Store work runs on the blocking pool so the event loop never
/// waits on disk.
pub struct SqliteClient<R> {
    db: Db,
    auth: Arc<dyn AuthProvider>,
    _phantom: PhantomData<fn() -> R>,
}

impl<R: Resource> SqliteClient<R> {
    pub fn new(db: Db, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            db,
            auth,
            _phantom: PhantomData,
        }
    }

    fn caller(&self) -> Option<Caller> {
        self.auth.current_caller()
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Db) -> anyhow::Result<T> + Send + 'static,
    {
        let table = R::descriptor().table;
        let db = self.db.clone();
        let result = match tokio::task::spawn_blocking(move || f(db)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => RemoteError::from(e),
            Err(e) => RemoteError::Unavailable(e.to_string()),
        };
        warn!("{} on {} failed: {}", op, table, result);
        Err(result.into())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_row<F: serde::Serialize>(fields: &F) -> Result<Row> {
    match serde_json::to_value(fields) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(RemoteError::Query(format!("fields serialized to {} instead of an object", other)).into()),
        Err(e) => Err(RemoteError::Query(e.to_string()).into()),
    }
}

#[async_trait]
impl<R: Resource> RemoteClient<R> for SqliteClient<R> {
    async fn list(&self) -> Result<Vec<R>> {
        let caller = self
            .caller()
            .ok_or_else(|| RemoteError::Unauthorized("no signed-in user".to_string()))?;
        let descriptor = R::descriptor();
        debug!("list {} for {}", descriptor.table, caller.user_id);

        let sql = format!(
            "SELECT * FROM {} WHERE user_id = ? ORDER BY {}",
            descriptor.table, descriptor.order_by
        );
        self.run("list", move |db| db.query::<R, _>(&sql, [caller.user_id.as_str()]))
            .await
    }

    async fn insert(&self, fields: &R::Fields) -> Result<R> {
        let caller = self.caller().ok_or(Error::NotAuthenticated)?;
        let table = R::descriptor().table;

        let id = Uuid::now_v7().to_string();
        let now = timestamp();
        let mut row = to_row(fields)?;
        row.insert("id".to_string(), Value::String(id.clone()));
        row.insert("user_id".to_string(), Value::String(caller.user_id.clone()));
        row.insert("created_at".to_string(), Value::String(now.clone()));
        row.insert("updated_at".to_string(), Value::String(now));

        let inserted = self
            .run("insert", move |db| {
                db.insert(table, &row)?;
                db.get::<R>(table, &id)?
                    .ok_or_else(|| anyhow!("inserted {} row {} could not be read back", table, id))
            })
            .await?;
        info!("inserted {} row {} for {}", table, inserted.id(), caller.user_id);
        Ok(inserted)
    }

    async fn update(&self, id: &str, fields: &R::Fields) -> Result<()> {
        let caller = self.caller().ok_or(Error::NotAuthenticated)?;
        let table = R::descriptor().table;

        let mut row = to_row(fields)?;
        row.insert("updated_at".to_string(), Value::String(timestamp()));

        let target = id.to_string();
        let owner = caller.user_id;
        let changed = self
            .run("update", move |db| db.update(table, &target, &owner, &row))
            .await?;

        if changed == 0 {
            warn!("update of missing {} row {}", table, id);
            return Err(RemoteError::NotFound { table, id: id.to_string() }.into());
        }
        info!("updated {} row {}", table, id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let caller = self.caller().ok_or(Error::NotAuthenticated)?;
        let table = R::descriptor().table;

        let target = id.to_string();
        let owner = caller.user_id;
        let removed = self
            .run("delete", move |db| db.delete(table, &target, &owner))
            .await?;

        if removed == 0 {
            debug!("delete of absent {} row {} ignored", table, id);
        } else {
            info!("deleted {} row {}", table, id);
        }
        Ok(())
    }
}
