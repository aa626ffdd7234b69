use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use rusqlite::{params_from_iter, Connection, Params, Transaction};
use rusqlite_migration::Migrations;

use crate::db::types::{to_sql_value, Entity, Row, IDENTITY_COLUMNS};

#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn migrate(&self, migrations: &Migrations) -> Result<()> {
        let mut conn = self.lock();
        migrations.to_latest(&mut *conn)?;
        Ok(())
    }

    /// Calls the supplied closure with a database transaction. Commits
    /// automatically if the closure returns Ok, otherwise rolls back.
    pub fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction) -> Result<R>,
    {
        let mut conn = self.lock();
        let txn = conn.transaction()?;
        let result = f(&txn)?;
        txn.commit()?;
        Ok(result)
    }

    /// Runs a query and maps each row onto `E` by column name.
    pub fn query<E: Entity, P: Params>(&self, sql: &str, params: P) -> Result<Vec<E>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let entities = serde_rusqlite::from_rows::<E>(stmt.query(params)?)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entities)
    }

    pub fn get<E: Entity>(&self, table_name: &str, id: &str) -> Result<Option<E>> {
        let sql = format!("SELECT * FROM {} WHERE id = ? LIMIT 1", table_name);
        Ok(self.query::<E, _>(&sql, [id])?.into_iter().next())
    }

    /// Inserts a new row. Only keys that are columns of the table are
    /// written; anything else in `row` is ignored.
    pub fn insert(&self, table_name: &str, row: &Row) -> Result<()> {
        self.transaction(|txn| {
            let column_names = table_column_names(txn, table_name)?;
            let columns: Vec<(&String, _)> = row
                .iter()
                .filter(|(name, _)| column_names.iter().any(|col| col == *name))
                .map(|(name, value)| (name, to_sql_value(value)))
                .collect();

            if columns.is_empty() {
                return Err(anyhow!("No valid columns found for table '{}'", table_name));
            }

            let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
            let placeholders = vec!["?"; columns.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table_name,
                names.join(", "),
                placeholders
            );
            txn.execute(&sql, params_from_iter(columns.into_iter().map(|(_, v)| v)))?;
            Ok(())
        })
    }

    /// Replaces the given fields of the row `id` owned by `owner`. Identity
    /// columns are never written. Returns the number of rows changed, which
    /// is 0 when no such row exists for that owner.
    pub fn update(&self, table_name: &str, id: &str, owner: &str, fields: &Row) -> Result<usize> {
        self.transaction(|txn| {
            let column_names = table_column_names(txn, table_name)?;
            let columns: Vec<(&String, _)> = fields
                .iter()
                .filter(|(name, _)| !IDENTITY_COLUMNS.contains(&name.as_str()))
                .filter(|(name, _)| column_names.iter().any(|col| col == *name))
                .map(|(name, value)| (name, to_sql_value(value)))
                .collect();

            if columns.is_empty() {
                // Nothing to write, but still report whether the row exists.
                let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ? AND user_id = ?", table_name);
                let count: i64 = txn.query_row(&sql, [id, owner], |row| row.get(0))?;
                return Ok(count as usize);
            }

            let set_clause = columns
                .iter()
                .map(|(name, _)| format!("{} = ?", name))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {} WHERE id = ? AND user_id = ?",
                table_name, set_clause
            );

            let mut values: Vec<rusqlite::types::Value> =
                columns.into_iter().map(|(_, v)| v).collect();
            values.push(id.to_string().into());
            values.push(owner.to_string().into());

            Ok(txn.execute(&sql, params_from_iter(values))?)
        })
    }

    /// Removes the row `id` owned by `owner`, returning how many rows went.
    pub fn delete(&self, table_name: &str, id: &str, owner: &str) -> Result<usize> {
        self.transaction(|txn| {
            let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", table_name);
            Ok(txn.execute(&sql, [id, owner])?)
        })
    }

    pub fn table_column_names(&self, table_name: &str) -> Result<Vec<String>> {
        let conn = self.lock();
        table_column_names(&conn, table_name)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Db {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// A panic while holding the connection leaves any open transaction
    /// rolled back by `Transaction`'s drop, so a poisoned lock is still
    /// usable.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn table_column_names(conn: &Connection, table_name: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table_name))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(anyhow!("Table '{}' not found or has no columns", table_name));
    }

    Ok(columns)
}
