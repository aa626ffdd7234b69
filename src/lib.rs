pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod db;
pub mod error;
pub mod notifier;
pub mod page;
pub mod resource;
pub mod toast;

pub use auth::{AuthProvider, Caller, Session};
pub use client::{RemoteClient, SqliteClient};
pub use config::Config;
pub use context::AppContext;
pub use controller::{FormController, FormMode, ListController, ListState, Submitted};
pub use db::Db;
pub use error::{Error, RemoteError, Result, ValidationError};
pub use page::Page;
pub use resource::Resource;
pub use toast::{NotificationSink, Toast, ToastKind, Toaster};
pub use rusqlite;
pub use rusqlite_migration;
pub use serde_rusqlite;
