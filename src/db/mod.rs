// Re-export all public items from the db modules
pub use self::types::*;
pub use self::core::Db;
pub use rusqlite_migration::{Migrations, M};

pub mod types;
pub mod core;
pub mod schema;
