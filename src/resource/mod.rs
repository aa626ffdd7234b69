//! Resource kinds managed by the dashboard and the schema descriptors that
//! drive the generic controllers.
//!
//! A resource exists in two shapes. `R::Fields` is a new, unsaved field set
//! with no identity. `R` itself is a persisted row: it always carries the
//! server-assigned `id`, the owning `user_id` and both timestamps. A value is
//! never both.

use std::fmt::Debug;

use serde_json::Value;

use crate::db::Entity;
use crate::error::{Problem, ValidationError};

pub mod equipment;
pub mod financial;
pub mod inventory;
pub mod maintenance;
pub mod production;
pub mod schema;

pub use equipment::{Equipment, EquipmentFields, EquipmentStatus};
pub use financial::{FinancialTransaction, FinancialTransactionFields, Totals, TransactionType};
pub use inventory::{InventoryItem, InventoryItemFields, StockStatus};
pub use maintenance::{MaintenanceRecord, MaintenanceRecordFields};
pub use production::{ProductionRecord, ProductionRecordFields};
pub use schema::{form_input, FieldKind, FieldSpec, FormInput, ResourceDescriptor};

/// Visual weight of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Default,
    Secondary,
    Destructive,
    Outline,
    Success,
}

pub trait Resource: Entity + Clone + Debug + Send + Sync + 'static {
    type Fields: Entity + Clone + Debug + PartialEq + Send + Sync + 'static;

    fn descriptor() -> &'static ResourceDescriptor;

    fn id(&self) -> &str;
    fn owner(&self) -> &str;
    fn created_at(&self) -> &str;
    fn updated_at(&self) -> &str;

    /// The editable part of this row.
    fn fields(&self) -> Self::Fields;

    fn badge(&self) -> Badge {
        Badge::Default
    }

    /// Validates raw form input into a typed field set.
    fn parse_fields(input: &FormInput) -> Result<Self::Fields, ValidationError> {
        let row = Self::descriptor().validate(input)?;
        serde_json::from_value(Value::Object(row)).map_err(|e| {
            let mut errors = ValidationError::default();
            errors.push(Self::descriptor().table, Problem::Malformed(e.to_string()));
            errors
        })
    }

    /// Form values pre-filled from this row.
    fn to_input(&self) -> FormInput {
        Self::descriptor().to_input(&self.fields())
    }
}
