use serde::{Deserialize, Serialize};

use crate::resource::schema::{FieldKind, FieldSpec, ResourceDescriptor};
use crate::resource::{Badge, Resource};

pub static INVENTORY_ITEMS: ResourceDescriptor = ResourceDescriptor {
    table: "inventory_items",
    singular: "inventory item",
    plural: "inventory items",
    order_by: "name ASC",
    fields: &[
        FieldSpec::required("name", "Item Name", FieldKind::Text),
        FieldSpec::required("category", "Category", FieldKind::Text),
        FieldSpec::optional("sku", "SKU", FieldKind::Text),
        FieldSpec::required("current_stock", "Current Stock", FieldKind::Count).with_default("0"),
        FieldSpec::required("minimum_stock", "Minimum Stock", FieldKind::Count).with_default("0"),
        FieldSpec::optional("maximum_stock", "Maximum Stock", FieldKind::Count),
        FieldSpec::optional("unit_cost", "Unit Cost", FieldKind::Decimal),
        FieldSpec::optional("location", "Storage Location", FieldKind::Text),
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    /// Nothing on hand is out of stock; at or below the minimum is low.
    pub fn classify(current: i64, minimum: i64) -> Self {
        if current <= 0 {
            StockStatus::OutOfStock
        } else if current <= minimum {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::InStock => "In Stock",
        }
    }

    pub fn badge(self) -> Badge {
        match self {
            StockStatus::OutOfStock => Badge::Destructive,
            StockStatus::LowStock => Badge::Secondary,
            StockStatus::InStock => Badge::Default,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: Option<i64>,
    pub unit_cost: Option<f64>,
    pub location: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct InventoryItemFields {
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: Option<i64>,
    pub unit_cost: Option<f64>,
    pub location: Option<String>,
}

impl InventoryItem {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.current_stock, self.minimum_stock)
    }

    /// Stock on hand valued at unit cost; items without a cost count as zero.
    pub fn value(&self) -> f64 {
        self.unit_cost.unwrap_or(0.0) * self.current_stock as f64
    }
}

impl Resource for InventoryItem {
    type Fields = InventoryItemFields;

    fn descriptor() -> &'static ResourceDescriptor {
        &INVENTORY_ITEMS
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn fields(&self) -> InventoryItemFields {
        InventoryItemFields {
            name: self.name.clone(),
            category: self.category.clone(),
            sku: self.sku.clone(),
            current_stock: self.current_stock,
            minimum_stock: self.minimum_stock,
            maximum_stock: self.maximum_stock,
            unit_cost: self.unit_cost,
            location: self.location.clone(),
        }
    }

    fn badge(&self) -> Badge {
        self.stock_status().badge()
    }
}

pub fn total_value(items: &[InventoryItem]) -> f64 {
    items.iter().map(InventoryItem::value).sum()
}

/// Items that need reordering: low or out of stock.
pub fn needing_reorder(items: &[InventoryItem]) -> Vec<&InventoryItem> {
    items
        .iter()
        .filter(|i| i.stock_status() != StockStatus::InStock)
        .collect()
}
