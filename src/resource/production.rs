use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::schema::{FieldKind, FieldSpec, ResourceDescriptor};
use crate::resource::{Badge, Resource};

pub const SHIFTS: &[&str] = &["day", "night"];
pub const QUALITY_GRADES: &[&str] = &["grade-a", "grade-b+", "grade-b", "standard"];

pub static PRODUCTION_RECORDS: ResourceDescriptor = ResourceDescriptor {
    table: "production_records",
    singular: "production record",
    plural: "production records",
    order_by: "date DESC, created_at DESC",
    fields: &[
        FieldSpec::required("date", "Date", FieldKind::Date),
        FieldSpec::required("shift", "Shift", FieldKind::Choice(SHIFTS)),
        FieldSpec::required("material_type", "Material Type", FieldKind::Text),
        FieldSpec::required("quantity", "Quantity (tons)", FieldKind::Decimal),
        FieldSpec::required("quality", "Quality Grade", FieldKind::Choice(QUALITY_GRADES)),
        FieldSpec::required("location", "Mining Location", FieldKind::Text),
        FieldSpec::optional("notes", "Notes", FieldKind::Text),
    ],
};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProductionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub date: String,
    pub shift: String,
    pub material_type: String,
    pub quantity: f64,
    pub quality: String,
    pub location: String,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProductionRecordFields {
    pub date: String,
    pub shift: String,
    pub material_type: String,
    pub quantity: f64,
    pub quality: String,
    pub location: String,
    pub notes: Option<String>,
}

impl Resource for ProductionRecord {
    type Fields = ProductionRecordFields;

    fn descriptor() -> &'static ResourceDescriptor {
        &PRODUCTION_RECORDS
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

    fn fields(&self) -> ProductionRecordFields {
        ProductionRecordFields {
            date: self.date.clone(),
            shift: self.shift.clone(),
            material_type: self.material_type.clone(),
            quantity: self.quantity,
            quality: self.quality.clone(),
            location: self.location.clone(),
            notes: self.notes.clone(),
        }
    }

    fn badge(&self) -> Badge {
        if self.quality == "grade-a" {
            Badge::Success
        } else {
            Badge::Secondary
        }
    }
}

pub fn total_tonnage(records: &[ProductionRecord]) -> f64 {
    records.iter().map(|r| r.quantity).sum()
}

pub fn tonnage_by_material(records: &[ProductionRecord]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for r in records {
        *totals.entry(r.material_type.clone()).or_insert(0.0) += r.quantity;
    }
    totals
}
