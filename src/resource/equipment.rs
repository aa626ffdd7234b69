use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::schema::{FieldKind, FieldSpec, ResourceDescriptor};
use crate::resource::{Badge, Resource};

pub const STATUSES: &[&str] = &["operational", "maintenance", "down", "retired"];

pub static EQUIPMENT: ResourceDescriptor = ResourceDescriptor {
    table: "equipment",
    singular: "equipment",
    plural: "equipment",
    order_by: "name ASC",
    fields: &[
        FieldSpec::required("name", "Equipment Name", FieldKind::Text),
        FieldSpec::required("type", "Equipment Type", FieldKind::Text),
        FieldSpec::optional("model", "Model", FieldKind::Text),
        FieldSpec::optional("serial_number", "Serial Number", FieldKind::Text),
        FieldSpec::required("status", "Status", FieldKind::Choice(STATUSES)).with_default("operational"),
        FieldSpec::optional("location", "Location", FieldKind::Text),
        FieldSpec::optional("purchase_date", "Purchase Date", FieldKind::Date),
        FieldSpec::optional("last_maintenance", "Last Maintenance", FieldKind::Date),
        FieldSpec::optional("next_maintenance", "Next Maintenance", FieldKind::Date),
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EquipmentStatus {
    Operational,
    Maintenance,
    Down,
    Retired,
}

impl EquipmentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "operational" => Some(Self::Operational),
            "maintenance" => Some(Self::Maintenance),
            "down" => Some(Self::Down),
            "retired" => Some(Self::Retired),
            _ => None,
        }
    }

    pub fn badge(self) -> Badge {
        match self {
            Self::Operational => Badge::Default,
            Self::Maintenance => Badge::Secondary,
            Self::Down => Badge::Destructive,
            Self::Retired => Badge::Outline,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Equipment {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: String,
    pub location: Option<String>,
    pub purchase_date: Option<String>,
    pub last_maintenance: Option<String>,
    pub next_maintenance: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EquipmentFields {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: String,
    pub location: Option<String>,
    pub purchase_date: Option<String>,
    pub last_maintenance: Option<String>,
    pub next_maintenance: Option<String>,
}

impl Equipment {
    pub fn status(&self) -> Option<EquipmentStatus> {
        EquipmentStatus::parse(&self.status)
    }
}

impl Resource for Equipment {
    type Fields = EquipmentFields;

    fn descriptor() -> &'static ResourceDescriptor {
        &EQUIPMENT
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

    fn fields(&self) -> EquipmentFields {
        EquipmentFields {
            name: self.name.clone(),
            kind: self.kind.clone(),
            model: self.model.clone(),
            serial_number: self.serial_number.clone(),
            status: self.status.clone(),
            location: self.location.clone(),
            purchase_date: self.purchase_date.clone(),
            last_maintenance: self.last_maintenance.clone(),
            next_maintenance: self.next_maintenance.clone(),
        }
    }

    fn badge(&self) -> Badge {
        self.status().map(EquipmentStatus::badge).unwrap_or(Badge::Secondary)
    }
}

/// Number of units in each status. Rows with an unknown status are skipped.
pub fn status_counts(equipment: &[Equipment]) -> BTreeMap<EquipmentStatus, usize> {
    let mut counts = BTreeMap::new();
    for status in equipment.iter().filter_map(Equipment::status) {
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}
