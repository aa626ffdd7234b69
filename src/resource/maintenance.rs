use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::resource::schema::{FieldKind, FieldSpec, ResourceDescriptor, DATE_FORMAT};
use crate::resource::{Badge, Resource};

pub const MAINTENANCE_STATUSES: &[&str] = &["scheduled", "in-progress", "completed", "cancelled"];

pub static MAINTENANCE_RECORDS: ResourceDescriptor = ResourceDescriptor {
    table: "maintenance_records",
    singular: "maintenance record",
    plural: "maintenance records",
    order_by: "scheduled_date DESC, created_at DESC",
    fields: &[
        FieldSpec::required("equipment_id", "Equipment", FieldKind::Text),
        FieldSpec::required("type", "Maintenance Type", FieldKind::Text),
        FieldSpec::required("description", "Description", FieldKind::Text),
        FieldSpec::required("scheduled_date", "Scheduled Date", FieldKind::Date),
        FieldSpec::optional("completed_date", "Completed Date", FieldKind::Date),
        FieldSpec::optional("cost", "Cost", FieldKind::Decimal),
        FieldSpec::required("status", "Status", FieldKind::Choice(MAINTENANCE_STATUSES))
            .with_default("scheduled"),
    ],
};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MaintenanceRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub equipment_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub scheduled_date: String,
    pub completed_date: Option<String>,
    pub cost: Option<f64>,
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MaintenanceRecordFields {
    pub equipment_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub scheduled_date: String,
    pub completed_date: Option<String>,
    pub cost: Option<f64>,
    pub status: String,
}

impl MaintenanceRecord {
    pub fn is_open(&self) -> bool {
        self.status == "scheduled" || self.status == "in-progress"
    }

    /// Still open with a scheduled date before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open()
            && NaiveDate::parse_from_str(&self.scheduled_date, DATE_FORMAT)
                .map(|d| d < today)
                .unwrap_or(false)
    }
}

impl Resource for MaintenanceRecord {
    type Fields = MaintenanceRecordFields;

    fn descriptor() -> &'static ResourceDescriptor {
        &MAINTENANCE_RECORDS
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

    fn fields(&self) -> MaintenanceRecordFields {
        MaintenanceRecordFields {
            equipment_id: self.equipment_id.clone(),
            kind: self.kind.clone(),
            description: self.description.clone(),
            scheduled_date: self.scheduled_date.clone(),
            completed_date: self.completed_date.clone(),
            cost: self.cost,
            status: self.status.clone(),
        }
    }

    fn badge(&self) -> Badge {
        match self.status.as_str() {
            "completed" => Badge::Success,
            "in-progress" => Badge::Default,
            "cancelled" => Badge::Outline,
            _ => Badge::Secondary,
        }
    }
}

pub fn overdue(records: &[MaintenanceRecord], today: NaiveDate) -> Vec<&MaintenanceRecord> {
    records.iter().filter(|r| r.is_overdue(today)).collect()
}

pub fn total_cost(records: &[MaintenanceRecord]) -> f64 {
    records.iter().filter_map(|r| r.cost).sum()
}
