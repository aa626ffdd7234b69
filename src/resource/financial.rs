use serde::{Deserialize, Serialize};

use crate::resource::schema::{FieldKind, FieldSpec, ResourceDescriptor};
use crate::resource::{Badge, Resource};

pub const TRANSACTION_TYPES: &[&str] = &["revenue", "expense", "asset", "liability"];

pub static FINANCIAL_TRANSACTIONS: ResourceDescriptor = ResourceDescriptor {
    table: "financial_transactions",
    singular: "financial transaction",
    plural: "financial transactions",
    order_by: "transaction_date DESC, created_at DESC",
    fields: &[
        FieldSpec::required("type", "Transaction Type", FieldKind::Choice(TRANSACTION_TYPES)),
        FieldSpec::required("category", "Category", FieldKind::Text),
        FieldSpec::required("amount", "Amount", FieldKind::Decimal),
        FieldSpec::required("description", "Description", FieldKind::Text),
        FieldSpec::required("transaction_date", "Transaction Date", FieldKind::Date),
        FieldSpec::optional("reference_type", "Reference Type", FieldKind::Text),
        FieldSpec::optional("reference_id", "Reference", FieldKind::Text),
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Revenue,
    Expense,
    Asset,
    Liability,
}

impl TransactionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FinancialTransaction {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub transaction_date: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FinancialTransactionFields {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub transaction_date: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
}

impl FinancialTransaction {
    pub fn transaction_type(&self) -> Option<TransactionType> {
        TransactionType::parse(&self.kind)
    }
}

impl Resource for FinancialTransaction {
    type Fields = FinancialTransactionFields;

    fn descriptor() -> &'static ResourceDescriptor {
        &FINANCIAL_TRANSACTIONS
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

    fn fields(&self) -> FinancialTransactionFields {
        FinancialTransactionFields {
            kind: self.kind.clone(),
            category: self.category.clone(),
            amount: self.amount,
            description: self.description.clone(),
            transaction_date: self.transaction_date.clone(),
            reference_type: self.reference_type.clone(),
            reference_id: self.reference_id.clone(),
        }
    }

    fn badge(&self) -> Badge {
        match self.transaction_type() {
            Some(TransactionType::Revenue) => Badge::Default,
            Some(TransactionType::Expense) => Badge::Destructive,
            Some(TransactionType::Asset) => Badge::Secondary,
            Some(TransactionType::Liability) => Badge::Outline,
            None => Badge::Secondary,
        }
    }
}

/// Sum of amounts per transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub revenue: f64,
    pub expense: f64,
    pub asset: f64,
    pub liability: f64,
}

impl Totals {
    pub fn of(transactions: &[FinancialTransaction]) -> Self {
        let mut totals = Totals::default();
        for t in transactions {
            let bucket = match t.transaction_type() {
                Some(TransactionType::Revenue) => &mut totals.revenue,
                Some(TransactionType::Expense) => &mut totals.expense,
                Some(TransactionType::Asset) => &mut totals.asset,
                Some(TransactionType::Liability) => &mut totals.liability,
                None => continue,
            };
            *bucket += t.amount;
        }
        totals
    }

    /// Revenue less expenses. Assets and liabilities do not count.
    pub fn net_profit(&self) -> f64 {
        self.revenue - self.expense
    }
}
