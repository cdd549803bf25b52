//! Invoice model for invoicing-service.

use super::{LineItem, OrgId};
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the customer paid (or will pay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Cash")]
    Cash,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }
}

/// Payment status recorded at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Cancelled => "Cancelled",
        }
    }
}

/// A committed invoice.
///
/// Totals are the server-computed values, never the ones the client sent.
/// Invoices are write-once: they can be read or deleted but not updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub organization_id: OrgId,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub invoice_number: String,
    pub line_items: Vec<LineItem>,
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    /// Discount percentage applied to subtotal + tax.
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}
