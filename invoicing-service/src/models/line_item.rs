//! Line item model for invoicing-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product row embedded in an invoice.
///
/// `product_name` is the free text captured at invoice time, not a live
/// reference to an inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sr_no: Option<u32>,
    pub product_name: String,
    pub unit: Option<String>,
    pub qty: Decimal,
    /// Tax percentage, e.g. `18` for 18%.
    pub tax: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}
