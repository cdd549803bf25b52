//! Request and response bodies for the invoice API.

pub mod lenient;

use crate::models::{Invoice, LineItem, PaymentMethod, PaymentStatus};
use crate::services::{InvoiceDraft, Totals};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "customer_id is required"))]
    pub customer_id: String,

    #[serde(default)]
    pub customer_name: Option<String>,

    #[validate(length(min = 1, message = "invoice_number is required"))]
    pub invoice_number: String,

    #[serde(deserialize_with = "lenient::required_decimal")]
    pub sub_total: Decimal,

    #[serde(deserialize_with = "lenient::required_decimal")]
    pub tax_amount: Decimal,

    #[serde(deserialize_with = "lenient::required_decimal")]
    pub total_amount: Decimal,

    /// Percentage off `sub_total + tax_amount`.
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub discount: Decimal,

    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    #[validate(length(min = 1, message = "At least one line item is required"))]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LineItemRequest {
    #[serde(default, deserialize_with = "lenient::serial")]
    pub sr_no: Option<u32>,

    #[serde(default)]
    pub product_name: String,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub qty: Decimal,

    /// Tax percentage.
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tax: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub unit_price: Decimal,

    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_price: Decimal,
}

impl From<LineItemRequest> for LineItem {
    fn from(req: LineItemRequest) -> Self {
        LineItem {
            sr_no: req.sr_no,
            product_name: req.product_name.trim().to_string(),
            unit: req.unit,
            qty: req.qty,
            tax: req.tax,
            unit_price: req.unit_price,
            total_price: req.total_price,
        }
    }
}

impl From<CreateInvoiceRequest> for InvoiceDraft {
    fn from(req: CreateInvoiceRequest) -> Self {
        InvoiceDraft {
            customer_id: req.customer_id.trim().to_string(),
            customer_name: req.customer_name,
            invoice_number: req.invoice_number.trim().to_string(),
            line_items: req.line_items.into_iter().map(LineItem::from).collect(),
            discount: req.discount,
            payment_method: req.payment_method,
            payment_status: req.payment_status,
            submitted: Totals {
                sub_total: req.sub_total,
                tax_amount: req.tax_amount,
                total_amount: req.total_amount,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sr_no: Option<u32>,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        Self {
            sr_no: item.sr_no,
            product_name: item.product_name,
            unit: item.unit,
            qty: item.qty,
            tax: item.tax,
            unit_price: item.unit_price,
            total_price: item.total_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub line_items: Vec<LineItemResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    pub sub_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            customer_id: invoice.customer_id,
            customer_name: invoice.customer_name,
            line_items: invoice
                .line_items
                .into_iter()
                .map(LineItemResponse::from)
                .collect(),
            sub_total: invoice.sub_total,
            tax_amount: invoice.tax_amount,
            discount: invoice.discount,
            total_amount: invoice.total_amount,
            payment_method: invoice.payment_method,
            payment_status: invoice.payment_status,
            created_at: invoice.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub count: usize,
}

impl From<Vec<Invoice>> for InvoiceListResponse {
    fn from(invoices: Vec<Invoice>) -> Self {
        let invoices: Vec<InvoiceResponse> =
            invoices.into_iter().map(InvoiceResponse::from).collect();
        Self {
            count: invoices.len(),
            invoices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_loosely_typed_line_items() {
        let body = json!({
            "customer_id": "c-1",
            "invoice_number": " INV-1 ",
            "sub_total": "25",
            "tax_amount": 2,
            "total_amount": 27.0,
            "payment_method": "Credit Card",
            "line_items": [
                { "sr_no": "1", "product_name": "Widget", "qty": "2", "unit_price": 10, "total_price": "20", "tax": 10 },
                { "product_name": "Gadget", "qty": 1, "unit_price": "5", "total_price": 5, "tax": null }
            ]
        });

        let request: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.payment_status, PaymentStatus::Pending);
        assert_eq!(request.payment_method, Some(PaymentMethod::CreditCard));

        let draft = InvoiceDraft::from(request);
        assert_eq!(draft.invoice_number, "INV-1");
        assert_eq!(draft.line_items[0].sr_no, Some(1));
        assert_eq!(draft.line_items[1].sr_no, None);
        assert_eq!(draft.line_items[1].tax, Decimal::ZERO);
        assert_eq!(draft.submitted.sub_total, Decimal::from(25));
    }

    #[test]
    fn empty_line_items_fail_validation() {
        let body = json!({
            "customer_id": "c-1",
            "invoice_number": "INV-1",
            "sub_total": 0,
            "tax_amount": 0,
            "total_amount": 0,
            "line_items": []
        });
        let request: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn response_amounts_are_json_numbers() {
        let item = LineItemResponse {
            sr_no: Some(1),
            product_name: "widget".to_string(),
            unit: None,
            qty: Decimal::from(2),
            tax: Decimal::from(10),
            unit_price: Decimal::new(1050, 2),
            total_price: Decimal::from(21),
        };
        let value = serde_json::to_value(item).unwrap();
        assert_eq!(value["unit_price"], json!(10.5));
        assert!(value.get("unit").is_none());
    }
}
