use super::store::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use service_core::error::ErrorResponse;
use thiserror::Error;

/// Every way an invoice operation can be refused.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Customer {0} not found")]
    CustomerNotFound(String),

    #[error("Invoice number {0} already exists")]
    DuplicateInvoiceNumber(String),

    #[error("Line item total does not match unit price times quantity for product {product}")]
    ItemArithmeticMismatch { product: String },

    #[error("Product {product} not found in inventory")]
    ProductNotFound { product: String },

    #[error("Submitted {field} does not match the computed value")]
    TotalsMismatch { field: &'static str },

    #[error("{0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
}

impl InvoiceError {
    pub fn code(&self) -> &'static str {
        match self {
            InvoiceError::Validation(_) => "VALIDATION_ERROR",
            InvoiceError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            InvoiceError::DuplicateInvoiceNumber(_) => "DUPLICATE_INVOICE_NUMBER",
            InvoiceError::ItemArithmeticMismatch { .. } => "ITEM_ARITHMETIC_MISMATCH",
            InvoiceError::ProductNotFound { .. } => "PRODUCT_NOT_FOUND",
            InvoiceError::TotalsMismatch { .. } => "TOTALS_MISMATCH",
            InvoiceError::NotFound(_) => "NOT_FOUND",
            InvoiceError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            InvoiceError::Validation(_)
            | InvoiceError::ItemArithmeticMismatch { .. }
            | InvoiceError::ProductNotFound { .. }
            | InvoiceError::TotalsMismatch { .. } => StatusCode::BAD_REQUEST,
            InvoiceError::CustomerNotFound(_) | InvoiceError::NotFound(_) => StatusCode::NOT_FOUND,
            InvoiceError::DuplicateInvoiceNumber(_) => StatusCode::CONFLICT,
            InvoiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for InvoiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => InvoiceError::DuplicateInvoiceNumber(key),
            StoreError::Backend(e) => InvoiceError::Storage(e),
        }
    }
}

impl From<validator::ValidationErrors> for InvoiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        InvoiceError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for InvoiceError {
    fn from(rejection: JsonRejection) -> Self {
        InvoiceError::Validation(rejection.body_text())
    }
}

impl IntoResponse for InvoiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match self {
            InvoiceError::Storage(err) => {
                tracing::error!(error = %err, "Invoice storage failure");
                ErrorResponse::new(code, "Storage error")
            }
            other => ErrorResponse::new(code, other.to_string()),
        };

        body.into_response_with(status)
    }
}
