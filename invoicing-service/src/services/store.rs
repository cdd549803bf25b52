//! Storage seams for the invoice pipeline.
//!
//! Every operation is scoped by organization; there is no unscoped query.

use crate::models::{Customer, Invoice, OrgId, Product};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key for the organization is already taken.
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customer(
        &self,
        org_id: &OrgId,
        customer_id: &str,
    ) -> Result<Option<Customer>, StoreError>;

    /// Fails with `Duplicate` when the email is already registered for the organization.
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// First product whose name contains `name`, ignoring case.
    async fn find_product_by_name(
        &self,
        org_id: &OrgId,
        name: &str,
    ) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert-if-absent on `(organization_id, invoice_number)`.
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError>;

    async fn find_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, StoreError>;

    /// Newest first.
    async fn list_invoices(&self, org_id: &OrgId) -> Result<Vec<Invoice>, StoreError>;

    /// Returns whether an invoice was removed.
    async fn delete_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
