//! The invoice pipeline and lifecycle operations.

use super::error::InvoiceError;
use super::metrics::{
    INVOICES_CREATED_TOTAL, INVOICES_DELETED_TOTAL, INVOICE_AMOUNT_TOTAL, INVOICE_REJECTIONS_TOTAL,
};
use super::pricing::{aggregate, check_line_item, reconcile, Totals};
use super::store::{CustomerStore, InventoryStore, InvoiceStore};
use crate::config::InvoiceSettings;
use crate::models::{Invoice, LineItem, OrgId, PaymentMethod, PaymentStatus};
use chrono::Utc;
use futures::future::FutureExt;
use futures::stream::{self, StreamExt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const PRODUCT_LOOKUP_CONCURRENCY: usize = 8;

/// A creation request after transport decoding, before any checks.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub invoice_number: String,
    pub line_items: Vec<LineItem>,
    /// Percentage of `sub_total + tax_amount`.
    pub discount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    /// Totals as computed by the client.
    pub submitted: Totals,
}

#[derive(Clone)]
pub struct InvoiceService {
    customers: Arc<dyn CustomerStore>,
    inventory: Arc<dyn InventoryStore>,
    invoices: Arc<dyn InvoiceStore>,
    settings: InvoiceSettings,
}

impl InvoiceService {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        inventory: Arc<dyn InventoryStore>,
        invoices: Arc<dyn InvoiceStore>,
        settings: InvoiceSettings,
    ) -> Self {
        Self {
            customers,
            inventory,
            invoices,
            settings,
        }
    }

    /// Validate a draft against the customer, inventory and its own totals,
    /// then commit it. Nothing is written unless every check passes.
    #[instrument(
        skip(self, draft),
        fields(org_id = %org_id, invoice_number = %draft.invoice_number)
    )]
    pub async fn create_invoice(
        &self,
        org_id: &OrgId,
        draft: InvoiceDraft,
    ) -> Result<Invoice, InvoiceError> {
        self.validate_and_commit(org_id, draft)
            .await
            .inspect_err(|e| {
                warn!(code = e.code(), error = %e, "Invoice rejected");
                INVOICE_REJECTIONS_TOTAL
                    .with_label_values(&[e.code()])
                    .inc();
            })
    }

    async fn validate_and_commit(
        &self,
        org_id: &OrgId,
        draft: InvoiceDraft,
    ) -> Result<Invoice, InvoiceError> {
        check_shape(&draft)?;

        let customer = self
            .customers
            .find_customer(org_id, &draft.customer_id)
            .await?
            .ok_or_else(|| InvoiceError::CustomerNotFound(draft.customer_id.clone()))?;

        for item in &draft.line_items {
            check_line_item(item)?;
        }

        let computed = aggregate(&draft.line_items, draft.discount)?;
        reconcile(&computed, &draft.submitted)?;

        self.ensure_products_exist(org_id, &draft.line_items)
            .await?;

        let customer_name = draft
            .customer_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(customer.name);

        let invoice = Invoice {
            id: Uuid::new_v4(),
            organization_id: org_id.clone(),
            customer_id: draft.customer_id,
            customer_name: Some(customer_name),
            invoice_number: draft.invoice_number,
            line_items: draft.line_items,
            sub_total: computed.sub_total,
            tax_amount: computed.tax_amount,
            discount: draft.discount,
            total_amount: computed.total_amount,
            payment_method: draft.payment_method,
            payment_status: draft.payment_status,
            created_at: Utc::now(),
        };

        self.invoices.insert_invoice(&invoice).await?;

        INVOICES_CREATED_TOTAL
            .with_label_values(&[invoice.payment_status.as_str()])
            .inc();
        INVOICE_AMOUNT_TOTAL
            .with_label_values(&[invoice.payment_method.map_or("unspecified", |m| m.as_str())])
            .inc_by(invoice.total_amount.to_f64().unwrap_or_default().max(0.0));

        info!(
            invoice_id = %invoice.id,
            total_amount = %invoice.total_amount,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// At most `PRODUCT_LOOKUP_CONCURRENCY` lookups are in flight. Results are
    /// consumed in submission order and the first missing item ends the scan.
    async fn ensure_products_exist(
        &self,
        org_id: &OrgId,
        items: &[LineItem],
    ) -> Result<(), InvoiceError> {
        let lookups: Vec<_> = items
            .iter()
            .map(|item| {
                async move {
                    match self
                        .inventory
                        .find_product_by_name(org_id, &item.product_name)
                        .await
                    {
                        Ok(Some(_)) => Ok(()),
                        Ok(None) => Err(InvoiceError::ProductNotFound {
                            product: item.product_name.clone(),
                        }),
                        Err(e) => Err(InvoiceError::from(e)),
                    }
                }
                .boxed()
            })
            .collect();
        let mut lookups = stream::iter(lookups).buffered(PRODUCT_LOOKUP_CONCURRENCY);

        while let Some(found) = lookups.next().await {
            found?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    pub async fn list_invoices(&self, org_id: &OrgId) -> Result<Vec<Invoice>, InvoiceError> {
        let invoices = self.invoices.list_invoices(org_id).await?;
        if invoices.is_empty() && self.settings.empty_list_not_found {
            return Err(InvoiceError::NotFound("No invoices found".to_string()));
        }
        Ok(invoices)
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    pub async fn get_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<Invoice, InvoiceError> {
        self.invoices
            .find_invoice(org_id, invoice_number)
            .await?
            .ok_or_else(|| not_found(invoice_number))
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    pub async fn remove_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<(), InvoiceError> {
        if !self.invoices.delete_invoice(org_id, invoice_number).await? {
            return Err(not_found(invoice_number));
        }
        INVOICES_DELETED_TOTAL.inc();
        info!(invoice_number = %invoice_number, "Invoice deleted");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), InvoiceError> {
        Ok(self.invoices.ping().await?)
    }
}

fn not_found(invoice_number: &str) -> InvoiceError {
    InvoiceError::NotFound(format!("Invoice {} not found", invoice_number))
}

fn check_shape(draft: &InvoiceDraft) -> Result<(), InvoiceError> {
    let invalid = |msg: &str| Err(InvoiceError::Validation(msg.to_string()));

    if draft.customer_id.trim().is_empty() {
        return invalid("customer_id is required");
    }
    if draft.invoice_number.trim().is_empty() {
        return invalid("invoice_number is required");
    }
    if draft.line_items.is_empty() {
        return invalid("line_items must contain at least one item");
    }
    if draft
        .line_items
        .iter()
        .any(|item| item.product_name.trim().is_empty())
    {
        return invalid("product_name is required for every line item");
    }
    if draft.discount < Decimal::ZERO || draft.discount > Decimal::ONE_HUNDRED {
        return invalid("discount must be between 0 and 100");
    }
    Ok(())
}
