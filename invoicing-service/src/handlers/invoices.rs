//! Invoice handlers. Every operation is scoped to the caller's organization.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    dtos::{CreateInvoiceRequest, InvoiceListResponse, InvoiceResponse},
    middleware::TenantContext,
    services::{InvoiceDraft, InvoiceError},
    AppState,
};

pub async fn create_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): WithRejection<Json<CreateInvoiceRequest>, InvoiceError>,
) -> Result<(StatusCode, Json<InvoiceResponse>), InvoiceError> {
    payload.validate()?;

    tracing::info!(
        org_id = %tenant.org_id,
        invoice_number = %payload.invoice_number,
        line_items = payload.line_items.len(),
        "Creating invoice"
    );

    let invoice = state
        .service
        .create_invoice(&tenant.org_id, InvoiceDraft::from(payload))
        .await?;

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(invoice))))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<InvoiceListResponse>, InvoiceError> {
    let invoices = state.service.list_invoices(&tenant.org_id).await?;
    Ok(Json(InvoiceListResponse::from(invoices)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(invoice_number): Path<String>,
) -> Result<Json<InvoiceResponse>, InvoiceError> {
    let invoice = state
        .service
        .get_invoice(&tenant.org_id, &invoice_number)
        .await?;
    Ok(Json(InvoiceResponse::from(invoice)))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(invoice_number): Path<String>,
) -> Result<StatusCode, InvoiceError> {
    tracing::info!(
        org_id = %tenant.org_id,
        invoice_number = %invoice_number,
        "Deleting invoice"
    );

    state
        .service
        .remove_invoice(&tenant.org_id, &invoice_number)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
