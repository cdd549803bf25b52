//! Money arithmetic for invoices: tolerance comparison, per-item checks,
//! aggregation and reconciliation against client-submitted totals.

use super::error::InvoiceError;
use crate::models::LineItem;
use rust_decimal::{Decimal, RoundingStrategy};

/// Absolute tolerance for money comparisons (0.01).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// True iff `|a - b| < 0.01`.
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

/// Round to cents, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn overflow() -> InvoiceError {
    InvoiceError::Validation("Invoice amounts are out of range".to_string())
}

fn line_amount(item: &LineItem) -> Result<Decimal, InvoiceError> {
    item.unit_price.checked_mul(item.qty).ok_or_else(overflow)
}

/// `unit_price × qty` must be within tolerance of the submitted line total.
pub fn check_line_item(item: &LineItem) -> Result<(), InvoiceError> {
    let expected = line_amount(item)?;
    if within_tolerance(expected, item.total_price) {
        Ok(())
    } else {
        Err(InvoiceError::ItemArithmeticMismatch {
            product: item.product_name.clone(),
        })
    }
}

/// Subtotal, tax and grand total of an invoice, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl Totals {
    pub fn rounded(self) -> Self {
        Self {
            sub_total: round_money(self.sub_total),
            tax_amount: round_money(self.tax_amount),
            total_amount: round_money(self.total_amount),
        }
    }
}

/// Server-side totals. `discount` is a percentage applied to `sub_total + tax`.
pub fn aggregate(items: &[LineItem], discount: Decimal) -> Result<Totals, InvoiceError> {
    let mut sub_total = Decimal::ZERO;
    let mut tax_amount = Decimal::ZERO;

    for item in items {
        let amount = line_amount(item)?;
        let tax = amount
            .checked_mul(item.tax)
            .and_then(|t| t.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(overflow)?;
        sub_total = sub_total.checked_add(amount).ok_or_else(overflow)?;
        tax_amount = tax_amount.checked_add(tax).ok_or_else(overflow)?;
    }

    let gross = sub_total.checked_add(tax_amount).ok_or_else(overflow)?;
    let reduction = gross
        .checked_mul(discount)
        .and_then(|d| d.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(overflow)?;

    Ok(Totals {
        sub_total,
        tax_amount,
        total_amount: gross - reduction,
    }
    .rounded())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalField {
    SubTotal,
    TaxAmount,
    TotalAmount,
}

impl TotalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TotalField::SubTotal => "sub_total",
            TotalField::TaxAmount => "tax_amount",
            TotalField::TotalAmount => "total_amount",
        }
    }
}

/// First field (sub_total, tax_amount, total_amount) that falls outside tolerance.
pub fn first_disagreement(computed: &Totals, submitted: &Totals) -> Option<TotalField> {
    [
        (
            TotalField::SubTotal,
            computed.sub_total,
            submitted.sub_total,
        ),
        (
            TotalField::TaxAmount,
            computed.tax_amount,
            submitted.tax_amount,
        ),
        (
            TotalField::TotalAmount,
            computed.total_amount,
            submitted.total_amount,
        ),
    ]
    .into_iter()
    .find(|(_, ours, theirs)| !within_tolerance(*ours, *theirs))
    .map(|(field, _, _)| field)
}

pub fn totals_agree(computed: &Totals, submitted: &Totals) -> bool {
    first_disagreement(computed, submitted).is_none()
}

pub fn totals_disagree(computed: &Totals, submitted: &Totals) -> bool {
    !totals_agree(computed, submitted)
}

/// Accept the submission only when all three totals agree after rounding.
pub fn reconcile(computed: &Totals, submitted: &Totals) -> Result<(), InvoiceError> {
    match first_disagreement(computed, &submitted.rounded()) {
        None => Ok(()),
        Some(field) => Err(InvoiceError::TotalsMismatch {
            field: field.as_str(),
        }),
    }
}
