//! Inventory product model for invoicing-service.
//!
//! Pricing fields such as `selling_price` are derived from the entered
//! prices; they are recomputed whenever a product is built from input and
//! are never accepted from callers.

use super::OrgId;
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("Conversion rate is required for alternate unit")]
    ConversionRateRequired,

    #[error("Derived price for {0} is out of range")]
    Overflow(&'static str),
}

/// Inventory item owned by one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: OrgId,
    /// Stored lower-cased; unique per organization.
    pub product_name: String,
    pub category: String,
    pub stock_quantity: Decimal,
    pub unit_of_measure: String,
    pub alternate_unit: Option<String>,
    /// `1 unit_of_measure = conversion_rate alternate_unit`
    pub conversion_rate: Option<Decimal>,
    pub cost_price: Decimal,
    pub sales_price: Decimal,
    pub tax_rate: Decimal,
    pub tax_type: String,
    pub discount: Decimal,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
    pub manufacturer: Option<String>,
    pub reorder_quantity: Option<Decimal>,
    pub description: Option<String>,
    pub total_stock_value: Decimal,
    pub discounted_price: Decimal,
    pub selling_price: Decimal,
    pub alternate_unit_cost: Option<Decimal>,
    pub alternate_unit_sales_price: Option<Decimal>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Input for adding a product to inventory.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub product_name: String,
    pub category: String,
    pub stock_quantity: Decimal,
    pub unit_of_measure: String,
    pub alternate_unit: Option<String>,
    pub conversion_rate: Option<Decimal>,
    pub cost_price: Decimal,
    pub sales_price: Decimal,
    pub tax_rate: Decimal,
    pub tax_type: String,
    pub discount: Decimal,
    pub supplier: Option<String>,
    pub batch_number: Option<String>,
    pub manufacturer: Option<String>,
    pub reorder_quantity: Option<Decimal>,
    pub description: Option<String>,
}

/// Prices derived from the entered cost/sales figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DerivedPricing {
    total_stock_value: Decimal,
    discounted_price: Decimal,
    selling_price: Decimal,
    alternate_unit_cost: Option<Decimal>,
    alternate_unit_sales_price: Option<Decimal>,
}

impl Product {
    /// Validate the input and build a product with its derived prices.
    pub fn new(organization_id: OrgId, input: NewProduct) -> Result<Self, ProductError> {
        let product_name = required(&input.product_name, "productName")?.to_lowercase();
        let category = required(&input.category, "category")?.to_lowercase();
        let unit_of_measure = required(&input.unit_of_measure, "unitOfMeasure")?.to_string();
        let tax_type = required(&input.tax_type, "tax_type")?.to_string();

        if input.sales_price <= Decimal::ZERO {
            return Err(ProductError::NotPositive("sales_price"));
        }
        if input.cost_price <= Decimal::ZERO {
            return Err(ProductError::NotPositive("cost_price"));
        }
        if input.stock_quantity < Decimal::ZERO {
            return Err(ProductError::Negative("stock_quantity"));
        }
        if input.tax_rate < Decimal::ZERO {
            return Err(ProductError::Negative("tax_rate"));
        }

        let alternate_unit = input
            .alternate_unit
            .as_deref()
            .map(str::trim)
            .filter(|unit| !unit.is_empty())
            .map(str::to_string);

        let pricing = derive_pricing(&input, alternate_unit.is_some())?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            organization_id,
            product_name,
            category,
            stock_quantity: input.stock_quantity,
            unit_of_measure,
            alternate_unit,
            conversion_rate: input.conversion_rate,
            cost_price: input.cost_price,
            sales_price: input.sales_price,
            tax_rate: input.tax_rate,
            tax_type,
            discount: input.discount,
            supplier: input.supplier,
            batch_number: input.batch_number,
            manufacturer: input.manufacturer,
            reorder_quantity: input.reorder_quantity,
            description: input.description,
            total_stock_value: pricing.total_stock_value,
            discounted_price: pricing.discounted_price,
            selling_price: pricing.selling_price,
            alternate_unit_cost: pricing.alternate_unit_cost,
            alternate_unit_sales_price: pricing.alternate_unit_sales_price,
            created_at: Utc::now(),
        })
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ProductError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProductError::MissingField(field));
    }
    Ok(trimmed)
}

fn percent_of(
    value: Decimal,
    percent: Decimal,
    field: &'static str,
) -> Result<Decimal, ProductError> {
    value
        .checked_mul(percent)
        .and_then(|v| v.checked_div(HUNDRED))
        .ok_or(ProductError::Overflow(field))
}

fn derive_pricing(
    input: &NewProduct,
    has_alternate_unit: bool,
) -> Result<DerivedPricing, ProductError> {
    let total_stock_value = input
        .stock_quantity
        .checked_mul(input.cost_price)
        .ok_or(ProductError::Overflow("total_stock_value"))?;

    let (discounted_price, selling_price) = if input.discount > Decimal::ZERO {
        let discounted =
            input.sales_price - percent_of(input.sales_price, input.discount, "discounted_price")?;
        let selling = discounted
            .checked_add(percent_of(discounted, input.tax_rate, "selling_price")?)
            .ok_or(ProductError::Overflow("selling_price"))?;
        (discounted, selling)
    } else {
        (Decimal::ZERO, input.sales_price)
    };

    let (alternate_unit_cost, alternate_unit_sales_price) = if has_alternate_unit {
        let rate = input
            .conversion_rate
            .filter(|rate| *rate >= Decimal::ZERO)
            .ok_or(ProductError::ConversionRateRequired)?;
        if rate.is_zero() {
            // A zero rate is accepted but yields no per-alternate-unit prices.
            (None, None)
        } else {
            (
                input.cost_price.checked_div(rate),
                input.sales_price.checked_div(rate),
            )
        }
    } else {
        (None, None)
    };

    Ok(DerivedPricing {
        total_stock_value,
        discounted_price,
        selling_price,
        alternate_unit_cost,
        alternate_unit_sales_price,
    })
}
