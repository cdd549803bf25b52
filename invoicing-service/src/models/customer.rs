//! Customer model for invoicing-service.

use super::OrgId;
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer document. Unique per organization by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: OrgId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Input for registering a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl Customer {
    pub fn new(organization_id: OrgId, input: NewCustomer) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            organization_id,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone.trim().to_string(),
            address: input.address.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}
