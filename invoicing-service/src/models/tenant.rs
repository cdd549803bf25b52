//! Tenant identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the organization that owns a record.
///
/// Every store query takes one of these; there is no way to read or delete an
/// invoice, customer or product without naming its organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
