//! In-process store backed by `DashMap`, used for local runs and tests.
//!
//! Records are partitioned by organization first, so every lookup only ever
//! sees the calling tenant's data.

use super::store::{CustomerStore, InventoryStore, InvoiceStore, StoreError};
use crate::models::{Customer, Invoice, OrgId, Product};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use std::sync::Arc;

/// Per-organization partitions of records keyed by a natural key.
struct Partitioned<V> {
    tenants: DashMap<OrgId, DashMap<String, V>>,
}

impl<V> Default for Partitioned<V> {
    fn default() -> Self {
        Self {
            tenants: DashMap::new(),
        }
    }
}

impl<V: Clone> Partitioned<V> {
    fn tenant(&self, org_id: &OrgId) -> Option<Ref<'_, OrgId, DashMap<String, V>>> {
        self.tenants.get(org_id)
    }

    fn get(&self, org_id: &OrgId, key: &str) -> Option<V> {
        self.tenant(org_id)
            .and_then(|records| records.get(key).map(|v| v.value().clone()))
    }

    /// Insert unless `key` is taken; the check and the write happen under
    /// one shard lock.
    fn insert_new(&self, org_id: &OrgId, key: &str, value: V) -> bool {
        let records = self.tenants.entry(org_id.clone()).or_default().downgrade();
        let inserted = match records.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        };
        inserted
    }

    fn remove(&self, org_id: &OrgId, key: &str) -> bool {
        self.tenant(org_id)
            .is_some_and(|records| records.remove(key).is_some())
    }

    fn values(&self, org_id: &OrgId) -> Vec<V> {
        self.tenant(org_id)
            .map(|records| records.iter().map(|r| r.value().clone()).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    customers: Arc<Partitioned<Customer>>,
    customer_emails: Arc<Partitioned<String>>,
    products: Arc<Partitioned<Product>>,
    invoices: Arc<Partitioned<Invoice>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_customer(
        &self,
        org_id: &OrgId,
        customer_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        Ok(self.customers.get(org_id, customer_id))
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        let org_id = &customer.organization_id;
        if !self
            .customer_emails
            .insert_new(org_id, &customer.email, customer.id.clone())
        {
            return Err(StoreError::Duplicate(customer.email.clone()));
        }
        self.customers
            .insert_new(org_id, &customer.id, customer.clone());
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_product_by_name(
        &self,
        org_id: &OrgId,
        name: &str,
    ) -> Result<Option<Product>, StoreError> {
        let needle = name.to_lowercase();
        let Some(products) = self.products.tenant(org_id) else {
            return Ok(None);
        };
        let found = products
            .iter()
            .find(|entry| entry.key().contains(&needle))
            .map(|entry| entry.value().clone());
        Ok(found)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        if self.products.insert_new(
            &product.organization_id,
            &product.product_name,
            product.clone(),
        ) {
            Ok(())
        } else {
            Err(StoreError::Duplicate(product.product_name.clone()))
        }
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        if self.invoices.insert_new(
            &invoice.organization_id,
            &invoice.invoice_number,
            invoice.clone(),
        ) {
            Ok(())
        } else {
            Err(StoreError::Duplicate(invoice.invoice_number.clone()))
        }
    }

    async fn find_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, StoreError> {
        Ok(self.invoices.get(org_id, invoice_number))
    }

    async fn list_invoices(&self, org_id: &OrgId) -> Result<Vec<Invoice>, StoreError> {
        let mut invoices = self.invoices.values(org_id);
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    async fn delete_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.invoices.remove(org_id, invoice_number))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCustomer, NewProduct, PaymentStatus};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn invoice(org: &str, number: &str, age_minutes: i64) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            organization_id: OrgId::new(org),
            customer_id: "cust-1".to_string(),
            customer_name: None,
            invoice_number: number.to_string(),
            line_items: vec![],
            sub_total: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn insert_is_unique_per_organization() {
        let store = MemoryStore::new();
        store
            .insert_invoice(&invoice("org-a", "INV-1", 0))
            .await
            .unwrap();

        let dup = store.insert_invoice(&invoice("org-a", "INV-1", 0)).await;
        assert!(matches!(dup, Err(StoreError::Duplicate(n)) if n == "INV-1"));

        store
            .insert_invoice(&invoice("org-b", "INV-1", 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let store = MemoryStore::new();
        store
            .insert_invoice(&invoice("org-a", "INV-OLD", 30))
            .await
            .unwrap();
        store
            .insert_invoice(&invoice("org-a", "INV-NEW", 1))
            .await
            .unwrap();
        store
            .insert_invoice(&invoice("org-b", "INV-X", 0))
            .await
            .unwrap();

        let listed = store.list_invoices(&OrgId::new("org-a")).await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["INV-NEW", "INV-OLD"]);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryStore::new();
        let org = OrgId::new("org-a");
        store
            .insert_invoice(&invoice("org-a", "INV-1", 0))
            .await
            .unwrap();

        assert!(!store
            .delete_invoice(&OrgId::new("org-b"), "INV-1")
            .await
            .unwrap());
        assert!(store.delete_invoice(&org, "INV-1").await.unwrap());
        assert!(!store.delete_invoice(&org, "INV-1").await.unwrap());
    }

    #[tokio::test]
    async fn product_lookup_is_case_insensitive_substring() {
        let store = MemoryStore::new();
        let org = OrgId::new("org-a");
        let product = Product::new(
            org.clone(),
            NewProduct {
                product_name: "Basmati Rice".to_string(),
                category: "grains".to_string(),
                unit_of_measure: "kg".to_string(),
                tax_type: "GST".to_string(),
                cost_price: Decimal::ONE,
                sales_price: Decimal::TWO,
                ..Default::default()
            },
        )
        .unwrap();
        store.insert_product(&product).await.unwrap();

        assert!(store
            .find_product_by_name(&org, "RICE")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_product_by_name(&org, "basmati rice")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_product_by_name(&org, "wheat")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_product_by_name(&OrgId::new("org-b"), "rice")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn customer_email_is_unique_per_organization() {
        let store = MemoryStore::new();
        let org = OrgId::new("org-a");
        let input = NewCustomer {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Main St".to_string(),
        };

        let first = Customer::new(org.clone(), input.clone());
        store.insert_customer(&first).await.unwrap();
        assert!(store
            .find_customer(&org, &first.id)
            .await
            .unwrap()
            .is_some());

        let again = Customer::new(org, input);
        assert!(matches!(
            store.insert_customer(&again).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn product_lookup_only_sees_own_organization() {
        let store = MemoryStore::new();
        let product = |org: &str, name: &str| {
            Product::new(
                OrgId::new(org),
                NewProduct {
                    product_name: name.to_string(),
                    category: "grains".to_string(),
                    unit_of_measure: "kg".to_string(),
                    tax_type: "GST".to_string(),
                    cost_price: Decimal::ONE,
                    sales_price: Decimal::TWO,
                    ..Default::default()
                },
            )
            .unwrap()
        };
        store
            .insert_product(&product("org-b", "Rice Flour"))
            .await
            .unwrap();
        store
            .insert_product(&product("org-a", "Brown Rice"))
            .await
            .unwrap();

        let found = store
            .find_product_by_name(&OrgId::new("org-a"), "rice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.organization_id, OrgId::new("org-a"));
        assert_eq!(found.product_name, "brown rice");

        assert!(store
            .find_product_by_name(&OrgId::new("org-c"), "rice")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_product_by_name(&OrgId::new("org-a"), "flour")
            .await
            .unwrap()
            .is_none());
    }
}
