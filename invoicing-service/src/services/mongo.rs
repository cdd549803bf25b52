//! MongoDB-backed stores.

use super::metrics::DB_QUERY_DURATION;
use super::store::{CustomerStore, InventoryStore, InvoiceStore, StoreError};
use crate::models::{Customer, Invoice, OrgId, Product};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use tracing::instrument;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        options.app_name = Some("invoicing-service".to_string());

        let client = Client::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB");

        Ok(Self { db })
    }

    fn invoices(&self) -> Collection<Invoice> {
        self.db.collection("invoices")
    }

    fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    fn customers(&self) -> Collection<Customer> {
        self.db.collection("customers")
    }

    /// Create the indexes the stores rely on, including the unique keys that
    /// make inserts atomic duplicate checks.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for invoicing-service");

        let invoice_number_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "invoice_number": 1 })
            .options(
                IndexOptions::builder()
                    .name("org_invoice_number_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        let invoice_created_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("org_created_at_idx".to_string())
                    .build(),
            )
            .build();
        self.invoices()
            .create_indexes([invoice_number_index, invoice_created_index], None)
            .await?;

        let product_name_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "product_name": 1 })
            .options(
                IndexOptions::builder()
                    .name("org_product_name_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.products()
            .create_index(product_name_index, None)
            .await?;

        let customer_email_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1, "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("org_email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.customers()
            .create_index(customer_email_index, None)
            .await?;

        tracing::info!("MongoDB indexes created");
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY_CODE
    )
}

fn insert_error(err: mongodb::error::Error, key: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate(key.to_string())
    } else {
        StoreError::from(err)
    }
}

#[async_trait]
impl CustomerStore for MongoStore {
    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn find_customer(
        &self,
        org_id: &OrgId,
        customer_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_customer"])
            .start_timer();
        let customer = self
            .customers()
            .find_one(
                doc! { "_id": customer_id, "organization_id": org_id.as_str() },
                None,
            )
            .await?;
        timer.observe_duration();
        Ok(customer)
    }

    #[instrument(skip(self, customer), fields(org_id = %customer.organization_id))]
    async fn insert_customer(&self, customer: &Customer) -> Result<(), StoreError> {
        self.customers()
            .insert_one(customer, None)
            .await
            .map_err(|e| insert_error(e, &customer.email))?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MongoStore {
    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn find_product_by_name(
        &self,
        org_id: &OrgId,
        name: &str,
    ) -> Result<Option<Product>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_product_by_name"])
            .start_timer();
        let filter = doc! {
            "organization_id": org_id.as_str(),
            "product_name": { "$regex": regex::escape(name), "$options": "i" },
        };
        let product = self.products().find_one(filter, None).await?;
        timer.observe_duration();
        Ok(product)
    }

    #[instrument(skip(self, product), fields(org_id = %product.organization_id))]
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products()
            .insert_one(product, None)
            .await
            .map_err(|e| insert_error(e, &product.product_name))?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for MongoStore {
    #[instrument(
        skip(self, invoice),
        fields(org_id = %invoice.organization_id, invoice_number = %invoice.invoice_number)
    )]
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();
        let result = self.invoices().insert_one(invoice, None).await;
        timer.observe_duration();

        result.map_err(|e| insert_error(e, &invoice.invoice_number))?;
        Ok(())
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn find_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_invoice"])
            .start_timer();
        let invoice = self
            .invoices()
            .find_one(
                doc! { "organization_id": org_id.as_str(), "invoice_number": invoice_number },
                None,
            )
            .await?;
        timer.observe_duration();
        Ok(invoice)
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn list_invoices(&self, org_id: &OrgId) -> Result<Vec<Invoice>, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let invoices: Vec<Invoice> = self
            .invoices()
            .find(doc! { "organization_id": org_id.as_str() }, options)
            .await?
            .try_collect()
            .await?;
        timer.observe_duration();
        Ok(invoices)
    }

    #[instrument(skip(self), fields(org_id = %org_id))]
    async fn delete_invoice(
        &self,
        org_id: &OrgId,
        invoice_number: &str,
    ) -> Result<bool, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();
        let result = self
            .invoices()
            .delete_one(
                doc! { "organization_id": org_id.as_str(), "invoice_number": invoice_number },
                None,
            )
            .await?;
        timer.observe_duration();
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
