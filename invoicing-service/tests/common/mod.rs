#![allow(dead_code)]

use invoicing_service::config::{
    InvoiceSettings, InvoicingConfig, MongoConfig, StorageBackend, StorageConfig,
};
use invoicing_service::models::{Customer, NewCustomer, NewProduct, OrgId, Product};
use invoicing_service::services::{CustomerStore, InventoryStore};
use invoicing_service::{AppState, Application};
use rust_decimal::Decimal;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub state: AppState,
    pub db: Option<mongodb::Database>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(InvoiceSettings::default()).await
    }

    pub async fn spawn_with(invoices: InvoiceSettings) -> Self {
        let storage = StorageConfig {
            backend: StorageBackend::Memory,
            mongodb: MongoConfig {
                uri: Secret::new(String::new()),
                database: "invoicing_test".to_string(),
            },
        };
        Self::spawn_on(storage, invoices, None).await
    }

    /// Run against MongoDB in a fresh database; see [`TestApp::cleanup`].
    pub async fn spawn_mongo() -> Self {
        let uri = std::env::var("TEST_MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = format!("invoicing_test_{}", uuid::Uuid::new_v4());

        let db = mongodb::Client::with_uri_str(&uri)
            .await
            .expect("Failed to connect to MongoDB")
            .database(&db_name);
        let storage = StorageConfig {
            backend: StorageBackend::Mongodb,
            mongodb: MongoConfig {
                uri: Secret::new(uri),
                database: db_name,
            },
        };
        Self::spawn_on(storage, InvoiceSettings::default(), Some(db)).await
    }

    async fn spawn_on(
        storage: StorageConfig,
        invoices: InvoiceSettings,
        db: Option<mongodb::Database>,
    ) -> Self {
        let config = InvoicingConfig {
            common: CoreConfig {
                port: 0,
                ..CoreConfig::default()
            },
            storage,
            invoices,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.http_port();
        let address = format!("http://127.0.0.1:{}", port);
        let state = app.state();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            state,
            db,
        }
    }

    /// Drop the per-test database created by [`TestApp::spawn_mongo`].
    pub async fn cleanup(&self) {
        if let Some(db) = &self.db {
            db.drop(None).await.expect("Failed to drop test database");
        }
    }

    /// Register a customer for `org` and return its id.
    pub async fn seed_customer(&self, org: &str, name: &str) -> String {
        let customer = Customer::new(
            OrgId::new(org),
            NewCustomer {
                name: name.to_string(),
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                phone: "555-0100".to_string(),
                address: "1 Main St".to_string(),
            },
        );
        self.state
            .stores
            .customers
            .insert_customer(&customer)
            .await
            .expect("Failed to seed customer");
        customer.id
    }

    pub async fn seed_product(&self, org: &str, name: &str) {
        let product = Product::new(
            OrgId::new(org),
            NewProduct {
                product_name: name.to_string(),
                category: "hardware".to_string(),
                stock_quantity: Decimal::from(100),
                unit_of_measure: "pcs".to_string(),
                cost_price: Decimal::from(4),
                sales_price: Decimal::from(10),
                tax_rate: Decimal::ZERO,
                tax_type: "GST".to_string(),
                ..Default::default()
            },
        )
        .expect("Invalid test product");
        self.state
            .stores
            .inventory
            .insert_product(&product)
            .await
            .expect("Failed to seed product");
    }

    /// An organization with one customer and the products used by [`invoice_body`].
    pub async fn seed_tenant(&self, org: &str) -> String {
        self.seed_product(org, "Widget").await;
        self.seed_product(org, "Gadget").await;
        self.seed_customer(org, "Asha Rao").await
    }

    pub async fn create_invoice(&self, org: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/invoices", self.address))
            .header("X-Org-ID", org)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_invoice(&self, org: &str, number: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/invoices/{}", self.address, number))
            .header("X-Org-ID", org)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn list_invoices(&self, org: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/invoices", self.address))
            .header("X-Org-ID", org)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete_invoice(&self, org: &str, number: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}/invoices/{}", self.address, number))
            .header("X-Org-ID", org)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Two items: 10 × 2 at 10% tax and 5 × 1 untaxed; 25.00 / 2.00 / 27.00.
pub fn invoice_body(customer_id: &str, invoice_number: &str) -> Value {
    json!({
        "customer_id": customer_id,
        "invoice_number": invoice_number,
        "sub_total": 25.0,
        "tax_amount": 2.0,
        "total_amount": 27.0,
        "discount": 0,
        "payment_method": "UPI",
        "payment_status": "Paid",
        "line_items": [
            { "sr_no": 1, "product_name": "widget", "unit": "pcs", "qty": 2, "tax": 10, "unit_price": 10, "total_price": 20 },
            { "sr_no": 2, "product_name": "Gadget", "unit": "pcs", "qty": 1, "tax": 0, "unit_price": 5, "total_price": 5 }
        ]
    })
}

pub async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Error body is not JSON");
    body["code"].as_str().unwrap_or_default().to_string()
}
