//! Services module for invoicing-service.

pub mod error;
pub mod invoicing;
pub mod memory;
pub mod metrics;
pub mod mongo;
pub mod pricing;
pub mod store;

pub use error::InvoiceError;
pub use invoicing::{InvoiceDraft, InvoiceService};
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use mongo::MongoStore;
pub use pricing::Totals;
pub use store::{CustomerStore, InventoryStore, InvoiceStore, StoreError};
