//! Domain models for invoicing-service.

mod customer;
mod invoice;
mod line_item;
mod product;
mod tenant;

pub use customer::{Customer, NewCustomer};
pub use invoice::{Invoice, PaymentMethod, PaymentStatus};
pub use line_item::LineItem;
pub use product::{NewProduct, Product, ProductError};
pub use tenant::OrgId;
