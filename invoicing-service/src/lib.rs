//! Multi-tenant invoicing service.
//!
//! Invoices are validated against the organization's customers and
//! inventory, their totals recomputed server side, and committed only when
//! the client's figures agree within a cent.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application, Stores};
