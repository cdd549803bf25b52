//! service-core: Shared infrastructure for the invoicing workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
