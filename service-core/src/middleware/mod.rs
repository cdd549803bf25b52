//! Axum middleware shared by every HTTP surface.

pub mod metrics;
pub mod tracing;

pub use self::metrics::metrics_middleware;
pub use self::tracing::{REQUEST_ID_HEADER, request_id_middleware};
