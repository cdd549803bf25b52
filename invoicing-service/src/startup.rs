//! Application startup and lifecycle management.

use crate::config::{InvoicingConfig, StorageBackend, StorageConfig};
use crate::handlers;
use crate::services::{
    init_metrics, CustomerStore, InventoryStore, InvoiceService, InvoiceStore, MemoryStore,
    MongoStore,
};
use axum::middleware::from_fn;
use axum::{routing::get, Router};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// The three collaborators the invoice pipeline reads from and writes to.
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn CustomerStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub invoices: Arc<dyn InvoiceStore>,
}

impl Stores {
    pub async fn connect(config: &StorageConfig) -> Result<Self, AppError> {
        match config.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data will not survive a restart");
                let store = Arc::new(MemoryStore::new());
                Ok(Self {
                    customers: store.clone(),
                    inventory: store.clone(),
                    invoices: store,
                })
            }
            StorageBackend::Mongodb => {
                let store = MongoStore::connect(
                    config.mongodb.uri.expose_secret(),
                    &config.mongodb.database,
                )
                .await?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                let store = Arc::new(store);
                Ok(Self {
                    customers: store.clone(),
                    inventory: store.clone(),
                    invoices: store,
                })
            }
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: InvoiceService,
    pub stores: Stores,
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// Port `0` binds a random free port, which tests rely on.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        init_metrics();

        let stores = Stores::connect(&config.storage).await?;
        let service = InvoiceService::new(
            stores.customers.clone(),
            stores.inventory.clone(),
            stores.invoices.clone(),
            config.invoices.clone(),
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!("Invoicing service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            listener,
            state: AppState { service, stores },
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Serve until SIGINT/SIGTERM, then drain in-flight requests.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            "/invoices/:invoice_number",
            get(handlers::invoices::get_invoice).delete(handlers::invoices::delete_invoice),
        )
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    org_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
