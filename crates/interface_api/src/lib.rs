//! HTTP API Layer
//!
//! REST surface for the wallet core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per domain
//! - **Middleware**: Bearer-token authentication
//! - **DTOs**: Request/response data transfer objects
//! - **Error Handling**: Consistent, actionable error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(pool, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_gateway::{PaymentGateway, SimulatedProvider};
use domain_ledger::{NotificationSink, TransferService};
use domain_schedule::{ScheduleRunner, ScheduleStore};
use domain_security::PinManager;
use domain_workflows::{RequestWorkflow, SplitBillWorkflow, WorkflowStore};
use infra_db::{
    PostgresGatewayStore, PostgresScheduleStore, PostgresSecurityStore, PostgresWalletStore,
    PostgresWorkflowStore,
};

use crate::config::ApiConfig;
use crate::middleware::auth_middleware;
use crate::handlers::{gateway, health, schedule, security, wallet, workflows};

/// Notification sink that only logs deliveries
///
/// Stands in for the push/email channel; a real sink replaces this without
/// touching any handler.
#[derive(Debug, Default, Clone)]
struct LoggingNotificationSink;

impl core_kernel::DomainPort for LoggingNotificationSink {}

#[async_trait::async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn notify(
        &self,
        user: core_kernel::UserId,
        message: &str,
    ) -> Result<(), core_kernel::PortError> {
        tracing::info!(user = %user, message, "Notification");
        Ok(())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub transfers: TransferService,
    pub pins: PinManager,
    pub security: Arc<PostgresSecurityStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub runner: ScheduleRunner,
    pub requests: RequestWorkflow,
    pub splits: SplitBillWorkflow,
    pub workflows: Arc<dyn WorkflowStore>,
    pub gateway: PaymentGateway,
}

impl AppState {
    /// Wires every adapter and service over the connection pool
    pub fn new(pool: PgPool, config: ApiConfig) -> Self {
        let wallet_store = Arc::new(PostgresWalletStore::new(pool.clone()));
        let security_store = Arc::new(PostgresSecurityStore::new(pool.clone()));
        let schedule_store: Arc<dyn ScheduleStore> =
            Arc::new(PostgresScheduleStore::new(pool.clone()));
        let workflow_store: Arc<dyn WorkflowStore> =
            Arc::new(PostgresWorkflowStore::new(pool.clone()));
        let gateway_store = Arc::new(PostgresGatewayStore::new(pool.clone()));

        let transfers = TransferService::new(
            wallet_store,
            security_store.clone(),
            Arc::new(LoggingNotificationSink),
        );
        let pins = PinManager::new(security_store.clone());
        let runner = ScheduleRunner::new(schedule_store.clone(), transfers.clone());
        let requests = RequestWorkflow::new(workflow_store.clone(), transfers.clone());
        let splits = SplitBillWorkflow::new(workflow_store.clone(), transfers.clone());
        let gateway = PaymentGateway::new(
            Arc::new(SimulatedProvider::new()),
            gateway_store,
            transfers.clone(),
            config.provider_secret.as_bytes().to_vec(),
        );

        Self {
            pool,
            config,
            transfers,
            pins,
            security: security_store,
            schedules: schedule_store,
            runner,
            requests,
            splits,
            workflows: workflow_store,
            gateway,
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `config` - API configuration
pub fn create_router(pool: PgPool, config: ApiConfig) -> Router {
    let state = AppState::new(pool, config);
    router_with_state(state)
}

/// Builds the router over an existing state (used by the binary, which
/// also hands the state to the sweep task)
pub fn router_with_state(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/gateway/webhook", post(gateway::webhook));

    // Wallet routes
    let wallet_routes = Router::new()
        .route("/balance", get(wallet::balance))
        .route("/transfer", post(wallet::transfer))
        .route("/add-money", post(wallet::add_money))
        .route("/withdraw", post(wallet::withdraw))
        .route("/transactions", get(wallet::transactions))
        .route("/statement", get(wallet::statement))
        .route("/statement/csv", get(wallet::statement_csv))
        .route("/analytics", get(wallet::analytics));

    // PIN and audit routes
    let security_routes = Router::new()
        .route("/pin/status", get(security::pin_status))
        .route("/pin/set", post(security::set_pin))
        .route("/pin/change", post(security::change_pin))
        .route("/pin/reset", post(security::reset_pin))
        .route("/audit-logs", get(security::audit_events));

    // Scheduled payment routes
    let schedule_routes = Router::new()
        .route("/", get(schedule::list))
        .route("/", post(schedule::create))
        .route("/:id/toggle", patch(schedule::toggle))
        .route("/:id", delete(schedule::delete))
        .route("/process", post(schedule::process));

    // Request money routes
    let request_routes = Router::new()
        .route("/", get(workflows::list_requests))
        .route("/", post(workflows::create_request))
        .route("/pending-count", get(workflows::pending_request_count))
        .route("/:id/pay", post(workflows::pay_request))
        .route("/:id/decline", post(workflows::decline_request))
        .route("/:id", delete(workflows::cancel_request));

    // Split bill routes
    let split_routes = Router::new()
        .route("/", get(workflows::list_bills))
        .route("/", post(workflows::create_bill))
        .route("/:id/pay", post(workflows::pay_share))
        .route("/:id/decline", post(workflows::decline_share))
        .route("/:id", delete(workflows::cancel_bill));

    // Beneficiary routes
    let beneficiary_routes = Router::new()
        .route("/", get(workflows::list_beneficiaries))
        .route("/", post(workflows::add_beneficiary))
        .route("/:id", put(workflows::rename_beneficiary))
        .route("/:id", delete(workflows::remove_beneficiary));

    // Gateway routes
    let gateway_routes = Router::new()
        .route("/create-order", post(gateway::create_order))
        .route("/verify-payment", post(gateway::verify_payment))
        .route("/add-bank-account", post(gateway::add_bank_account))
        .route("/payout", post(gateway::payout));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/wallet", wallet_routes)
        .nest("/security", security_routes)
        .nest("/scheduled", schedule_routes)
        .nest("/requests", request_routes)
        .nest("/splits", split_routes)
        .nest("/beneficiaries", beneficiary_routes)
        .nest("/gateway", gateway_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
