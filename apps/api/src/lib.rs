//! # Shopbill API
//!
//! JSON over HTTP for the web and mobile clients.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shopbill API Services                           │
//! │                                                                         │
//! │  public                         behind require_auth (Bearer JWT)        │
//! │  ┌────────────────────┐        ┌──────────────────────────────────────┐│
//! │  │ /health            │        │ /user        account_service         ││
//! │  │ /register /login   │        │ /products    product_service         ││
//! │  │ /check-email       │        │ /import-products  import_service     ││
//! │  │ /forgot-password   │        │ /sales       sale_service            ││
//! │  └────────────────────┘        │ /customers /vendors  directory_svc   ││
//! │                                │ /bill-settings/mine  settings_svc    ││
//! │                                │ /tickets     ticket_service          ││
//! │                                │ /plans /subscriptions  subscription  ││
//! │                                │ /users       admin_service (admin)   ││
//! │                                └──────────────────────────────────────┘│
//! │                                                                         │
//! │  handlers ──► shopbill-db repositories ──► SQLite                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod services;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use shopbill_db::Database;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use crate::auth::{require_auth, JwtManager};
use crate::services::{
    account_service, admin_service, directory_service, health_service, import_service,
    product_service, sale_service, settings_service, subscription_service, ticket_service,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_access_lifetime_secs);
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

/// All routes with their middleware.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_service::health))
        .route("/register", post(account_service::register))
        .route("/login", post(account_service::login))
        .route("/check-email", post(account_service::check_email))
        .route("/forgot-password", post(account_service::forgot_password));

    let protected = Router::new()
        .route(
            "/user",
            get(account_service::get_profile).put(account_service::update_profile),
        )
        // Catalog
        .route(
            "/products",
            get(product_service::list).post(product_service::create),
        )
        .route(
            "/products/{id}",
            get(product_service::get)
                .put(product_service::update)
                .delete(product_service::delete),
        )
        .route(
            "/import-products",
            post(import_service::import_products)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        // Invoicing
        .route("/sales", get(sale_service::list).post(sale_service::create))
        .route(
            "/sales/{id}",
            get(sale_service::get).delete(sale_service::delete),
        )
        .route("/sales/{id}/document", get(sale_service::document))
        // Directory
        .route(
            "/customers",
            get(directory_service::list_customers).post(directory_service::create_customer),
        )
        .route(
            "/customers/{id}",
            get(directory_service::get_customer)
                .put(directory_service::update_customer)
                .delete(directory_service::delete_customer),
        )
        .route(
            "/customers/{id}/activate",
            post(directory_service::activate_customer),
        )
        .route(
            "/customers/{id}/deactivate",
            post(directory_service::deactivate_customer),
        )
        .route(
            "/customers/{id}/set_status",
            post(directory_service::set_customer_status),
        )
        .route(
            "/vendors",
            get(directory_service::list_vendors).post(directory_service::create_vendor),
        )
        .route(
            "/vendors/{id}",
            get(directory_service::get_vendor)
                .put(directory_service::update_vendor)
                .delete(directory_service::delete_vendor),
        )
        .route(
            "/vendors/{id}/activate",
            post(directory_service::activate_vendor),
        )
        // Settings
        .route(
            "/bill-settings/mine",
            get(settings_service::mine)
                .put(settings_service::update_mine)
                .patch(settings_service::update_mine),
        )
        // Support
        .route(
            "/tickets",
            get(ticket_service::list).post(ticket_service::create),
        )
        .route("/tickets/{id}", get(ticket_service::get))
        .route(
            "/tickets/{id}/provide_feedback",
            post(ticket_service::provide_feedback),
        )
        // Subscriptions
        .route(
            "/plans",
            get(subscription_service::list_plans).post(subscription_service::create_plan),
        )
        .route("/plans/{id}", get(subscription_service::get_plan))
        .route("/subscriptions", post(subscription_service::subscribe))
        .route("/subscriptions/status", get(subscription_service::status))
        // Admin
        .route("/users", get(admin_service::list_users))
        .route("/users/{id}/status", patch(admin_service::toggle_status))
        .route("/users/{id}/details", get(admin_service::details))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new().merge(public).merge(protected).with_state(state)
}
