pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod modules;
pub mod services;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{admin, auth as auth_handlers, design, logistics, modules as nav, production, sales, system};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/whoami", get(auth_handlers::whoami))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/api/modules", get(nav::list))
        .route("/api/logistics/tools", get(logistics::tools))
        .route("/api/logistics/items", get(logistics::items))
        .route("/api/logistics/submit", post(logistics::submit))
        .route("/api/design/tools", get(design::tools))
        .route("/api/design/accessories", get(design::accessories))
        .route("/api/design/submit", post(design::submit))
        .route("/api/sales/tools", get(sales::tools))
        .route("/api/sales/clients", get(sales::clients))
        .route("/api/sales/submit", post(sales::submit))
        .route("/api/production/tools", get(production::tools))
        .route("/api/production/planning", get(production::planning))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/update", post(admin::update_user))
        .route_layer(axum::middleware::from_fn(
            middleware::jwt_auth_middleware,
        ));

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/register", post(auth_handlers::register))
        .merge(protected)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
