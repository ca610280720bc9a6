use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "AutoIntelli Portal API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok"
    }))
}

/// Liveness plus per-catalog sync readiness.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "catalogs": state.catalogs.readiness()
    }))
}
