use crate::interface_adapters::handlers::fleet::{
    device_by_vehicle, device_status, plate_status, session_info, track_detail, user_vehicles,
    vehicles,
};
use crate::interface_adapters::state::AppState;
use axum::{Router, routing::get};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    // Wire the HTTP routes to their handlers.
    Router::new()
        .route("/api/fleet/device-status", get(device_status))
        .route("/api/fleet/device-by-vehicle", get(device_by_vehicle))
        .route("/api/fleet/track-detail", get(track_detail))
        .route("/api/fleet/vehicles", get(vehicles))
        .route("/api/fleet/user-vehicles", get(user_vehicles))
        .route("/api/fleet/plate-status", get(plate_status))
        .route("/api/fleet/session-info", get(session_info))
        .with_state(state)
}
