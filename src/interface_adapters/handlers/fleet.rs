use crate::domain::{
    BrokerError, DeviceIdentifier, DeviceStatus, FleetError, ResultCode, Vehicle, VehicleSummary,
};
use crate::interface_adapters::protocol::{
    ApiResponse, DeviceByVehicleQuery, DeviceStatusQuery, PlateStatusQuery, SessionStatus,
    TrackDetailQuery,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use std::sync::Arc;

type ErrorReply = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ErrorReply>;

#[tracing::instrument(name = "device_status", skip_all, fields(dev_idno = ?query.dev_idno))]
pub async fn device_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceStatusQuery>,
) -> ApiResult<Vec<DeviceStatus>> {
    let to_map = query.to_map.as_deref() == Some("true");
    let dev_idno = query.dev_idno.as_deref().filter(|value| !value.is_empty());

    let statuses = state
        .fleet
        .device_status(dev_idno, to_map)
        .await
        .map_err(|err| fleet_error_reply(err, "failed to fetch device status"))?;

    Ok(Json(ApiResponse::ok(statuses)))
}

#[tracing::instrument(name = "device_by_vehicle", skip_all, fields(vehi_idno = ?query.vehi_idno))]
pub async fn device_by_vehicle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceByVehicleQuery>,
) -> ApiResult<Vec<DeviceIdentifier>> {
    let vehi_idno = required(query.vehi_idno)
        .ok_or_else(|| bad_request("vehiIdno query parameter is required"))?;

    let devices = state
        .fleet
        .devices_by_vehicle(&vehi_idno)
        .await
        .map_err(|err| fleet_error_reply(err, "failed to fetch device identifiers"))?;

    Ok(Json(ApiResponse::ok(devices)))
}

#[tracing::instrument(name = "track_detail", skip_all, fields(dev_idno = ?query.dev_idno))]
pub async fn track_detail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrackDetailQuery>,
) -> ApiResult<Vec<DeviceStatus>> {
    let (Some(dev_idno), Some(begin_time), Some(end_time)) = (
        required(query.dev_idno),
        required(query.begintime),
        required(query.endtime),
    ) else {
        return Err(bad_request("devIdno, begintime, and endtime are required"));
    };

    let tracks = state
        .fleet
        .track_detail(&dev_idno, &begin_time, &end_time)
        .await
        .map_err(|err| fleet_error_reply(err, "failed to fetch track details"))?;

    Ok(Json(ApiResponse::ok(tracks)))
}

#[tracing::instrument(name = "vehicles", skip_all)]
pub async fn vehicles(State(state): State<Arc<AppState>>) -> ApiResult<Vec<VehicleSummary>> {
    let vehicles = state
        .fleet
        .vehicle_summaries()
        .await
        .map_err(|err| fleet_error_reply(err, "failed to fetch vehicles"))?;

    tracing::info!(count = vehicles.len(), "vehicles listed.");
    Ok(Json(ApiResponse::ok(vehicles)))
}

#[tracing::instrument(name = "user_vehicles", skip_all)]
pub async fn user_vehicles(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Vehicle>> {
    let vehicles = state
        .fleet
        .user_vehicles()
        .await
        .map_err(|err| fleet_error_reply(err, "failed to fetch user vehicles"))?;

    Ok(Json(ApiResponse::ok(vehicles)))
}

#[tracing::instrument(name = "plate_status", skip_all, fields(plates = ?query.plates))]
pub async fn plate_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlateStatusQuery>,
) -> ApiResult<Vec<DeviceStatus>> {
    let plates = split_plates(query.plates.as_deref().unwrap_or_default());
    if plates.is_empty() {
        return Err(bad_request("plates query parameter is required"));
    }

    let statuses = state
        .fleet
        .vehicle_statuses_by_plate(&plates)
        .await
        .map_err(|err| fleet_error_reply(err, "failed to fetch plate statuses"))?;

    Ok(Json(ApiResponse::ok(statuses)))
}

pub async fn session_info(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SessionStatus>> {
    let session_info = state.fleet.session_info().await;
    Json(ApiResponse::ok(SessionStatus {
        has_session: session_info.is_some(),
        session_info,
    }))
}

// Map fleet errors to HTTP status codes.
pub fn fleet_error_status(err: &FleetError) -> StatusCode {
    match err {
        FleetError::MalformedPayload { .. } => StatusCode::BAD_GATEWAY,
        FleetError::Broker(err) => match err {
            BrokerError::Authentication { .. } | BrokerError::ExhaustedRetries { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BrokerError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            BrokerError::Vendor { code, .. } => match code {
                ResultCode::ParameterError => StatusCode::BAD_REQUEST,
                ResultCode::PermissionDenied | ResultCode::NoVehicleAuthority => {
                    StatusCode::FORBIDDEN
                }
                ResultCode::DeviceNotFound
                | ResultCode::VehicleNotFound
                | ResultCode::UserNotFound => StatusCode::NOT_FOUND,
                ResultCode::DeviceOffline => StatusCode::CONFLICT,
                // Success and SessionInvalid never surface as vendor errors.
                ResultCode::Success | ResultCode::SessionInvalid | ResultCode::Unknown(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
        },
    }
}

fn fleet_error_reply(err: FleetError, context: &'static str) -> ErrorReply {
    let status = fleet_error_status(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "{context}.");
    } else {
        tracing::warn!(error = %err, "{context}.");
    }
    (status, Json(ApiResponse::failure(err.to_string())))
}

fn bad_request(message: &str) -> ErrorReply {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::failure(message)))
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn split_plates(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|plate| !plate.is_empty())
        .map(str::to_string)
        .collect()
}
