use crate::domain::{Clock, SessionInfo};
use crate::interface_adapters::state::SystemClock;
use serde::{Deserialize, Serialize};

// JSON envelope shared by every fleet route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    // Epoch seconds at which the response was produced.
    pub timestamp: u64,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: SystemClock.now_epoch_seconds(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: SystemClock.now_epoch_seconds(),
        }
    }
}

// Query for GET /api/fleet/device-status.
#[derive(Debug, Deserialize)]
pub struct DeviceStatusQuery {
    // Comma-separated device numbers; all devices when absent.
    #[serde(rename = "devIdno")]
    pub dev_idno: Option<String>,
    // "true" asks the vendor for map-projected coordinates.
    #[serde(rename = "toMap")]
    pub to_map: Option<String>,
}

// Query for GET /api/fleet/device-by-vehicle.
#[derive(Debug, Deserialize)]
pub struct DeviceByVehicleQuery {
    #[serde(rename = "vehiIdno")]
    pub vehi_idno: Option<String>,
}

// Query for GET /api/fleet/track-detail.
#[derive(Debug, Deserialize)]
pub struct TrackDetailQuery {
    #[serde(rename = "devIdno")]
    pub dev_idno: Option<String>,
    pub begintime: Option<String>,
    pub endtime: Option<String>,
}

// Query for GET /api/fleet/plate-status.
#[derive(Debug, Deserialize)]
pub struct PlateStatusQuery {
    // Comma-separated plate numbers.
    pub plates: Option<String>,
}

// Payload for GET /api/fleet/session-info.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub has_session: bool,
    pub session_info: Option<SessionInfo>,
}
