use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// String-keyed parameters for one vendor action call.
pub type VendorParams = BTreeMap<String, String>;

// The vendor's numeric `result` field translated into a closed taxonomy.
// Nothing past the broker boundary matches on raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    ParameterError,
    PermissionDenied,
    DeviceNotFound,
    DeviceOffline,
    VehicleNotFound,
    UserNotFound,
    SessionInvalid,
    NoVehicleAuthority,
    Unknown(i64),
}

impl ResultCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ResultCode::Success,
            1 => ResultCode::ParameterError,
            2 => ResultCode::PermissionDenied,
            3 => ResultCode::DeviceNotFound,
            4 => ResultCode::DeviceOffline,
            5 => ResultCode::VehicleNotFound,
            6 => ResultCode::UserNotFound,
            7 => ResultCode::SessionInvalid,
            8 => ResultCode::NoVehicleAuthority,
            other => ResultCode::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ResultCode::Success => 0,
            ResultCode::ParameterError => 1,
            ResultCode::PermissionDenied => 2,
            ResultCode::DeviceNotFound => 3,
            ResultCode::DeviceOffline => 4,
            ResultCode::VehicleNotFound => 5,
            ResultCode::UserNotFound => 6,
            ResultCode::SessionInvalid => 7,
            ResultCode::NoVehicleAuthority => 8,
            ResultCode::Unknown(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Success)
    }

    pub fn message(&self) -> &'static str {
        match self {
            ResultCode::Success => "Success.",
            ResultCode::ParameterError => "Request parameter error.",
            ResultCode::PermissionDenied => "No permissions to operate.",
            ResultCode::DeviceNotFound => "The requested device does not exist.",
            ResultCode::DeviceOffline => "The requested device is not online.",
            ResultCode::VehicleNotFound => "The requested vehicle does not exist.",
            ResultCode::UserNotFound => "The requested user does not exist.",
            ResultCode::SessionInvalid => "Session expired or invalid.",
            ResultCode::NoVehicleAuthority => "No vehicle operation authority.",
            ResultCode::Unknown(_) => "An unknown error occurred.",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (result code {})", self.message(), self.code())
    }
}

// Raw vendor JSON: `{ "result": <int>, ...payload }`.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorEnvelope {
    pub result: i64,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

// A vendor response after the result code has been classified.
#[derive(Debug, Clone)]
pub struct VendorResponse {
    pub result: ResultCode,
    pub payload: Map<String, Value>,
}

impl VendorResponse {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}

impl From<VendorEnvelope> for VendorResponse {
    fn from(envelope: VendorEnvelope) -> Self {
        Self {
            result: ResultCode::from_code(envelope.result),
            payload: envelope.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn when_code_is_known_then_it_maps_to_named_variant_and_back() {
        for code in 0..=8 {
            assert_eq!(ResultCode::from_code(code).code(), code);
        }
        assert_eq!(ResultCode::from_code(3), ResultCode::DeviceNotFound);
        assert_eq!(ResultCode::from_code(7), ResultCode::SessionInvalid);
    }

    #[test]
    fn when_code_is_outside_taxonomy_then_it_is_unknown_and_keeps_value() {
        let code = ResultCode::from_code(42);

        assert_eq!(code, ResultCode::Unknown(42));
        assert_eq!(code.code(), 42);
        assert_eq!(
            code.to_string(),
            "An unknown error occurred. (result code 42)"
        );
    }

    #[test]
    fn when_envelope_is_decoded_then_payload_keeps_non_result_fields() {
        let envelope: VendorEnvelope = serde_json::from_value(json!({
            "result": 0,
            "status": [{ "id": "123" }]
        }))
        .expect("expected envelope to decode");

        let response = VendorResponse::from(envelope);

        assert!(response.result.is_success());
        assert!(response.field("result").is_none());
        assert_eq!(response.field("status"), Some(&json!([{ "id": "123" }])));
    }
}
