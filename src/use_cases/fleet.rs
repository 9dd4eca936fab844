use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::errors::FleetError;
use crate::domain::fleet::{
    DeviceIdentifier, DeviceRef, DeviceStatus, Vehicle, VehicleSummary, VendorDevice,
};
use crate::domain::ports::{Clock, FleetDirectory, VendorTransport};
use crate::domain::session::SessionInfo;
use crate::domain::vendor::{VendorParams, VendorResponse};
use crate::use_cases::session_broker::SessionBroker;

// Vendor action names.
pub const GET_DEVICE_STATUS: &str = "StandardApiAction_getDeviceStatus.action";
pub const GET_DEVICE_BY_VEHICLE: &str = "StandardApiAction_getDeviceByVehicle.action";
pub const QUERY_TRACK_DETAIL: &str = "StandardApiAction_queryTrackDetail.action";
pub const QUERY_USER_VEHICLE: &str = "StandardApiAction_queryUserVehicle.action";

// Company name shown for vehicles assembled from device bindings.
const UNKNOWN_COMPANY: &str = "Unknown Company";

// Typed fleet queries on top of the session broker.
pub struct FleetService<T, C> {
    broker: SessionBroker<T, C>,
}

impl<T, C> FleetService<T, C>
where
    T: VendorTransport,
    C: Clock,
{
    pub fn new(broker: SessionBroker<T, C>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl<T, C> FleetDirectory for FleetService<T, C>
where
    T: VendorTransport,
    C: Clock,
{
    async fn device_status(
        &self,
        dev_idno: Option<&str>,
        to_map: bool,
    ) -> Result<Vec<DeviceStatus>, FleetError> {
        let mut query = VendorParams::new();
        if let Some(dev_idno) = dev_idno {
            query.insert("devIdno".to_string(), dev_idno.to_string());
        }
        if to_map {
            query.insert("toMap".to_string(), "1".to_string());
        }

        let response = self.broker.request(GET_DEVICE_STATUS, &query).await?;
        Ok(take_list(response, GET_DEVICE_STATUS, "status")?.unwrap_or_default())
    }

    async fn devices_by_vehicle(
        &self,
        vehi_idno: &str,
    ) -> Result<Vec<DeviceIdentifier>, FleetError> {
        let response = self
            .broker
            .request(
                GET_DEVICE_BY_VEHICLE,
                &params([
                    ("vehi_idno", vehi_idno.to_string()),
                    ("query_type", "1".to_string()),
                    ("show_type", "3".to_string()),
                    ("page", "1".to_string()),
                    ("rows", "100".to_string()),
                ]),
            )
            .await?;

        let devices: Vec<VendorDevice> = take_list(response, GET_DEVICE_BY_VEHICLE, "devices")?
            .ok_or(FleetError::MalformedPayload {
                action: GET_DEVICE_BY_VEHICLE,
                reason: "missing devices".to_string(),
            })?;
        Ok(devices.into_iter().map(DeviceIdentifier::from).collect())
    }

    async fn track_detail(
        &self,
        dev_idno: &str,
        begin_time: &str,
        end_time: &str,
    ) -> Result<Vec<DeviceStatus>, FleetError> {
        let response = self
            .broker
            .request(
                QUERY_TRACK_DETAIL,
                &params([
                    ("devIdno", dev_idno.to_string()),
                    ("begintime", begin_time.to_string()),
                    ("endtime", end_time.to_string()),
                    ("toMap", "1".to_string()),
                ]),
            )
            .await?;
        Ok(take_list(response, QUERY_TRACK_DETAIL, "tracks")?.unwrap_or_default())
    }

    async fn vehicle_summaries(&self) -> Result<Vec<VehicleSummary>, FleetError> {
        let devices = self.devices_by_vehicle("all").await?;
        Ok(group_devices_by_vehicle(devices))
    }

    async fn user_vehicles(&self) -> Result<Vec<Vehicle>, FleetError> {
        let mut response = self
            .broker
            .request(QUERY_USER_VEHICLE, &VendorParams::new())
            .await?;

        match response.payload.remove("vehicles") {
            None | Some(Value::Null) => Ok(Vec::new()),
            // The vendor returns a bare object when the account has one vehicle.
            Some(single @ Value::Object(_)) => {
                tracing::warn!("fleet vendor returned a single vehicle object; wrapping it");
                Ok(vec![decode(single, QUERY_USER_VEHICLE, "vehicles")?])
            }
            Some(list) => decode(list, QUERY_USER_VEHICLE, "vehicles"),
        }
    }

    // Resolve plates to devices, then fetch those devices' statuses.
    async fn vehicle_statuses_by_plate(
        &self,
        plates: &[String],
    ) -> Result<Vec<DeviceStatus>, FleetError> {
        if plates.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .broker
            .request(
                GET_DEVICE_BY_VEHICLE,
                &params([("vehiIdno", plates.join(","))]),
            )
            .await?;
        let devices: Vec<VendorDevice> =
            take_list(response, GET_DEVICE_BY_VEHICLE, "devices")?.unwrap_or_default();
        let device_ids: Vec<String> = devices
            .into_iter()
            .map(|device| device.dev_idno)
            .filter(|id| !id.is_empty())
            .collect();

        if device_ids.is_empty() {
            tracing::info!(plates = plates.len(), "no devices bound to the requested plates");
            return Ok(Vec::new());
        }

        let response = self
            .broker
            .request(
                GET_DEVICE_STATUS,
                &params([
                    ("devIdno", device_ids.join(",")),
                    ("toMap", "1".to_string()),
                ]),
            )
            .await?;
        Ok(take_list(response, GET_DEVICE_STATUS, "status")?.unwrap_or_default())
    }

    async fn session_info(&self) -> Option<SessionInfo> {
        self.broker.session_info().await
    }
}

// Fold plate-to-device bindings into one summary per plate, ordered by plate.
pub fn group_devices_by_vehicle(devices: Vec<DeviceIdentifier>) -> Vec<VehicleSummary> {
    let mut vehicles: BTreeMap<String, VehicleSummary> = BTreeMap::new();
    for device in devices {
        vehicles
            .entry(device.vid.clone())
            .or_insert_with(|| VehicleSummary {
                id: device.vid.clone(),
                nm: device.vid.clone(),
                dl: Vec::new(),
                pnm: UNKNOWN_COMPANY.to_string(),
            })
            .dl
            .push(DeviceRef { id: device.did });
    }
    vehicles.into_values().collect()
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> VendorParams {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

// Pull a list field out of a successful response; absent or null means `None`.
fn take_list<R: DeserializeOwned>(
    mut response: VendorResponse,
    action: &'static str,
    field: &str,
) -> Result<Option<Vec<R>>, FleetError> {
    match response.payload.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(value, action, field).map(Some),
    }
}

fn decode<R: DeserializeOwned>(
    value: Value,
    action: &'static str,
    field: &str,
) -> Result<R, FleetError> {
    serde_json::from_value(value).map_err(|err| FleetError::MalformedPayload {
        action,
        reason: format!("{field}: {err}"),
    })
}
