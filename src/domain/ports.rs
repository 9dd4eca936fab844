use async_trait::async_trait;

use crate::domain::errors::{FleetError, TransportError};
use crate::domain::fleet::{DeviceIdentifier, DeviceStatus, Vehicle, VehicleSummary};
use crate::domain::session::{Credentials, Session, SessionInfo, TransportMode};
use crate::domain::vendor::{VendorEnvelope, VendorParams};

// Outbound port: one HTTP exchange with the vendor API.
// The broker owns the session lifecycle; implementations stay stateless.
#[async_trait]
pub trait VendorTransport: Send + Sync {
    // Run the login variant for `mode` and return the issued token.
    async fn login(
        &self,
        mode: TransportMode,
        credentials: &Credentials,
    ) -> Result<String, TransportError>;

    // Issue a data call with the session attached the way `session.mode()` says.
    async fn call(
        &self,
        action: &str,
        params: &VendorParams,
        session: &Session,
    ) -> Result<VendorEnvelope, TransportError>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

// Inbound port used by the HTTP handlers.
// Handlers depend on this trait, not on the concrete broker stack.
#[async_trait]
pub trait FleetDirectory: Send + Sync {
    async fn device_status(
        &self,
        dev_idno: Option<&str>,
        to_map: bool,
    ) -> Result<Vec<DeviceStatus>, FleetError>;

    async fn devices_by_vehicle(&self, vehi_idno: &str)
    -> Result<Vec<DeviceIdentifier>, FleetError>;

    async fn track_detail(
        &self,
        dev_idno: &str,
        begin_time: &str,
        end_time: &str,
    ) -> Result<Vec<DeviceStatus>, FleetError>;

    async fn vehicle_summaries(&self) -> Result<Vec<VehicleSummary>, FleetError>;

    // Vehicles registered to the vendor account.
    async fn user_vehicles(&self) -> Result<Vec<Vehicle>, FleetError>;

    // Live statuses for the devices bound to the given plates.
    async fn vehicle_statuses_by_plate(
        &self,
        plates: &[String],
    ) -> Result<Vec<DeviceStatus>, FleetError>;

    async fn session_info(&self) -> Option<SessionInfo>;
}
