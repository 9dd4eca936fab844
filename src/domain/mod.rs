// Domain layer: vendor session model, fleet records and ports.

pub mod errors;
pub mod fleet;
pub mod ports;
pub mod session;
pub mod vendor;

// Re-export the domain boundary types and ports.
pub use errors::{BrokerError, FleetError, LoginFailure, TransportError};
pub use fleet::{
    Device, DeviceIdentifier, DeviceRef, DeviceStatus, Vehicle, VehicleSummary, VendorDevice,
};
pub use ports::{Clock, FleetDirectory, VendorTransport};
pub use session::{Credentials, Session, SessionInfo, TransportMode};
pub use vendor::{ResultCode, VendorEnvelope, VendorParams, VendorResponse};
