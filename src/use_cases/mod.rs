// Use cases layer: vendor session brokering and fleet queries.

pub mod fleet;
pub mod session_broker;

#[cfg(test)]
pub(crate) mod test_support;

pub use fleet::FleetService;
pub use session_broker::{BrokerSettings, SessionBroker};
