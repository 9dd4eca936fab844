// Interface adapters: vendor HTTP client, JSON protocol and route handlers.

pub mod clients;
pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod state;
