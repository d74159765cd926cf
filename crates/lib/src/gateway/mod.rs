//! HTTP services: PrimeAgent (router + completion + relay) and SecondaryAgent (echo).
//!
//! Both serve `/a2a`, `/agent-card`, `/api/messages`, `/api/health` and `/` on one port.
//! Bot activities posted to `/api/messages` are acknowledged at once and answered
//! asynchronously through the connector callback.

mod prime;
mod protocol;
mod secondary;
mod server;

pub use prime::run_prime;
pub use protocol::{EchoRequest, ErrorBody, HealthResponse};
pub use secondary::run_secondary;
