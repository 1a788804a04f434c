//! HTTP handlers
//!
//! Each module exposes a `configure` function that registers its routes on
//! an actix `ServiceConfig`.

pub mod employee;
pub mod location;
pub mod session;
pub mod subscription;
pub mod tariff;

pub use employee::configure as configure_employees;
pub use location::configure as configure_locations;
pub use session::configure as configure_sessions;
pub use subscription::configure as configure_subscriptions;
pub use tariff::configure as configure_tariffs;
