//! Domain models for ValetPark
//!
//! This module contains all the core domain models used throughout the application.

pub mod employee;
pub mod location;
pub mod session;
pub mod session_log;
pub mod subscription;
pub mod tariff;

pub use employee::Employee;
pub use location::{Location, ParkingLot};
pub use session::{
    photos_from_urls, photos_to_urls, PaymentStatus, PhotoData, SessionStatus, ValetSession,
};
pub use session_log::{SessionAction, SessionLogEntry, SessionLogView};
pub use subscription::{Subscription, SubscriptionPlan, SubscriptionStatus};
pub use tariff::{CostBreakdown, CostCalculation, Tariff, TariffType};
