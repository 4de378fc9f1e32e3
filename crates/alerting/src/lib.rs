//! Alerting System
//!
//! Turns the current signal snapshot into user-facing notifications, with
//! warm-up suppression, per-category cooldowns, duplicate suppression and an
//! hourly cap.

mod config;
mod gate;

pub use config::{CategoryCooldowns, GateConfig};
pub use gate::{AlertCategory, Notification, NotificationGate};
