// easypv-api: Async Rust client for the Easy PV cloud API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod stations;
pub mod transport;

pub use client::{DEFAULT_BASE_URL, EasyPvClient};
pub use error::Error;
pub use models::{RawDevice, RawDeviceData, RawPanel, RawStation, UserInfo};
pub use transport::TransportConfig;
