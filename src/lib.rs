#![doc = include_str!("../README.md")]

/// Variable optical attenuation (VOA) facade
pub mod atten;
/// TL1 command builders
pub mod commands;
mod config;
/// Cross-connection management and JSON export/import
pub mod crossconnect;
mod error;
mod policy;
/// Port specification parsing and wire encoding
pub mod portspec;
/// Optical power monitor (OPM) facade
pub mod pmon;
/// TL1 response framing and parsing
pub mod response;
mod session;

pub use atten::{AttenSetting, Attenuation};
pub use commands::{AlarmType, AttenMode, FlapInterval, ThresholdSettings, CTAG};
pub use config::{SwitchConfig, TL1_PORT};
pub use crossconnect::{export_connections, import_connections, CrossConnect};
pub use error::{Result, Tl1Error};
pub use pmon::{
    AlarmState, AlarmThreshold, FittedPort, MonitorConfig, PowerMonitor, PowerReading,
};
pub use policy::ErrorPolicy;
pub use portspec::PortSpec;
pub use response::{classify, LineKind, ResponseBlock, ResponseReader};
pub use session::Session;
