use thiserror::Error;

use crate::device::DeviceRole;

/// Errors raised while configuring a session or resolving devices.
///
/// The per-frame path never produces these: devices that are missing or
/// untracked are skipped for the frame instead.
#[derive(Debug, Error)]
pub enum SightlineError {
    #[error("unknown device role: '{0}'")]
    UnknownDevice(String),
    #[error("{0:?} is not a controller")]
    NotAController(DeviceRole),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SightlineError>;
