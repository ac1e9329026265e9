//! VNC protocol handler

use crate::error::{LaunchError, LaunchResult};
use crate::models::{ConnectionProfile, ConnectionType, ProtocolOptions};

use super::{check_common, Protocol};

const CLIENTS: &[&str] = &[
    "radmin",
    "vncviewer",
    "realvnc-vncviewer",
    "tightvnc-vncviewer",
    "ultravnc",
    "turbovnc",
];

/// VNC protocol handler
pub struct VncProtocol;

impl VncProtocol {
    /// Creates a new VNC protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for VncProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for VncProtocol {
    fn protocol_id(&self) -> &'static str {
        "vnc"
    }

    fn display_name(&self) -> &'static str {
        "VNC"
    }

    fn default_port(&self) -> u16 {
        5900
    }

    fn connection_types(&self) -> &'static [ConnectionType] {
        &[ConnectionType::Vnc]
    }

    fn candidate_clients(&self, _connection_type: ConnectionType) -> &'static [&'static str] {
        CLIENTS
    }

    fn validate_connection(&self, profile: &ConnectionProfile) -> LaunchResult<()> {
        check_common(self.connection_types(), profile)?;
        if let ProtocolOptions::Vnc(options) = &profile.options {
            for (field, value) in [("compression", options.compression), ("quality", options.quality)] {
                if value.is_some_and(|v| v > 9) {
                    return Err(LaunchError::InvalidConnection(format!(
                        "VNC {field} must be between 0 and 9"
                    )));
                }
            }
        }
        Ok(())
    }
}
