//! RDP protocol handler

use crate::models::{ConnectionProfile, ConnectionType, ProtocolOptions};

use super::Protocol;

const CLIENTS: &[&str] = &["mstsc", "xfreerdp", "rdesktop"];

/// RDP protocol handler
///
/// `{domain}` and `{resolution}` are available to RDP templates in addition
/// to the common placeholders.
pub struct RdpProtocol;

impl RdpProtocol {
    /// Creates a new RDP protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RdpProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for RdpProtocol {
    fn protocol_id(&self) -> &'static str {
        "rdp"
    }

    fn display_name(&self) -> &'static str {
        "RDP"
    }

    fn default_port(&self) -> u16 {
        3389
    }

    fn connection_types(&self) -> &'static [ConnectionType] {
        &[ConnectionType::Rdp]
    }

    fn candidate_clients(&self, _connection_type: ConnectionType) -> &'static [&'static str] {
        CLIENTS
    }

    fn placeholders(&self, profile: &ConnectionProfile) -> Vec<(&'static str, String)> {
        let ProtocolOptions::Rdp(options) = &profile.options else {
            return Vec::new();
        };
        vec![
            ("domain", options.domain.clone().unwrap_or_default()),
            ("resolution", options.resolution.clone().unwrap_or_default()),
        ]
    }
}
