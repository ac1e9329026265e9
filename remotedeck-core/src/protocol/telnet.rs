//! Telnet protocol handler

use crate::models::ConnectionType;

use super::Protocol;

/// Telnet protocol handler
pub struct TelnetProtocol;

impl TelnetProtocol {
    /// Creates a new Telnet protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for TelnetProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for TelnetProtocol {
    fn protocol_id(&self) -> &'static str {
        "telnet"
    }

    fn display_name(&self) -> &'static str {
        "Telnet"
    }

    fn default_port(&self) -> u16 {
        23
    }

    fn connection_types(&self) -> &'static [ConnectionType] {
        &[ConnectionType::Telnet]
    }

    fn candidate_clients(&self, _connection_type: ConnectionType) -> &'static [&'static str] {
        &["telnet"]
    }
}
