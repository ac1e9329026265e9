//! Protocol layer for `RemoteDeck`
//!
//! This module provides the Protocol trait and one handler per protocol
//! family (RDP, SSH, VNC, FTP/SFTP, Telnet). A handler knows which external
//! clients can serve its protocol, in priority order, and which extra
//! template placeholders its profiles fill in. The remote protocols
//! themselves are always spoken by the external client.

mod ftp;
mod rdp;
mod registry;
mod ssh;
mod telnet;
mod vnc;

pub use ftp::FtpProtocol;
pub use rdp::RdpProtocol;
pub use registry::ProtocolRegistry;
pub use ssh::SshProtocol;
pub use telnet::TelnetProtocol;
pub use vnc::VncProtocol;

use crate::error::{LaunchError, LaunchResult};
use crate::models::{ConnectionProfile, ConnectionType};

/// Core trait for all protocol handlers
pub trait Protocol: Send + Sync {
    /// Returns the protocol identifier (e.g., "ssh", "rdp", "ftp")
    fn protocol_id(&self) -> &'static str;

    /// Returns human-readable protocol name
    fn display_name(&self) -> &'static str;

    /// Returns default port for this protocol
    fn default_port(&self) -> u16;

    /// Connection types handled here
    fn connection_types(&self) -> &'static [ConnectionType];

    /// Client keys to try for `connection_type`, highest priority first
    fn candidate_clients(&self, connection_type: ConnectionType) -> &'static [&'static str];

    /// Protocol-specific placeholder values for the argument template
    fn placeholders(&self, _profile: &ConnectionProfile) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Validates a profile before launching
    ///
    /// # Errors
    /// Returns `LaunchError::InvalidConnection` if the profile cannot be
    /// launched with this protocol
    fn validate_connection(&self, profile: &ConnectionProfile) -> LaunchResult<()> {
        check_common(self.connection_types(), profile)
    }
}

/// Checks type, host and port
///
/// # Errors
/// Returns `LaunchError::InvalidConnection` describing the first problem
pub fn check_common(types: &[ConnectionType], profile: &ConnectionProfile) -> LaunchResult<()> {
    if !types.contains(&profile.connection_type()) {
        return Err(LaunchError::InvalidConnection(format!(
            "{} is not a {} connection",
            profile.name,
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("/")
        )));
    }
    profile
        .validate()
        .map_err(|e| LaunchError::InvalidConnection(e.to_string()))
}
