//! SSH protocol handler

use crate::error::{LaunchError, LaunchResult};
use crate::models::{ConnectionProfile, ConnectionType, ProtocolOptions, SshOptions};

use super::{check_common, Protocol};

const CLIENTS: &[&str] = &["xshell", "securecrt", "putty", "kitty", "ssh"];

/// SSH protocol handler
///
/// Fills `{privatekey}` and `{compression}` from the profile's SSH options.
pub struct SshProtocol;

impl SshProtocol {
    /// Creates a new SSH protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn options(profile: &ConnectionProfile) -> Option<&SshOptions> {
        match &profile.options {
            ProtocolOptions::Ssh(options) => Some(options),
            _ => None,
        }
    }

    /// Private key path when key auth is on; `~` is expanded
    fn private_key(options: &SshOptions) -> Option<String> {
        if options.use_private_key == Some(false) {
            return None;
        }
        let path = options.private_key_path.as_ref()?.to_str()?.trim();
        if path.is_empty() {
            return None;
        }
        Some(shellexpand::tilde(path).into_owned())
    }
}

impl Default for SshProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for SshProtocol {
    fn protocol_id(&self) -> &'static str {
        "ssh"
    }

    fn display_name(&self) -> &'static str {
        "SSH"
    }

    fn default_port(&self) -> u16 {
        22
    }

    fn connection_types(&self) -> &'static [ConnectionType] {
        &[ConnectionType::Ssh]
    }

    fn candidate_clients(&self, _connection_type: ConnectionType) -> &'static [&'static str] {
        CLIENTS
    }

    fn placeholders(&self, profile: &ConnectionProfile) -> Vec<(&'static str, String)> {
        let options = Self::options(profile);
        let key = options.and_then(Self::private_key).unwrap_or_default();
        let compression = if options.and_then(|o| o.compression) == Some(true) {
            "-C"
        } else {
            ""
        };
        vec![("privatekey", key), ("compression", compression.to_string())]
    }

    fn validate_connection(&self, profile: &ConnectionProfile) -> LaunchResult<()> {
        check_common(self.connection_types(), profile)?;
        if let Some(options) = Self::options(profile) {
            if options.use_private_key == Some(true) && Self::private_key(options).is_none() {
                return Err(LaunchError::InvalidConnection(
                    "Private key authentication is enabled but no key path is set".to_string(),
                ));
            }
        }
        Ok(())
    }
}
