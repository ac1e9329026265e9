//! FTP and SFTP protocol handler

use crate::models::{ConnectionProfile, ConnectionType, ProtocolOptions};

use super::Protocol;

const FTP_CLIENTS: &[&str] = &["xftp", "winscp", "filezilla", "ftp"];
// The system `ftp` client cannot speak SFTP
const SFTP_CLIENTS: &[&str] = &["xftp", "winscp", "filezilla"];

/// FTP/SFTP protocol handler
///
/// Fills `{initialpath}`; `{protocol}` renders as `ftp` or `sftp`.
pub struct FtpProtocol;

impl FtpProtocol {
    /// Creates a new FTP/SFTP protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for FtpProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for FtpProtocol {
    fn protocol_id(&self) -> &'static str {
        "ftp"
    }

    fn display_name(&self) -> &'static str {
        "FTP/SFTP"
    }

    fn default_port(&self) -> u16 {
        21
    }

    fn connection_types(&self) -> &'static [ConnectionType] {
        &[ConnectionType::Ftp, ConnectionType::Sftp]
    }

    fn candidate_clients(&self, connection_type: ConnectionType) -> &'static [&'static str] {
        if connection_type == ConnectionType::Sftp {
            SFTP_CLIENTS
        } else {
            FTP_CLIENTS
        }
    }

    fn placeholders(&self, profile: &ConnectionProfile) -> Vec<(&'static str, String)> {
        let initial_path = match &profile.options {
            ProtocolOptions::Ftp(options) | ProtocolOptions::Sftp(options) => {
                options.initial_path.clone().unwrap_or_default()
            }
            _ => String::new(),
        };
        vec![("initialpath", initial_path)]
    }
}
