//! Connection types and their type-specific options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Remote-access protocol served by an external client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Remote Desktop Protocol
    Rdp,
    /// Secure Shell
    Ssh,
    /// Virtual Network Computing
    Vnc,
    /// Telnet
    Telnet,
    /// File Transfer Protocol
    Ftp,
    /// SSH File Transfer Protocol
    Sftp,
}

/// Default ports, indexed in the same order as [`ConnectionType::ALL`]
pub const DEFAULT_PORTS: [(ConnectionType, u16); 6] = [
    (ConnectionType::Rdp, 3389),
    (ConnectionType::Ssh, 22),
    (ConnectionType::Vnc, 5900),
    (ConnectionType::Telnet, 23),
    (ConnectionType::Ftp, 21),
    (ConnectionType::Sftp, 22),
];

impl ConnectionType {
    /// Every supported connection type
    pub const ALL: [Self; 6] = [
        Self::Rdp,
        Self::Ssh,
        Self::Vnc,
        Self::Telnet,
        Self::Ftp,
        Self::Sftp,
    ];

    /// Returns the lowercase identifier used in files and templates
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rdp => "rdp",
            Self::Ssh => "ssh",
            Self::Vnc => "vnc",
            Self::Telnet => "telnet",
            Self::Ftp => "ftp",
            Self::Sftp => "sftp",
        }
    }

    /// Returns the default port for this connection type
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Rdp => 3389,
            Self::Ssh | Self::Sftp => 22,
            Self::Vnc => 5900,
            Self::Telnet => 23,
            Self::Ftp => 21,
        }
    }

    /// Returns the human-readable name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Rdp => "Remote Desktop",
            Self::Ssh => "SSH",
            Self::Vnc => "VNC",
            Self::Telnet => "Telnet",
            Self::Ftp => "FTP",
            Self::Sftp => "SFTP",
        }
    }

    /// Parses a lowercase or uppercase identifier (`"ssh"`, `"RDP"`)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// RDP-specific options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdpOptions {
    /// Windows domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Resolution such as `1920x1080` or `fullscreen`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Color depth in bits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_screen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_clipboard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_drives: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_printers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_sound: Option<bool>,
}

/// SSH-specific options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshOptions {
    /// Path to the private key file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,
    /// Whether the private key should be used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_private_key: Option<bool>,
    /// Terminal type such as `xterm-256color`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
    /// Enable transport compression (`-C`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<bool>,
}

/// VNC-specific options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VncOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_connection: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<u8>,
    /// Compression level 0-9
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<u8>,
    /// Quality level 0-9
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

/// FTP and SFTP options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passive_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Remote directory to open after connecting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_path: Option<String>,
}

/// Telnet options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelnetOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Type-specific options, tagged by the profile's `type` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProtocolOptions {
    /// RDP options
    Rdp(RdpOptions),
    /// SSH options
    Ssh(SshOptions),
    /// VNC options
    Vnc(VncOptions),
    /// Telnet options
    Telnet(TelnetOptions),
    /// FTP options
    Ftp(FtpOptions),
    /// SFTP options
    Sftp(FtpOptions),
}

impl ProtocolOptions {
    /// Returns default options for the given connection type
    #[must_use]
    pub fn for_type(connection_type: ConnectionType) -> Self {
        match connection_type {
            ConnectionType::Rdp => Self::Rdp(RdpOptions::default()),
            ConnectionType::Ssh => Self::Ssh(SshOptions::default()),
            ConnectionType::Vnc => Self::Vnc(VncOptions::default()),
            ConnectionType::Telnet => Self::Telnet(TelnetOptions::default()),
            ConnectionType::Ftp => Self::Ftp(FtpOptions::default()),
            ConnectionType::Sftp => Self::Sftp(FtpOptions::default()),
        }
    }

    /// Returns the connection type these options belong to
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        match self {
            Self::Rdp(_) => ConnectionType::Rdp,
            Self::Ssh(_) => ConnectionType::Ssh,
            Self::Vnc(_) => ConnectionType::Vnc,
            Self::Telnet(_) => ConnectionType::Telnet,
            Self::Ftp(_) => ConnectionType::Ftp,
            Self::Sftp(_) => ConnectionType::Sftp,
        }
    }
}
