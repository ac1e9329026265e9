//! Known external clients and the built-in default client table

use std::collections::BTreeMap;

use crate::config::settings::ClientConfig;
use crate::models::ConnectionType;

use ConnectionType::{Ftp, Rdp, Sftp, Ssh, Telnet, Vnc};

/// A client program `RemoteDeck` knows how to drive
#[derive(Debug, Clone, Copy)]
pub struct KnownClient {
    /// Key in the client table, also the logical executable name
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Connection types the program can open
    pub serves: &'static [ConnectionType],
    /// Argument template used when the configured one is missing
    pub template: &'static str,
}

const FILE_TRANSFER: &str = "{protocol}://{username}:{password}@{host}:{port}{initialpath}";
const VNC_TARGET: &str = "{host}::{port}";

/// Every known client, grouped by protocol
pub const KNOWN_CLIENTS: &[KnownClient] = &[
    KnownClient {
        key: "mstsc",
        name: "Remote Desktop Connection",
        serves: &[Rdp],
        template: "/v:{host}:{port}",
    },
    KnownClient {
        key: "xfreerdp",
        name: "FreeRDP",
        serves: &[Rdp],
        template: "/v:{host}:{port} /u:{username} /p:{password}",
    },
    KnownClient {
        key: "rdesktop",
        name: "rdesktop",
        serves: &[Rdp],
        template: "-u {username} -p {password} {host}:{port}",
    },
    KnownClient {
        key: "xshell",
        name: "Xshell",
        serves: &[Ssh],
        template: "-url ssh://{username}:{password}@{host}:{port}",
    },
    KnownClient {
        key: "securecrt",
        name: "SecureCRT",
        serves: &[Ssh],
        template: "/SSH2 /P {port} /L {username} /PASSWORD {password} {host}",
    },
    KnownClient {
        key: "putty",
        name: "PuTTY",
        serves: &[Ssh],
        template: "-ssh {username}@{host} -P {port} -pw {password}",
    },
    KnownClient {
        key: "kitty",
        name: "KiTTY",
        serves: &[Ssh],
        template: "-ssh {username}@{host} -P {port} -pw {password}",
    },
    KnownClient {
        key: "ssh",
        name: "OpenSSH",
        serves: &[Ssh],
        template: "{compression} -p {port} {username}@{host}",
    },
    KnownClient {
        key: "radmin",
        name: "Radmin Viewer",
        serves: &[Vnc],
        template: "/connect:{host}:{port}",
    },
    KnownClient {
        key: "vncviewer",
        name: "VNC Viewer",
        serves: &[Vnc],
        template: VNC_TARGET,
    },
    KnownClient {
        key: "realvnc-vncviewer",
        name: "RealVNC Viewer",
        serves: &[Vnc],
        template: VNC_TARGET,
    },
    KnownClient {
        key: "tightvnc-vncviewer",
        name: "TightVNC Viewer",
        serves: &[Vnc],
        template: VNC_TARGET,
    },
    KnownClient {
        key: "ultravnc",
        name: "UltraVNC Viewer",
        serves: &[Vnc],
        template: "{host}:{port}",
    },
    KnownClient {
        key: "turbovnc",
        name: "TurboVNC Viewer",
        serves: &[Vnc],
        template: VNC_TARGET,
    },
    KnownClient {
        key: "xftp",
        name: "Xftp",
        serves: &[Ftp, Sftp],
        template: FILE_TRANSFER,
    },
    KnownClient {
        key: "winscp",
        name: "WinSCP",
        serves: &[Ftp, Sftp],
        template: FILE_TRANSFER,
    },
    KnownClient {
        key: "filezilla",
        name: "FileZilla",
        serves: &[Ftp, Sftp],
        template: FILE_TRANSFER,
    },
    KnownClient {
        key: "ftp",
        name: "ftp",
        serves: &[Ftp],
        template: "{host} {port}",
    },
    KnownClient {
        key: "telnet",
        name: "Telnet",
        serves: &[Telnet],
        template: "{host} {port}",
    },
];

/// Default (key, path) per protocol handler
#[cfg(windows)]
const DEFAULTS: [(&str, &str); 5] = [
    ("mstsc", r"C:\Windows\System32\mstsc.exe"),
    ("putty", "putty.exe"),
    ("vncviewer", "vncviewer.exe"),
    ("winscp", "WinSCP.exe"),
    ("telnet", "telnet.exe"),
];

#[cfg(not(windows))]
const DEFAULTS: [(&str, &str); 5] = [
    ("xfreerdp", "xfreerdp"),
    ("ssh", "ssh"),
    ("vncviewer", "vncviewer"),
    ("filezilla", "filezilla"),
    ("telnet", "telnet"),
];

/// Looks up a known client by key or executable name
///
/// Matching ignores case and a trailing `.exe`.
#[must_use]
pub fn known_client(executable: &str) -> Option<&'static KnownClient> {
    let name = executable.trim().to_ascii_lowercase();
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    KNOWN_CLIENTS.iter().find(|c| c.key == name)
}

/// Connection types served by an executable key
#[must_use]
pub fn serves(executable: &str) -> &'static [ConnectionType] {
    known_client(executable).map_or(&[], |c| c.serves)
}

/// Built-in client table, one enabled client per protocol handler
#[must_use]
pub fn default_client_configs() -> BTreeMap<String, ClientConfig> {
    DEFAULTS
        .iter()
        .filter_map(|(key, path)| {
            let known = known_client(key)?;
            Some((
                (*key).to_string(),
                ClientConfig::new(known.name, known.key, *path, known.template),
            ))
        })
        .collect()
}
