//! Protocol registry for looking up protocol handlers by ID or type

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::ConnectionType;

use super::{FtpProtocol, Protocol, RdpProtocol, SshProtocol, TelnetProtocol, VncProtocol};

/// Registry for protocol handlers
///
/// Initialized with every supported protocol. FTP and SFTP share one
/// handler.
pub struct ProtocolRegistry {
    protocols: HashMap<&'static str, Arc<dyn Protocol>>,
}

impl ProtocolRegistry {
    /// Creates a new protocol registry with all supported protocols
    #[must_use]
    pub fn new() -> Self {
        let mut protocols: HashMap<&'static str, Arc<dyn Protocol>> = HashMap::new();

        let handlers: [Arc<dyn Protocol>; 5] = [
            Arc::new(RdpProtocol::new()),
            Arc::new(SshProtocol::new()),
            Arc::new(VncProtocol::new()),
            Arc::new(FtpProtocol::new()),
            Arc::new(TelnetProtocol::new()),
        ];
        for handler in handlers {
            protocols.insert(handler.protocol_id(), handler);
        }

        Self { protocols }
    }

    /// Gets a protocol handler by its identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Protocol>> {
        self.protocols.get(id).cloned()
    }

    /// Gets the handler serving a connection type
    #[must_use]
    pub fn get_by_type(&self, connection_type: ConnectionType) -> Option<Arc<dyn Protocol>> {
        self.protocols
            .values()
            .find(|p| p.connection_types().contains(&connection_type))
            .cloned()
    }

    /// Returns all registered protocol IDs, sorted
    #[must_use]
    pub fn protocol_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.protocols.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered protocols
    #[must_use]
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Returns true if no protocols are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_handler() {
        let registry = ProtocolRegistry::new();
        assert_eq!(registry.len(), 5);
        for connection_type in ConnectionType::ALL {
            let handler = registry.get_by_type(connection_type).unwrap();
            assert!(!handler.candidate_clients(connection_type).is_empty());
        }
        assert_eq!(
            registry.get_by_type(ConnectionType::Sftp).unwrap().protocol_id(),
            "ftp"
        );
    }

    #[test]
    fn test_handler_ports_match_types() {
        let registry = ProtocolRegistry::new();
        for id in ["rdp", "ssh", "vnc", "ftp", "telnet"] {
            let handler = registry.get(id).unwrap();
            assert_eq!(
                handler.default_port(),
                handler.connection_types()[0].default_port()
            );
        }
    }
}
