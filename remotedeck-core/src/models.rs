//! Core data models for `RemoteDeck`
//!
//! This module defines the connection tree: profiles (leaves), groups
//! (internal nodes), the node sum type and the aggregate configuration.

mod config;
mod connection;
mod group;
mod node;
mod protocol;
mod search;
pub mod tree;

pub use config::{ConnectionConfig, CONFIG_VERSION};
pub use connection::{new_id, ConnectionProfile};
pub use group::ConnectionGroup;
pub use node::TreeNode;
pub use protocol::{
    ConnectionType, FtpOptions, ProtocolOptions, RdpOptions, SshOptions, TelnetOptions,
    VncOptions, DEFAULT_PORTS,
};
pub use search::SearchFilter;
