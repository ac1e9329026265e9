//! External client launching
//!
//! The launcher turns a connection profile into a running external client:
//! the protocol handler names the candidate clients, the client table says
//! which are configured, and the chosen client's argument template is
//! rendered into an argument vector.

mod arguments;
mod clients;
mod dispatcher;

pub use arguments::{escape_value, render_arguments, tokenize};
pub use clients::{default_client_configs, known_client, serves, KnownClient, KNOWN_CLIENTS};
pub use dispatcher::{ClientLauncher, ClientStatus, LaunchPlan};
