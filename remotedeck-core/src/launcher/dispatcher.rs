//! Client launcher
//!
//! Picks the external client for a profile from the configured client table
//! and starts it detached through the host shell.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::settings::ClientConfig;
use crate::config::ConfigManager;
use crate::error::{ConfigResult, LaunchError, LaunchResult};
use crate::host::HostShell;
use crate::models::{ConnectionProfile, ConnectionType};
use crate::protocol::ProtocolRegistry;
use crate::result::OperationResult;

use super::arguments::render_arguments;
use super::clients::{default_client_configs, known_client, serves};

/// A resolved launch: which client, with what arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Key of the chosen client in the client table
    pub client_key: String,
    /// Display name of the chosen client
    pub client_name: String,
    /// Program path handed to the host shell
    pub program: std::path::PathBuf,
    /// Rendered argument vector
    pub args: Vec<String>,
}

/// Availability of one configured client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStatus {
    pub key: String,
    pub name: String,
    pub enabled: bool,
    /// The host found the program
    pub installed: bool,
}

/// Dispatches connect requests to external clients
pub struct ClientLauncher {
    host: Arc<dyn HostShell>,
    registry: ProtocolRegistry,
    clients: BTreeMap<String, ClientConfig>,
}

impl ClientLauncher {
    /// Creates a launcher using the built-in client table
    #[must_use]
    pub fn new(host: Arc<dyn HostShell>) -> Self {
        Self {
            host,
            registry: ProtocolRegistry::new(),
            clients: default_client_configs(),
        }
    }

    /// Loads the client table from settings
    ///
    /// An empty table is seeded from the defaults and saved back.
    ///
    /// # Errors
    /// Returns an error if settings cannot be read or the seed cannot be saved
    pub async fn initialize_clients(&mut self, manager: &ConfigManager) -> ConfigResult<()> {
        let mut settings = manager.load_settings().await?;
        if settings.client_paths.is_empty() {
            settings.client_paths = default_client_configs();
            manager.save_settings(&settings).await?;
            info!(count = settings.client_paths.len(), "Seeded default client configuration");
        }
        self.clients = settings.client_paths;
        Ok(())
    }

    /// Returns the client table
    #[must_use]
    pub fn client_configs(&self) -> &BTreeMap<String, ClientConfig> {
        &self.clients
    }

    /// Replaces the client table
    pub fn update_client_configs(&mut self, clients: BTreeMap<String, ClientConfig>) {
        self.clients = clients;
    }

    /// Returns the protocol registry
    #[must_use]
    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    /// Usable clients grouped by the connection types they serve
    #[must_use]
    pub fn available_clients(&self) -> BTreeMap<ConnectionType, Vec<ClientConfig>> {
        let mut available: BTreeMap<ConnectionType, Vec<ClientConfig>> = BTreeMap::new();
        for client in self.clients.values().filter(|c| c.is_usable()) {
            for connection_type in serves(&client.executable) {
                available
                    .entry(*connection_type)
                    .or_default()
                    .push(client.clone());
            }
        }
        available
    }

    /// Asks the host whether each client's program exists
    pub async fn check_clients(&self) -> Vec<ClientStatus> {
        let mut statuses = Vec::with_capacity(self.clients.len());
        for (key, client) in &self.clients {
            let installed =
                !client.path.trim().is_empty() && self.host.check_program(&client.resolved_path()).await;
            statuses.push(ClientStatus {
                key: key.clone(),
                name: client.name.clone(),
                enabled: client.enabled,
                installed,
            });
        }
        statuses
    }

    /// First usable client for a connection type, in handler priority order
    ///
    /// # Errors
    /// Returns `UnsupportedType` if no handler serves the type, or
    /// `NoClient` if no candidate is enabled with a path
    pub fn select_client(
        &self,
        connection_type: ConnectionType,
    ) -> LaunchResult<(&str, &ClientConfig)> {
        let handler = self
            .registry
            .get_by_type(connection_type)
            .ok_or_else(|| LaunchError::UnsupportedType(connection_type.to_string()))?;
        let candidates = handler.candidate_clients(connection_type);

        candidates
            .iter()
            .find_map(|key| {
                self.clients
                    .get_key_value(*key)
                    .filter(|(_, client)| client.is_usable())
                    .map(|(key, client)| (key.as_str(), client))
            })
            .ok_or_else(|| LaunchError::NoClient {
                protocol: connection_type,
                tried: candidates.join(", "),
            })
    }

    /// Resolves the client and arguments for a profile without launching
    ///
    /// # Errors
    /// Returns a `LaunchError` if the profile is invalid, no client is
    /// usable, or the template cannot be rendered
    pub fn plan(&self, profile: &ConnectionProfile) -> LaunchResult<LaunchPlan> {
        let connection_type = profile.connection_type();
        let handler = self
            .registry
            .get_by_type(connection_type)
            .ok_or_else(|| LaunchError::UnsupportedType(connection_type.to_string()))?;
        handler.validate_connection(profile)?;

        let (key, client) = self.select_client(connection_type)?;
        let template = match &client.arguments_template {
            Some(template) => template.as_str(),
            None => {
                known_client(&client.executable)
                    .ok_or_else(|| {
                        LaunchError::InvalidTemplate(format!("{} has no argument template", client.name))
                    })?
                    .template
            }
        };
        let args = render_arguments(template, profile, &handler.placeholders(profile))?;

        Ok(LaunchPlan {
            client_key: key.to_string(),
            client_name: client.name.clone(),
            program: client.resolved_path(),
            args,
        })
    }

    /// Launches the client for a profile
    ///
    /// Never fails outright: problems are reported in the result.
    pub async fn connect(&self, profile: &ConnectionProfile) -> OperationResult<()> {
        let connection_type = profile.connection_type();
        match self.launch(profile).await {
            Ok(client_name) => {
                info!(profile = %profile.name, client = %client_name, "Client started");
                OperationResult::ok(()).with_message(format!(
                    "{connection_type} connection started ({client_name})"
                ))
            }
            Err(e) => {
                warn!(profile = %profile.name, error = %e, "Connect failed");
                let message = match &e {
                    LaunchError::NoClient { .. } => format!(
                        "No available {connection_type} client; configure client path in settings"
                    ),
                    LaunchError::SpawnFailed { client, .. } => format!("{client} failed to start"),
                    _ => format!("Cannot start {connection_type} connection"),
                };
                OperationResult::failure(e.to_string(), Some(message))
            }
        }
    }

    async fn launch(&self, profile: &ConnectionProfile) -> LaunchResult<String> {
        let plan = self.plan(profile)?;
        debug!(
            client = %plan.client_key,
            program = %plan.program.display(),
            argc = plan.args.len(),
            "Launching client"
        );
        self.host
            .launch_program(&plan.program, &plan.args)
            .await
            .map_err(|e| LaunchError::SpawnFailed {
                client: plan.client_name.clone(),
                reason: e.to_string(),
            })?;
        Ok(plan.client_name)
    }
}
