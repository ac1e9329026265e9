//! `RemoteDeck` CLI - command-line host shell for the `RemoteDeck` launcher
//!
//! Provides commands for listing, creating, deleting, connecting, testing,
//! importing, exporting and backing up connections, and for inspecting the
//! external client table.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use remotedeck_core::config::{ConfigManager, LoadedConnections};
use remotedeck_core::crypto::EncryptionService;
use remotedeck_core::host::{HostShell, LocalHost};
use remotedeck_core::import::ConflictAction;
use remotedeck_core::launcher::ClientLauncher;
use remotedeck_core::models::{
    ConnectionConfig, ConnectionGroup, ConnectionProfile, ConnectionType, ProtocolOptions,
    SearchFilter, SshOptions,
};
use remotedeck_core::testing::ConnectionTester;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

/// `RemoteDeck` command-line interface for managing remote connections
#[derive(Parser)]
#[command(name = "remotedeck")]
#[command(author, version, about = "RemoteDeck command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding connections.json and settings.json
    #[arg(long, global = true, env = "REMOTEDECK_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Master password for password encryption (defaults to the machine key)
    #[arg(long, global = true, env = "REMOTEDECK_MASTER_PASSWORD", hide_env_values = true)]
    pub master_password: Option<String>,

    /// Let changes go through even if stored passwords cannot be decrypted
    /// with the current key; those passwords are erased
    #[arg(long, global = true)]
    pub discard_unreadable_passwords: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List connections
    #[command(about = "List connections in the configuration")]
    List {
        /// Output format for the connection list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,

        /// Filter by connection type (rdp, ssh, vnc, telnet, ftp, sftp)
        #[arg(short = 'T', long = "type")]
        connection_type: Option<String>,

        /// Filter by group name or ID
        #[arg(short, long)]
        group: Option<String>,

        /// Filter by tag (repeatable; all must match)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Keyword matched against name, host, username and description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a group
    #[command(about = "Create a new connection group")]
    NewGroup {
        /// Group name
        name: String,

        /// Parent group name or ID
        #[arg(short, long)]
        parent: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Create a connection
    #[command(about = "Add a new connection to a group")]
    New {
        /// Name for the new connection
        #[arg(short, long)]
        name: String,

        /// Host address (hostname or IP)
        #[arg(short = 'H', long)]
        host: String,

        /// Port number (defaults to the type's default port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Connection type (rdp, ssh, vnc, telnet, ftp, sftp)
        #[arg(short = 'T', long = "type", default_value = "ssh")]
        connection_type: String,

        /// Group name or ID
        #[arg(short, long)]
        group: String,

        /// Username for authentication
        #[arg(short, long)]
        user: Option<String>,

        /// Password (stored encrypted)
        #[arg(long)]
        password: Option<String>,

        /// Path to SSH private key file
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// Tag (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// Delete a connection or group
    #[command(about = "Delete a connection or group by name or ID")]
    Delete {
        /// Connection or group name, or ID
        name: String,
    },

    /// Launch the external client for a connection
    #[command(about = "Start the configured client for a connection")]
    Connect {
        /// Connection name or ID
        name: String,

        /// Print the program and arguments instead of launching
        #[arg(long)]
        dry_run: bool,
    },

    /// Test TCP reachability
    #[command(about = "Test reachability of a connection")]
    Test {
        /// Connection name or ID (use "all" to test all connections)
        name: String,

        /// Probe timeout in seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },

    /// Import connections from an export file
    #[command(about = "Merge connections from a RemoteDeck export file")]
    Import {
        /// Input file path
        file: PathBuf,

        /// What to do with name/host collisions
        #[arg(long, default_value = "skip", value_enum)]
        on_conflict: ConflictArg,
    },

    /// Export connections to a file
    #[command(about = "Export connections to a JSON file")]
    Export {
        /// Output file path
        output: PathBuf,

        /// Include passwords in plaintext
        #[arg(long)]
        include_passwords: bool,
    },

    /// Write a backup of the current connections
    #[command(about = "Create a timestamped backup")]
    Backup,

    /// Show the external client table
    #[command(about = "Show configured clients")]
    Clients {
        /// Ask the system whether each program is installed
        #[arg(short, long)]
        check: bool,
    },
}

/// Output format for the list command
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

/// Conflict policy for import
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConflictArg {
    /// Keep the existing connection
    Skip,
    /// Replace the existing connection's fields
    Overwrite,
    /// Add the imported connection alongside
    KeepBoth,
}

impl From<ConflictArg> for ConflictAction {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Skip => Self::Skip,
            ConflictArg::Overwrite => Self::Overwrite,
            ConflictArg::KeepBoth => Self::KeepBoth,
        }
    }
}

/// Shared services built once per invocation
struct Context {
    host: Arc<dyn HostShell>,
    manager: ConfigManager,
    discard_unreadable: bool,
}

impl Context {
    fn new(cli: &Cli) -> Self {
        let host: Arc<dyn HostShell> = Arc::new(
            cli.data_dir
                .as_deref()
                .map_or_else(LocalHost::new, LocalHost::with_data_dir),
        );
        let mut manager = ConfigManager::new(host.clone(), Arc::new(EncryptionService::new()));
        if let Some(password) = cli.master_password.clone() {
            manager = manager.with_master_password(SecretString::from(password));
        }
        Self {
            host,
            manager,
            discard_unreadable: cli.discard_unreadable_passwords,
        }
    }

    async fn load(&self) -> Result<ConnectionConfig, CliError> {
        let LoadedConnections { config, warnings } = self
            .manager
            .load_connections()
            .await
            .map_err(|e| CliError::Config(format!("Failed to load connections: {e}")))?;
        for warning in warnings {
            eprintln!("Warning: {warning}");
        }
        Ok(config)
    }

    /// Loads for a command that writes; stops before any change if saving
    /// would erase passwords the current key cannot decrypt
    async fn load_for_update(&self) -> Result<ConnectionConfig, CliError> {
        let config = self.load().await?;
        let unreadable = self.manager.unreadable_passwords();
        if unreadable == 0 {
            return Ok(config);
        }
        if self.discard_unreadable {
            self.manager.discard_unreadable_passwords();
            eprintln!("Warning: {unreadable} undecryptable password(s) will be erased");
            return Ok(config);
        }
        Err(CliError::Config(format!(
            "{unreadable} stored password(s) cannot be decrypted with this master password, so nothing \
             was changed. Check --master-password, or pass --discard-unreadable-passwords to erase them"
        )))
    }

    async fn save(&self, config: &ConnectionConfig) -> Result<(), CliError> {
        self.manager
            .save_connections(config)
            .await
            .map_err(|e| CliError::Config(format!("Failed to save connections: {e}")))
    }

    async fn launcher(&self) -> Result<ClientLauncher, CliError> {
        let mut launcher = ClientLauncher::new(self.host.clone());
        launcher
            .initialize_clients(&self.manager)
            .await
            .map_err(|e| CliError::Config(format!("Failed to load client table: {e}")))?;
        Ok(launcher)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(data_dir = ?cli.data_dir, "Starting");
    let ctx = Context::new(&cli);

    let result = match cli.command {
        Commands::List {
            format,
            connection_type,
            group,
            tag,
            search,
        } => cmd_list(&ctx, format, connection_type.as_deref(), group.as_deref(), tag, search).await,
        Commands::NewGroup {
            name,
            parent,
            description,
        } => cmd_new_group(&ctx, &name, parent.as_deref(), description).await,
        Commands::New {
            name,
            host,
            port,
            connection_type,
            group,
            user,
            password,
            key,
            tag,
        } => {
            let fields = NewConnection {
                name,
                host,
                port,
                connection_type,
                user,
                password,
                key,
                tags: tag,
            };
            cmd_new(&ctx, &group, fields).await
        }
        Commands::Delete { name } => cmd_delete(&ctx, &name).await,
        Commands::Connect { name, dry_run } => cmd_connect(&ctx, &name, dry_run).await,
        Commands::Test { name, timeout } => cmd_test(&ctx, &name, timeout).await,
        Commands::Import { file, on_conflict } => cmd_import(&ctx, &file, on_conflict.into()).await,
        Commands::Export {
            output,
            include_passwords,
        } => cmd_export(&ctx, &output, include_passwords).await,
        Commands::Backup => cmd_backup(&ctx).await,
        Commands::Clients { check } => cmd_clients(&ctx, check).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// List connections command handler
async fn cmd_list(
    ctx: &Context,
    format: OutputFormat,
    connection_type: Option<&str>,
    group: Option<&str>,
    tags: Vec<String>,
    keyword: Option<String>,
) -> Result<(), CliError> {
    let config = ctx.load().await?;

    let filter = SearchFilter {
        keyword,
        connection_type: connection_type.map(parse_type).transpose()?,
        tags,
        group_id: group
            .map(|g| {
                resolve_group_id(&config, g).ok_or_else(|| CliError::Group(format!("Group not found: {g}")))
            })
            .transpose()?,
    };
    let profiles = config.search(&filter);

    match format {
        OutputFormat::Table => println!("{}", format_table(&profiles)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&profiles)
                .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))?
        ),
    }
    Ok(())
}

/// Format connections as a table string
#[must_use]
pub fn format_table(profiles: &[&ConnectionProfile]) -> String {
    if profiles.is_empty() {
        return "No connections found.".to_string();
    }

    let mut output = String::new();
    let name_width = profiles.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    let host_width = profiles.iter().map(|p| p.host.len()).max().unwrap_or(4).max(4);
    let type_width = 6;
    let port_width = 5;

    let _ = writeln!(
        output,
        "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<type_width$}  LAST CONNECTED",
        "NAME", "HOST", "PORT", "TYPE"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<host_width$}  {:-<port_width$}  {:-<type_width$}  {:-<14}",
        "", "", "", "", ""
    );
    for profile in profiles {
        let last = profile
            .last_connected
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<host_width$}  {:<port_width$}  {:<type_width$}  {last}",
            profile.name,
            profile.host,
            profile.port,
            profile.connection_type().to_string()
        );
    }

    output.trim_end().to_string()
}

/// Create group command handler
async fn cmd_new_group(
    ctx: &Context,
    name: &str,
    parent: Option<&str>,
    description: Option<String>,
) -> Result<(), CliError> {
    let mut config = ctx.load_for_update().await?;
    let parent_id = parent
        .map(|p| resolve_group_id(&config, p).ok_or_else(|| CliError::Group(format!("Group not found: {p}"))))
        .transpose()?;

    let mut group = ConnectionGroup::new(name);
    group.description = description;
    let id = config
        .add_group(parent_id.as_deref(), group)
        .map_err(|e| CliError::Group(e.to_string()))?;
    ctx.save(&config).await?;

    println!("Created group '{name}' with ID {id}");
    Ok(())
}

/// Fields of a connection created from the command line
struct NewConnection {
    name: String,
    host: String,
    port: Option<u16>,
    connection_type: String,
    user: Option<String>,
    password: Option<String>,
    key: Option<PathBuf>,
    tags: Vec<String>,
}

/// Create connection command handler
async fn cmd_new(ctx: &Context, group: &str, fields: NewConnection) -> Result<(), CliError> {
    let connection_type = parse_type(&fields.connection_type)?;
    let mut config = ctx.load_for_update().await?;
    let group_id =
        resolve_group_id(&config, group).ok_or_else(|| CliError::Group(format!("Group not found: {group}")))?;

    let port = fields.port.unwrap_or_else(|| connection_type.default_port());
    let mut profile = ConnectionProfile::new(&fields.name, connection_type, &fields.host, port)
        .with_username(fields.user.unwrap_or_default())
        .with_password(fields.password.unwrap_or_default())
        .with_tags(fields.tags);
    if let Some(key) = fields.key {
        if connection_type != ConnectionType::Ssh {
            return Err(CliError::Config("--key only applies to SSH connections".to_string()));
        }
        profile = profile.with_options(ProtocolOptions::Ssh(SshOptions {
            private_key_path: Some(key),
            use_private_key: Some(true),
            ..SshOptions::default()
        }));
    }

    let id = config
        .add_profile(&group_id, profile)
        .map_err(|e| CliError::Config(format!("Invalid connection: {e}")))?;
    ctx.save(&config).await?;

    println!("Created connection '{}' with ID {id}", fields.name);
    Ok(())
}

/// Delete command handler
async fn cmd_delete(ctx: &Context, name: &str) -> Result<(), CliError> {
    let mut config = ctx.load_for_update().await?;
    let id = config
        .find_profile_by_name_or_id(name)
        .map(|p| p.id.clone())
        .or_else(|| resolve_group_id(&config, name))
        .ok_or_else(|| CliError::ConnectionNotFound(name.to_string()))?;

    let removed = config
        .remove_node(&id)
        .ok_or_else(|| CliError::ConnectionNotFound(name.to_string()))?;
    ctx.save(&config).await?;

    println!("Deleted '{}'", removed.name());
    Ok(())
}

/// Connect command handler
async fn cmd_connect(ctx: &Context, name: &str, dry_run: bool) -> Result<(), CliError> {
    let mut config = if dry_run {
        ctx.load().await?
    } else {
        ctx.load_for_update().await?
    };
    let profile = config
        .find_profile_by_name_or_id(name)
        .cloned()
        .ok_or_else(|| CliError::ConnectionNotFound(name.to_string()))?;
    let launcher = ctx.launcher().await?;

    if dry_run {
        let plan = launcher
            .plan(&profile)
            .map_err(|e| CliError::Launch(e.to_string()))?;
        println!("Client:  {} ({})", plan.client_name, plan.client_key);
        println!("Program: {}", plan.program.display());
        println!("Args:    {}", redact_args(&plan.args, &profile.password).join(" "));
        return Ok(());
    }

    let result = launcher.connect(&profile).await;
    if !result.success {
        return Err(CliError::Launch(
            result
                .message
                .or(result.error)
                .unwrap_or_else(|| "launch failed".to_string()),
        ));
    }
    ctx.manager
        .record_connection(&mut config, &profile.id)
        .await
        .map_err(|e| CliError::Config(format!("Failed to record connection: {e}")))?;
    if let Some(message) = result.message {
        println!("{message}");
    }
    Ok(())
}

/// Replaces arguments containing the password
fn redact_args(args: &[String], password: &str) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if !password.is_empty() && arg.contains(password) {
                arg.replace(password, "********")
            } else {
                arg.clone()
            }
        })
        .collect()
}

/// Test connectivity command handler
async fn cmd_test(ctx: &Context, name: &str, timeout_secs: u64) -> Result<(), CliError> {
    let config = ctx.load().await?;
    let tester = ConnectionTester::new().with_timeout(Duration::from_secs(timeout_secs));

    let profiles: Vec<ConnectionProfile> = if name.eq_ignore_ascii_case("all") {
        config.profiles().into_iter().cloned().collect()
    } else {
        vec![config
            .find_profile_by_name_or_id(name)
            .cloned()
            .ok_or_else(|| CliError::ConnectionNotFound(name.to_string()))?]
    };
    if profiles.is_empty() {
        println!("No connections to test.");
        return Ok(());
    }

    let results = tester.test_batch(&profiles).await;
    let mut failed = 0;
    for (profile, result) in profiles.iter().zip(&results) {
        if result.success {
            println!("✓ {}: {} ({} ms)", profile.name, result.details, result.response_time_ms);
        } else {
            failed += 1;
            println!(
                "✗ {}: {} - {}",
                profile.name,
                result.details,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if failed > 0 {
        return Err(CliError::TestFailed(format!(
            "{failed} of {} connections unreachable",
            results.len()
        )));
    }
    Ok(())
}

/// Import command handler
async fn cmd_import(ctx: &Context, file: &Path, on_conflict: ConflictAction) -> Result<(), CliError> {
    ctx.load_for_update().await?;
    let result = ctx.manager.import_connections(file).await;
    let summary = match result.into_result() {
        Ok(Some(summary)) => summary,
        Ok(None) => return Err(CliError::Import("import returned no summary".to_string())),
        Err(e) => return Err(CliError::Import(e)),
    };

    println!("Imported {} new item(s)", summary.imported);
    if summary.conflicts.is_empty() {
        return Ok(());
    }

    for conflict in &summary.conflicts {
        println!("  conflict: {} ({})", conflict.path, conflict.existing.host);
    }
    if on_conflict == ConflictAction::Skip {
        println!("Skipped {} conflicting connection(s)", summary.conflicts.len());
        return Ok(());
    }

    let resolutions: Vec<_> = summary
        .conflicts
        .into_iter()
        .map(|conflict| (conflict, on_conflict))
        .collect();
    let changed = ctx
        .manager
        .apply_resolutions(&resolutions)
        .await
        .map_err(|e| CliError::Import(format!("Failed to resolve conflicts: {e}")))?;
    println!("Resolved {changed} conflict(s) with {on_conflict:?}");
    Ok(())
}

/// Export command handler
async fn cmd_export(ctx: &Context, output: &Path, include_passwords: bool) -> Result<(), CliError> {
    let config = ctx.load().await?;
    let result = ctx
        .manager
        .export_connections(&config, output, include_passwords)
        .await;
    if !result.success {
        return Err(CliError::Export(
            result.message.or(result.error).unwrap_or_default(),
        ));
    }
    if include_passwords {
        eprintln!("Warning: the export contains plaintext passwords");
    }
    println!("Exported to {}", output.display());
    Ok(())
}

/// Backup command handler
async fn cmd_backup(ctx: &Context) -> Result<(), CliError> {
    let result = ctx.manager.create_backup().await;
    match (result.success, result.data) {
        (true, Some(path)) => {
            println!("Backup written to {}", path.display());
            Ok(())
        }
        _ => Err(CliError::Config(
            result
                .message
                .or(result.error)
                .unwrap_or_else(|| "backup failed".to_string()),
        )),
    }
}

/// Client table command handler
async fn cmd_clients(ctx: &Context, check: bool) -> Result<(), CliError> {
    let launcher = ctx.launcher().await?;

    if check {
        for status in launcher.check_clients().await {
            let state = match (status.enabled, status.installed) {
                (true, true) => "ready",
                (true, false) => "not found",
                (false, _) => "disabled",
            };
            println!("{:<20} {:<28} {state}", status.key, status.name);
        }
        return Ok(());
    }

    let available = launcher.available_clients();
    for connection_type in ConnectionType::ALL {
        let names: Vec<&str> = available
            .get(&connection_type)
            .map(|clients| clients.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default();
        let names = if names.is_empty() {
            "(none)".to_string()
        } else {
            names.join(", ")
        };
        println!("{:<7} {names}", connection_type.to_string());
    }
    Ok(())
}

/// Parses a connection type argument
fn parse_type(value: &str) -> Result<ConnectionType, CliError> {
    ConnectionType::parse(value).ok_or_else(|| {
        CliError::Config(format!(
            "Unknown connection type '{value}'. Use rdp, ssh, vnc, telnet, ftp or sftp"
        ))
    })
}

/// Resolves a group by ID, then by case-insensitive name anywhere in the tree
fn resolve_group_id(config: &ConnectionConfig, key: &str) -> Option<String> {
    fn walk<'a>(groups: impl Iterator<Item = &'a ConnectionGroup>, name: &str) -> Option<String> {
        for group in groups {
            if group.name.to_lowercase() == name {
                return Some(group.id.clone());
            }
            if let Some(id) = walk(group.groups(), name) {
                return Some(id);
            }
        }
        None
    }

    if config.find_group(key).is_some() {
        return Some(key.to_string());
    }
    walk(config.groups.iter(), &key.to_lowercase())
}

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - test failed or connection not found
    pub const CONNECTION_FAILURE: i32 = 2;
    /// Import or export failure
    pub const IMPORT_FAILURE: i32 = 3;
    /// The external client could not be launched
    pub const LAUNCH_FAILURE: i32 = 4;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Group error
    #[error("Group error: {0}")]
    Group(String),

    /// Import error
    #[error("Import error: {0}")]
    Import(String),

    /// Export error
    #[error("Export error: {0}")]
    Export(String),

    /// Launch error
    #[error("Launch error: {0}")]
    Launch(String),

    /// Connection test failed
    #[error("Connection test failed: {0}")]
    TestFailed(String),
}

impl CliError {
    /// Returns the process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TestFailed(_) | Self::ConnectionNotFound(_) => exit_codes::CONNECTION_FAILURE,
            Self::Import(_) | Self::Export(_) => exit_codes::IMPORT_FAILURE,
            Self::Launch(_) => exit_codes::LAUNCH_FAILURE,
            Self::Config(_) | Self::Group(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
