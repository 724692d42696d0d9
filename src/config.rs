use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "192.168.88.1";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[clap(name = "routeros-probe", version, about)]
pub struct Cli {
    /// Path to an optional configuration file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override device host name or address
    #[clap(long, env = "MIKROTIK_HOST", global = true)]
    pub host: Option<String>,

    /// Override API user name
    #[clap(long, env = "MIKROTIK_USERNAME", global = true)]
    pub username: Option<String>,

    /// Override API password
    #[clap(long, env = "MIKROTIK_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Override API port (defaults to 80, or 443 with TLS)
    #[clap(long, env = "MIKROTIK_PORT", global = true)]
    pub port: Option<u16>,

    /// Talk to the REST API over HTTPS
    #[clap(long, env = "MIKROTIK_USE_SSL", global = true)]
    pub use_ssl: Option<bool>,

    /// Override the per-request timeout
    #[clap(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch device logs, filtered client-side
    Logs(LogsArgs),
    /// Show the system resource record
    System,
    /// Summarise memory and disk usage
    Health,
    /// Summarise addresses, routes and pools
    Network,
    /// Check that the REST API answers
    TestConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogKind {
    All,
    Debug,
    Error,
    Warning,
    Info,
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Filter expression, e.g. 'topics~"dhcp" and message~"assigned"'
    #[clap(long = "where")]
    pub where_clause: Option<String>,

    /// Restrict to one topic family
    #[clap(long, value_enum, default_value = "all")]
    pub kind: LogKind,

    /// Read a named memory buffer
    #[clap(long)]
    pub buffer: Option<String>,

    /// Ask the device for extra-info fields
    #[clap(long)]
    pub extra_info: bool,

    /// Return the number of entries instead of the entries
    #[clap(long)]
    pub count_only: bool,

    #[clap(long)]
    pub brief: bool,

    #[clap(long)]
    pub detail: bool,

    #[clap(long)]
    pub terse: bool,

    #[clap(long)]
    pub show_ids: bool,

    #[clap(long)]
    pub without_paging: bool,

    /// Comma-separated list of properties to return
    #[clap(long, value_delimiter = ',')]
    pub proplist: Vec<String>,

    /// Maximum number of entries to return
    #[clap(long, default_value_t = crate::logs::DEFAULT_MAX_RECORDS, conflicts_with = "no_limit")]
    pub max: usize,

    /// Return every matching entry
    #[clap(long)]
    pub no_limit: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: Option<u16>,
    pub use_ssl: bool,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            port: None,
            use_ssl: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.use_ssl { 443 } else { 80 })
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}/rest", scheme, self.host, self.effective_port())
    }
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => {
            let config_content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            parse_config(&config_content)?
        }
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(ref host) = cli.host {
        config.host = host.clone();
    }

    if let Some(ref username) = cli.username {
        config.username = username.clone();
    }

    if let Some(ref password) = cli.password {
        config.password = password.clone();
    }

    if let Some(port) = cli.port {
        config.port = Some(port);
    }

    if let Some(use_ssl) = cli.use_ssl {
        config.use_ssl = use_ssl;
    }

    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    if config.host.trim().is_empty() {
        anyhow::bail!("Device host must not be empty");
    }

    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse config file")
}
