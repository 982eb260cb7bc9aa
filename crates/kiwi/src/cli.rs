//! Clap derive structures for the `kiwi` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kiwi -- administrator client for the kiwi device registry
#[derive(Debug, Parser)]
#[command(
    name = "kiwi",
    version,
    about = "Manage the kiwi device registry from the command line",
    long_about = "Administrator client for the kiwi device registry.\n\n\
        Log in once per profile; the bearer token is kept in the system\n\
        keyring (or a private file) and reused until the server rejects it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "KIWI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, env = "KIWI_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "KIWI_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "KIWI_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds, 0 to disable [default: from config]
    #[arg(long, env = "KIWI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token for this profile
    Login(LoginArgs),

    /// Discard the stored session token
    Logout,

    /// Show the administrator behind the stored session
    Whoami,

    /// Manage the administrator profile
    Profile(ProfileArgs),

    /// Manage registered devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Administrator email [default: profile email, else prompt]
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Profile ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Change display name and/or email
    Update {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New email address
        #[arg(long)]
        email: Option<String>,
    },

    /// Change the login password (prompts)
    Password,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices, optionally filtered by a server-side search
    #[command(alias = "ls")]
    List {
        /// Search text (name, MAC, ...). Blank lists everything.
        #[arg(long, short = 's')]
        search: Option<String>,
    },

    /// Show one device
    Get {
        /// Device ID
        id: String,
    },

    /// Register a new device
    Create(DeviceFields),

    /// Change fields of a device
    Update {
        /// Device ID
        id: String,

        #[command(flatten)]
        fields: DeviceUpdateFields,
    },

    /// Remove a device
    #[command(alias = "rm")]
    Delete {
        /// Device ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct DeviceFields {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// MAC address (aa:bb:cc:dd:ee:ff or aa-bb-cc-dd-ee-ff)
    #[arg(long)]
    pub mac: String,

    /// Transmit power in dBm (-100..=20)
    #[arg(long, allow_hyphen_values = true)]
    pub tx_power: String,

    /// Device type: vehicle, test-equipment, other
    #[arg(long = "type", value_name = "TYPE")]
    pub device_type: String,

    /// Lifecycle status: active, inactive
    #[arg(long, default_value = "active")]
    pub status: String,
}

#[derive(Debug, Args)]
pub struct DeviceUpdateFields {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// MAC address
    #[arg(long)]
    pub mac: Option<String>,

    /// Transmit power in dBm (-100..=20)
    #[arg(long, allow_hyphen_values = true)]
    pub tx_power: Option<String>,

    /// Device type: vehicle, test-equipment, other
    #[arg(long = "type", value_name = "TYPE")]
    pub device_type: Option<String>,

    /// Lifecycle status: active, inactive
    #[arg(long)]
    pub status: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the merged configuration
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
