//! Clap derive structures for the `easypv` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// easypv -- read Easy PV solar stations, inverters and panels
#[derive(Debug, Parser)]
#[command(
    name = "easypv",
    version,
    about = "Read Easy PV solar installations from the command line",
    long_about = "Polls the Easy PV cloud service for stations, inverters and PV panels.\n\n\
        Log in once with `easypv login`; the session token is stored and the\n\
        password is never kept.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "EASYPV_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Session token (overrides the profile)
    #[arg(long, env = "EASYPV_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Service base URL (overrides the profile)
    #[arg(long, env = "EASYPV_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format [default: profile setting, else table]
    #[arg(long, short = 'o', env = "EASYPV_OUTPUT", global = true)]
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

    /// Request timeout in seconds
    #[arg(long, env = "EASYPV_TIMEOUT", global = true)]
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

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with account credentials and store the session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// List stations
    #[command(alias = "st")]
    Stations,

    /// List inverters
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// List PV panel inputs
    Panels(PanelsArgs),

    /// Keep polling and report entity changes and readings
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account user name (prompted when omitted)
    #[arg(long, short = 'u', env = "EASYPV_USERNAME")]
    pub username: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(long, env = "EASYPV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Store the token in the config file instead of the system keyring
    #[arg(long)]
    pub no_keyring: bool,
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Only devices of this station
    #[arg(long, short = 's')]
    pub station: Option<String>,
}

#[derive(Debug, Args)]
pub struct PanelsArgs {
    /// Only panels of this station
    #[arg(long, short = 's')]
    pub station: Option<String>,

    /// Only panels of this device
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (overrides the profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
