//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Warden - access control, capability links and audit trail
#[derive(Parser, Debug)]
#[command(name = "warden", version)]
#[command(about = "Warden configuration and capability-link tool", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or edit configuration
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Issue and check capability tokens
    Token {
        /// Token action
        #[command(subcommand)]
        action: TokenAction,
    },
}

/// `warden config ...`
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved config file path
    Path,
    /// Write a default config file
    Init {
        /// Destination (defaults to the platform config path)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration with secrets redacted
    Show,
    /// Print one value by dotted key, e.g. `access.cache_timeout_ms`
    Get {
        /// Dotted key
        key: String,
    },
    /// Set one value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value; booleans and numbers are detected
        value: String,
    },
    /// Print the configuration as `WARDEN_*` variables
    Export {
        /// Format as `--env KEY=VALUE` for `docker run`
        #[arg(long)]
        docker_env: bool,
    },
}

/// `warden token ...`
#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Print the token for a resource and expiry
    Issue {
        /// Resource id
        #[arg(long)]
        id: String,
        /// Expiry, Unix seconds
        #[arg(long, allow_hyphen_values = true)]
        expires: i64,
        /// Issue timestamp carried in the link
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Check a token; exits non-zero unless it is valid
    Verify {
        /// Resource id
        #[arg(long)]
        id: String,
        /// Expiry, Unix seconds
        #[arg(long, allow_hyphen_values = true)]
        expires: i64,
        /// Token to check
        #[arg(long)]
        token: String,
        /// Issue timestamp carried in the link
        #[arg(long)]
        timestamp: Option<String>,
        /// Check as of this Unix time instead of now
        #[arg(long, allow_hyphen_values = true)]
        now: Option<i64>,
    },
    /// Print a share URL for a resource
    Link {
        /// URL the link parameters are appended to
        #[arg(long)]
        base_url: String,
        /// Resource id
        #[arg(long)]
        id: String,
        /// Lifetime in seconds (defaults to `capability.default_ttl_secs`)
        #[arg(long)]
        ttl_secs: Option<u64>,
        /// Print the link parameters as JSON as well
        #[arg(long)]
        json: bool,
    },
}
