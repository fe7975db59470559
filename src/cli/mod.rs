//! CLI module for stingray
//!
//! Provides subcommands for pool and node management:
//! - `stingray pools` - List pools
//! - `stingray pool <name>` - Show a pool's nodes and their state
//! - `stingray drain` / `undrain` - Change node draining state
//! - `stingray add-node` / `remove-node` - Change pool membership
//! - `stingray stats <pool>` - Node statistics merged across the cluster
//! - `stingray members` - List cluster members
//! - `stingray context` - Manage connection contexts

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "stingray")]
#[command(about = "Manage traffic manager pools and nodes through the REST API")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.stingray/config)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context to use instead of the current one
    #[arg(long, global = true, env = "STINGRAY_CONTEXT")]
    pub context: Option<String>,

    /// Path to a .env file for loading credentials
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides; anything unset comes from the selected context
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Traffic manager host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// REST API port (default: 9070)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// REST API user
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// REST API password (default: read from STINGRAY_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// REST API version (default: 2.0)
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Accept self-signed certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all configured pools
    #[command(name = "pools", visible_alias = "ls")]
    Pools,

    /// Show a pool's nodes and their state
    Pool {
        /// Pool name
        name: String,
    },

    /// Delete a pool
    Delete {
        /// Pool name
        name: String,
    },

    /// Put nodes into draining state
    Drain {
        /// Pool name
        pool: String,

        /// Nodes as address:port
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Return draining nodes to active state
    Undrain {
        /// Pool name
        pool: String,

        /// Nodes as address:port
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Add a node to a pool
    AddNode(NodeArgs),

    /// Remove a node from a pool
    RemoveNode(NodeArgs),

    /// Show node statistics for a pool, merged across the cluster
    Stats {
        /// Pool name
        pool: String,
    },

    /// List cluster members (excluding the local one)
    Members,

    /// Manage connection contexts
    Context(ContextArgs),
}

/// A node addressed within a pool
#[derive(Args, Debug)]
pub struct NodeArgs {
    /// Pool name
    pub pool: String,

    /// Node address (IP or hostname)
    pub address: String,

    /// Node service port, e.g. 80 or 443
    #[arg(id = "node_port", value_name = "PORT")]
    pub node_port: u16,
}

/// Arguments for the context command
#[derive(Parser, Debug)]
pub struct ContextArgs {
    #[command(subcommand)]
    pub action: ContextAction,
}

#[derive(Subcommand, Debug)]
pub enum ContextAction {
    /// List all contexts
    List,

    /// Show the current context
    Current,

    /// Switch to a context
    Use {
        /// Context name
        name: String,
    },

    /// Add a new context
    Add {
        /// Context name
        name: String,

        /// Traffic manager host
        address: String,

        /// REST API port
        #[arg(long)]
        api_port: Option<u16>,

        /// REST API user
        #[arg(long)]
        user: Option<String>,

        /// Environment variable holding the password
        #[arg(long)]
        password_env: Option<String>,

        /// Accept self-signed certificates
        #[arg(long)]
        allow_self_signed: bool,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a context
    Delete {
        /// Context name
        name: String,
    },
}
