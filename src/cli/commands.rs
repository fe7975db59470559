//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results and formatted output, I/O (printing,
//! saving the config file) is handled by the caller

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::display::*;
use super::{Commands, ConnectionArgs, OutputFormat};
use crate::client::{ConnectionSettings, Transport};
use crate::cluster::ClusterAggregator;
use crate::context::{self, Config, Context, ContextError};
use crate::error::StingrayError;
use crate::pools::{node_identity, NodeAction, Pools};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    Api(#[from] StingrayError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Connection resolution (pure)
// ============================================================================

/// Build connection settings from flags, then the selected context.
///
/// `lookup` resolves environment variables so the password source can be
/// tested without touching the process environment.
pub fn resolve_connection<F>(
    config: &Config,
    context_name: Option<&str>,
    args: &ConnectionArgs,
    lookup: F,
) -> CommandResult<ConnectionSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let ctx = config.selected_context(context_name)?;

    let host = args
        .host
        .clone()
        .or_else(|| ctx.map(|c| c.host.clone()))
        .ok_or_else(|| {
            CommandError::Config("no host given: pass --host or select a context".to_string())
        })?;

    let username = args
        .username
        .clone()
        .or_else(|| ctx.and_then(|c| c.username.clone()))
        .ok_or_else(|| {
            CommandError::Config(
                "no username given: pass --username or set one in the context".to_string(),
            )
        })?;

    let password_var = ctx
        .map(|c| c.password_var())
        .unwrap_or(context::DEFAULT_PASSWORD_ENV);
    let password = args
        .password
        .clone()
        .or_else(|| lookup(password_var))
        .ok_or_else(|| {
            CommandError::Config(format!(
                "no password given: pass --password or set {}",
                password_var
            ))
        })?;

    let mut settings = ConnectionSettings::new(host, username, password)
        .with_insecure(args.insecure || ctx.map(|c| c.insecure).unwrap_or(false))
        .with_timeout(args.timeout);

    if let Some(port) = args.port.or_else(|| ctx.and_then(|c| c.port)) {
        settings = settings.with_port(port);
    }
    if let Some(version) = args
        .api_version
        .clone()
        .or_else(|| ctx.and_then(|c| c.api_version.clone()))
    {
        settings = settings.with_api_version(version);
    }

    Ok(settings)
}

// ============================================================================
// Context Commands (Pure business logic)
// ============================================================================

/// Info about a context for display
#[derive(Debug, Clone, Serialize)]
pub struct ContextInfo {
    pub name: String,
    pub api_root: String,
    pub is_current: bool,
}

/// List all contexts, sorted by name
pub fn context_list(config: &Config) -> Vec<ContextInfo> {
    let current = config.current_context.as_deref();
    let mut contexts: Vec<_> = config
        .contexts
        .iter()
        .map(|(name, ctx)| ContextInfo {
            name: name.clone(),
            api_root: ctx.api_root(),
            is_current: Some(name.as_str()) == current,
        })
        .collect();

    contexts.sort_by(|a, b| a.name.cmp(&b.name));
    contexts
}

/// Get current context name and API root
pub fn context_current(config: &Config) -> CommandResult<(String, String)> {
    let name = config
        .current_context
        .as_deref()
        .ok_or(ContextError::NoCurrentContext)?;
    let ctx = context::get_context(config, name)?;
    Ok((name.to_string(), ctx.api_root()))
}

/// Switch to a context
pub fn context_use(config: &mut Config, name: &str) -> CommandResult<()> {
    context::set_current_context(config, name)?;
    Ok(())
}

/// Add a new context; the first context added becomes current
pub fn context_add(config: &mut Config, ctx: Context) -> CommandResult<()> {
    let name = ctx.name.clone();
    context::add_context(config, ctx);
    if config.current_context.is_none() {
        context::set_current_context(config, &name)?;
    }
    Ok(())
}

/// Delete a context
pub fn context_delete(config: &mut Config, name: &str) -> CommandResult<bool> {
    let removed = context::remove_context(config, name);
    Ok(removed.is_some())
}

// ============================================================================
// Traffic manager commands
// ============================================================================

fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table: impl FnOnce() -> String,
) -> CommandResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(table()),
    }
}

/// Run a command that talks to the traffic manager and return its output.
///
/// Context commands are handled by the caller, since they edit the config
/// file instead.
pub async fn run_remote(
    command: &Commands,
    transport: Arc<dyn Transport>,
    format: OutputFormat,
) -> CommandResult<String> {
    let pools = Pools::new(transport.clone());

    match command {
        Commands::Pools => {
            let names = pools.list_pools().await?;
            render(format, &names, || format_pool_list(&names))
        }
        Commands::Pool { name } => {
            let pool = pools.get_pool(name).await?;
            render(format, pool.config(), || format_pool_detail(&pool))
        }
        Commands::Delete { name } => {
            pools.delete_pool(name).await?;
            let result = serde_json::json!({ "deleted": name });
            render(format, &result, || format!("pool \"{}\" deleted\n", name))
        }
        Commands::Drain { pool, nodes } => {
            let mut p = pools.get_pool(pool).await?;
            let updated = p.drain_nodes(nodes.as_slice()).await?;
            render(format, &updated, || {
                format_mutation(NodeAction::Drain, nodes, &p)
            })
        }
        Commands::Undrain { pool, nodes } => {
            let mut p = pools.get_pool(pool).await?;
            let updated = p.undrain_nodes(nodes.as_slice()).await?;
            render(format, &updated, || {
                format_mutation(NodeAction::Undrain, nodes, &p)
            })
        }
        Commands::AddNode(args) => {
            let mut p = pools.get_pool(&args.pool).await?;
            let updated = p.add_node(&args.address, args.node_port).await?;
            let node = vec![node_identity(&args.address, args.node_port)];
            render(format, &updated, || {
                format_mutation(NodeAction::Add, &node, &p)
            })
        }
        Commands::RemoveNode(args) => {
            let mut p = pools.get_pool(&args.pool).await?;
            let updated = p.remove_node(&args.address, args.node_port).await?;
            let node = vec![node_identity(&args.address, args.node_port)];
            render(format, &updated, || {
                format_mutation(NodeAction::Remove, &node, &p)
            })
        }
        Commands::Stats { pool } => {
            let p = pools.get_pool(pool).await?;
            let details = p.node_details().await?;
            render(format, &details, || format_node_statistics(&details))
        }
        Commands::Members => {
            let members = ClusterAggregator::new(transport).poll_all_members().await?;
            render(format, &members, || format_members(&members))
        }
        Commands::Context(_) => Err(CommandError::Config(
            "context commands do not use a connection".to_string(),
        )),
    }
}
