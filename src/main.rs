use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use stingray::cli::{
    context_add, context_current, context_delete, context_list, context_use,
    format_context_list, format_current_context, resolve_connection, run_remote, Cli, Commands,
    CommandResult, ContextAction,
};
use stingray::context::{
    default_config_path, expand_config_path, load_config_from, save_config_to, Context,
};
use stingray::HttpClient;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if specified
    if let Some(ref env_file) = cli.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    match run(cli).await {
        Ok(output) => print!("{}", output),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> CommandResult<String> {
    let config_path = cli
        .config
        .as_deref()
        .map(expand_config_path)
        .unwrap_or_else(default_config_path);
    let mut config = load_config_from(&config_path)?;

    if let Commands::Context(args) = &cli.command {
        let output = match &args.action {
            ContextAction::List => format_context_list(&context_list(&config)),
            ContextAction::Current => {
                let (name, api_root) = context_current(&config)?;
                format_current_context(&name, &api_root)
            }
            ContextAction::Use { name } => {
                context_use(&mut config, name)?;
                save_config_to(&config, &config_path)?;
                format!("Switched to context \"{}\"\n", name)
            }
            ContextAction::Add {
                name,
                address,
                api_port,
                user,
                password_env,
                allow_self_signed,
                description,
            } => {
                let mut ctx = Context::new(name, address).with_insecure(*allow_self_signed);
                ctx.port = *api_port;
                ctx.username = user.clone();
                ctx.password_env = password_env.clone();
                ctx.description = description.clone();
                context_add(&mut config, ctx)?;
                save_config_to(&config, &config_path)?;
                format!("Context \"{}\" added\n", name)
            }
            ContextAction::Delete { name } => {
                if context_delete(&mut config, name)? {
                    save_config_to(&config, &config_path)?;
                    format!("Context \"{}\" deleted\n", name)
                } else {
                    format!("Context \"{}\" not found\n", name)
                }
            }
        };
        return Ok(output);
    }

    let settings = resolve_connection(
        &config,
        cli.context.as_deref(),
        &cli.connection,
        |var| std::env::var(var).ok(),
    )?;
    let client = HttpClient::connect(settings).await?;

    run_remote(&cli.command, Arc::new(client), cli.output).await
}
