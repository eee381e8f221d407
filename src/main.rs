//! rbac-gate
//!
//! Role-based authorization gateway for resource-oriented HTTP APIs.

use clap::{Parser, Subcommand};
use rbac_gate::{
    Gate, Identity,
    auth::create_identity_provider,
    config::{AppConfig, LogFormat, load_config},
    server::{AuthzState, run_server},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// rbac-gate - Role-based authorization for HTTP APIs
#[derive(Parser, Debug)]
#[command(name = "rbac-gate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "RBAC_GATE_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RBAC_GATE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Override the configured listen host
        #[arg(long, env = "RBAC_GATE_HOST")]
        host: Option<String>,

        /// Override the configured listen port
        #[arg(long, env = "RBAC_GATE_PORT")]
        port: Option<u16>,
    },

    /// Decide a single request and print the result
    Check {
        /// User id to check as; anonymous when omitted
        #[arg(short, long)]
        user: Option<String>,

        /// HTTP method
        method: String,

        /// Request path
        path: String,
    },
}

fn init_logging(config: &AppConfig, level: Option<&str>) {
    let level = level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    init_logging(&config, args.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting rbac-gate");

    let gate = Gate::from_config(&config)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to initialize policy store"))?;

    match args.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let identity = create_identity_provider(&config.identity)
                .inspect_err(|e| error!(error = %e, "Failed to create identity provider"))?;
            info!(mechanism = identity.mechanism(), "Identity provider ready");

            let state = AuthzState::new(gate.authorizer.clone(), identity);
            run_server(&config.server, state)
                .await
                .inspect_err(|e| error!(error = %e, "Server error"))?;
        }
        Command::Check { user, method, path } => {
            let identity = user.map(Identity::user).unwrap_or(Identity::Anonymous);
            let authorization = gate
                .authorizer
                .authorize(&method.to_ascii_uppercase(), &path, &identity)
                .await?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "identity": authorization.identity,
                    "request": authorization.request,
                    "decision": authorization.decision,
                }))?
            );

            if !authorization.is_allowed() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
