//! fs-router
//!
//! Derives routes from a directory of TOML route manifests and serves them.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes/                ┌───────────┐   ┌───────────┐   ┌──────────┐
//!   ├── index.toml   ────▶ │ discovery │──▶│  routing  │──▶│   http   │──▶ axum Router
//!   ├── users/             │ scan+load │   │  schemas  │   │  binder  │
//!   │   └── [id].toml      └───────────┘   └─────┬─────┘   └──────────┘
//!   └── ...                                      │
//!                                                ▼
//!                                          ┌───────────┐
//!                                          │  output   │──▶ routes.json, tree.json
//!                                          └───────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use fs_router::config::loader::load_raw_config;
use fs_router::config::resolve::merge_raw;
use fs_router::config::{resolve_global_config, RegistrationConfig};
use fs_router::observability::init_logging;
use fs_router::output::to_json;
use fs_router::{AxumBinder, ManifestLoader, RouteRegistrar, RouteServer, Shutdown};

#[derive(Parser)]
#[command(name = "fs-router")]
#[command(about = "File-based route registration for axum", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Route root directory (overrides the config file)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Path prefix for every route (overrides the config file)
    #[arg(short, long, global = true)]
    mount: Option<String>,

    /// Current environment name
    #[arg(short, long, global = true, env = "APP_ENV", default_value = "development")]
    env: String,

    /// Abort on the first failing route file
    #[arg(long, global = true)]
    strict: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the route tree and report the derived schemas
    Scan {
        /// Directory receiving routes.json and tree.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace file paths in the output
        #[arg(long)]
        redact: bool,

        /// Print the registry as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Register the route tree and serve it over HTTP
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
}

/// Resolve the configuration with CLI flags merged over the config file.
fn build_config(
    args: &GlobalArgs,
    mut overrides: Map<String, Value>,
) -> Result<RegistrationConfig, Box<dyn std::error::Error>> {
    let mut raw = match &args.config {
        Some(path) => load_raw_config(path)?,
        None => Value::Object(Map::new()),
    };

    if let Some(root) = &args.root {
        overrides.insert("root_directory".into(), Value::String(root.to_string_lossy().into_owned()));
    }
    if let Some(mount) = &args.mount {
        overrides.insert("app_mount".into(), Value::String(mount.clone()));
    }
    if args.strict {
        overrides.insert("strict".into(), Value::Bool(true));
    }

    merge_raw(&mut raw, overrides);
    Ok(resolve_global_config(&raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level);

    let mut overrides = Map::new();
    if let Commands::Scan { output, redact, .. } = &cli.command {
        if let Some(dir) = output {
            overrides.insert("output".into(), Value::String(dir.to_string_lossy().into_owned()));
        }
        if *redact {
            overrides.insert("redact_paths".into(), Value::Bool(true));
        }
    }

    let config = build_config(&cli.global, overrides)?;
    tracing::info!(
        root = %config.root_directory.display(),
        mount = %config.app_mount,
        environment = %cli.global.env,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Scan { json, .. } => {
            let redact_paths = config.redact_paths;

            let registrar = RouteRegistrar::new(config, ManifestLoader::new());
            let mut binder = AxumBinder::new();
            let run = registrar.run(&cli.global.env, &mut binder).await?;

            if json {
                let value = to_json(&run.registry, redact_paths)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for schema in &run.registry {
                    for layer in &schema.layers {
                        println!(
                            "{:<10} {:<7} {}",
                            schema.status,
                            layer.method.to_uppercase(),
                            layer.complete_path
                        );
                    }
                    if schema.layers.is_empty() {
                        println!("{:<10} {:<7} {}", schema.status, "-", schema.source_path.display());
                    }
                }
                let summary = run.summary();
                println!(
                    "{} registered, {} skipped, {} errors",
                    summary.registered, summary.skipped, summary.errors
                );
            }
        }
        Commands::Serve { bind } => {
            let registrar = RouteRegistrar::new(config, ManifestLoader::new());
            let mut binder = AxumBinder::new();
            let run = registrar.run(&cli.global.env, &mut binder).await?;
            let summary = run.summary();
            tracing::info!(
                registered = summary.registered,
                bound = binder.bound().len(),
                "Routes ready"
            );

            let listener = TcpListener::bind(bind).await?;
            let shutdown = Shutdown::new();
            let server = RouteServer::new(binder.into_router());
            let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

            fs_router::lifecycle::signals::wait_for_shutdown(&shutdown).await;
            handle.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
