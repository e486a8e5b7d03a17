mod app;
mod config;
mod endpoints;
mod handlers;
mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use valentine_site::{build, check as check_project, LoadOptions, Project};

use crate::{app::create_app, config::Config, endpoints::site_endpoints, state::AppState};

/// Valentine - build and serve file-routed sites with islands of interactivity
#[derive(Parser, Debug)]
#[command(name = "valentine")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Project root containing valentine.toml
    #[arg(long, global = true, default_value = ".", env = "VALENTINE_ROOT")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pre-render every static route into the output directory
    Build {
        /// Output directory (default: <root>/dist)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Fail on any content entry that violates its schema
        #[arg(long)]
        strict: bool,
    },
    /// Build, then serve static output and on-demand routes
    Serve {
        /// Host address to bind the server to
        #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
        host: String,

        /// Port to listen on
        #[arg(long, short, default_value = "4321", env = "PORT")]
        port: u16,

        /// Output directory (default: <root>/dist)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Fail on any content entry that violates its schema
        #[arg(long)]
        strict: bool,
    },
    /// Print the route table in precedence order
    Routes,
    /// Load the project and enumerate every static path without writing
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    match cli.command {
        Command::Build { out, strict } => {
            let project = load_project(&cli.root, strict)?;
            let out = out.unwrap_or_else(|| cli.root.join("dist"));
            let report = build(project, &out).await?;
            for rejected in &report.rejected {
                tracing::warn!(entry = %rejected, "Left out of the build");
            }
            tracing::info!(
                pages = report.pages.len(),
                endpoints = report.endpoints.len(),
                skipped = report.skipped.len(),
                assets = report.assets,
                out = %out.display(),
                "Site built"
            );
        }
        Command::Serve {
            host,
            port,
            out,
            strict,
        } => {
            let project = load_project(&cli.root, strict)?;
            let out = out.unwrap_or_else(|| cli.root.join("dist"));
            build(project.clone(), &out).await?;
            serve(project, out, &host, port).await?;
        }
        Command::Routes => {
            let project = load_project(&cli.root, false)?;
            for route in project.routes().routes() {
                println!(
                    "{:<7} {:<9} {:<32} {}",
                    format!("{:?}", route.render_mode).to_lowercase(),
                    format!("{:?}", route.kind).to_lowercase(),
                    route.pattern.to_string(),
                    route.source_id
                );
            }
        }
        Command::Check => check(&cli.root)?,
    }

    Ok(())
}

/// Human-readable logs by default; `LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "valentine=debug,tower_http=debug".into()),
    );

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_project(root: &Path, strict: bool) -> Result<Arc<Project>> {
    let options = LoadOptions {
        strict,
        endpoints: site_endpoints()?,
        ..LoadOptions::default()
    };
    let project = Project::load(root, options)
        .with_context(|| format!("failed to load project at {}", root.display()))?;
    Ok(Arc::new(project))
}

/// Strict load plus path enumeration for every static page and endpoint.
fn check(root: &Path) -> Result<()> {
    let project = load_project(root, true)?;
    let report = check_project(&project)?;
    for source in &report.overrides {
        tracing::warn!(source = %source, "Render mode overridden");
    }
    tracing::info!(
        routes = project.routes().len(),
        static_pages = report.pages.len(),
        static_endpoints = report.endpoints.len(),
        server_routes = report.skipped.len(),
        collections = project.content().names().count(),
        "Project is valid"
    );
    Ok(())
}

async fn serve(project: Arc<Project>, out: PathBuf, host: &str, port: u16) -> Result<()> {
    let state = AppState::new(project, out, Config::from_env());
    let app = create_app(state);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => TcpListener::bind(format!("{host}:{port}")).await?,
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
