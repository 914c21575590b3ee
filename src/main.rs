use clap::Parser;
use std::path::PathBuf;

use datasite_dashboard::config::config;
use datasite_dashboard::{app, AppState};

/// Dashboard backend for a datasite workspace.
#[derive(Debug, Parser)]
#[command(name = "datasite-dashboard", version, about)]
struct Args {
    /// Port to listen on (overrides DASHBOARD_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Workspace root directory (overrides DASHBOARD_WORKSPACE)
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Datasite owner email (overrides DASHBOARD_EMAIL)
    #[arg(long)]
    email: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DASHBOARD_WORKSPACE etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(workspace) = args.workspace {
        config.workspace.root = workspace;
    }
    if let Some(email) = args.email {
        config.workspace.email = email;
    }

    tracing::info!(
        "Starting datasite dashboard in {:?} mode",
        config.environment
    );

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config);

    // Open the workspace up front; failure is not fatal because the first
    // request retries the connection
    if let Err(e) = state.registry().await {
        tracing::warn!("workspace unavailable at startup: {}", e);
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Datasite dashboard listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.expect("server");
}
