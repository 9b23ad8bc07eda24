//! Astroline CLI and REST API entry point.
//!
//! Binary name: `astroline`
//!
//! Parses CLI arguments, initializes tracing, then either starts the REST
//! API server or runs a session inspection command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use secrecy::SecretString;

use astroline_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use cli::{Cli, Commands};
use state::{AppState, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or storage
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "astroline", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.otel, filter_for_verbosity(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            port,
            host,
            gemini_api_key,
            jwt_secret,
        } => {
            let state = AppState::init(
                gemini_api_key.map(SecretString::from),
                &SecretString::from(jwt_secret),
            )
            .await?;
            tracing::info!(
                data_dir = %state.data_dir.display(),
                model = %state.config.provider.model,
                "application state initialized"
            );

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Astroline API listening on {}",
                    console::style("✦").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Sessions { owner, all } => {
            let storage = Storage::open().await?;
            cli::session::list_sessions(&storage, &owner, all, cli.json).await?;
        }

        Commands::History { owner, session_id } => {
            let storage = Storage::open().await?;
            cli::session::show_history(&storage, &owner, &session_id, cli.json).await?;
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
