//! Colloquy CLI and REST API entry point.
//!
//! Binary name: `colq`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use colloquy_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{ChatCommand, Cli, Commands, UserCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    tracing_options.json = cli.log_json;
    tracing_options.enable_otel = cli.otel;
    init_tracing(&tracing_options).map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "colq", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;
    let caller = cli.caller.as_deref();

    match cli.command {
        Commands::User { action } => match action {
            UserCommand::Add {
                username,
                name,
                thumbnail,
                original,
            } => {
                cli::user::add_user(&state, &username, &name, thumbnail, original, cli.json)
                    .await?;
            }
            UserCommand::List => {
                cli::user::list_users(&state, cli.json).await?;
            }
        },

        Commands::Chat { action } => match action {
            ChatCommand::Create {
                title,
                participants,
                group,
                admin,
                description,
            } => {
                let args = cli::chat::CreateChatArgs {
                    title,
                    participants,
                    group,
                    admin,
                    description,
                };
                cli::chat::create_chat(&state, caller, args, cli.json).await?;
            }
            ChatCommand::List => cli::chat::list_chats(&state, cli.json).await?,
            ChatCommand::Show { id } => cli::chat::show_chat(&state, caller, &id, cli.json).await?,
            ChatCommand::Find { participants } => {
                cli::chat::find_chat(&state, &participants, cli.json).await?;
            }
            ChatCommand::Search { filter } => {
                cli::chat::search_chats(&state, caller, filter.as_deref(), cli.json).await?;
            }
            ChatCommand::Exists { title } => {
                cli::chat::title_exists(&state, &title, cli.json).await?;
            }
            ChatCommand::Count => cli::chat::count_chats(&state, cli.json).await?,
            ChatCommand::Read { chat, message } => {
                cli::chat::mark_read(&state, caller, &chat, &message, cli.json).await?;
            }
            ChatCommand::Post {
                chat,
                content,
                kind,
                recipients,
            } => {
                cli::chat::post_message(
                    &state,
                    caller,
                    &chat,
                    content,
                    &kind,
                    &recipients,
                    cli.json,
                )
                .await?;
            }
        },

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Colloquy API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(%addr, "HTTP server started");

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
