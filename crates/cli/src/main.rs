mod cli;
mod config;
mod terminal;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use ragreader_controller::{
    ApiClient, IdentitySource, LoadingController, SessionOutcome, Submission,
};
use ragreader_core::config::load_dotenv;
use ragreader_core::{Config, PollingConfig};

use crate::cli::{CliArgs, Command, SubmitArgs};
use crate::config::CliConfig;
use crate::terminal::{Terminal, TerminalNavigator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let terminal = Terminal::new();

    let mut cli_config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;

    let mut config = Config::from_env();
    if let Some(url) = cli_config.resolve_server_url(args.server.as_deref()) {
        config.api.url = url;
    }
    config.log_summary();

    let client = ApiClient::new(&config.api).context("failed to create API client")?;

    match args.command {
        Command::Login { username, email } => {
            let reply = client
                .sign_up(&username, &email)
                .await
                .context("sign-up request failed")?;
            cli_config.set_identity(&username, &email);
            cli_config.save()?;
            info!(user = %username, path = %cli_config.path().display(), "identity stored");
            terminal.print_info(reply.message.as_deref().unwrap_or("Signed up."))?;
        }
        Command::Logout => {
            cli_config.clear_identity();
            cli_config.save()?;
            terminal.print_info("Logged out.")?;
        }
        Command::Submit(submit) => {
            let user = require_identity(&cli_config)?;
            let no_wait = submit.no_wait;
            let submission = submission_from(submit)?;
            let reply = client
                .submit(&submission, &user)
                .await
                .context("failed to submit content")?;
            terminal.print_info(reply.message.as_deref().unwrap_or("Submitted."))?;
            if !no_wait {
                wait_until_ready(&terminal, client, cli_config, config.polling).await?;
            }
        }
        Command::Wait => {
            wait_until_ready(&terminal, client, cli_config, config.polling).await?;
        }
        Command::Ask { query } => {
            let user = require_identity(&cli_config)?;
            let reply = client.query(&query, &user).await.context("query failed")?;
            terminal.print_answer(&reply)?;
        }
        Command::Clean => {
            let reply = client.clean().await.context("clean request failed")?;
            terminal.print_info(reply.message.as_deref().unwrap_or("Cleaned."))?;
        }
    }

    Ok(())
}

fn require_identity(cli_config: &CliConfig) -> Result<String> {
    cli_config
        .identity()
        .filter(|user| !user.trim().is_empty())
        .context("not logged in; run `ragreader-cli login --username <name> --email <email>`")
}

fn submission_from(args: SubmitArgs) -> Result<Submission> {
    match (args.file, args.url, args.text) {
        (Some(path), None, None) => Ok(Submission::File(path)),
        (None, Some(url), None) => Ok(Submission::Url(url)),
        (None, None, Some(text)) => Ok(Submission::Text(text)),
        _ => bail!("exactly one of --file, --url or --text is required"),
    }
}

/// Mount the loading controller and render it until the session ends.
async fn wait_until_ready(
    terminal: &Terminal,
    client: ApiClient,
    cli_config: CliConfig,
    polling: PollingConfig,
) -> Result<()> {
    let user = cli_config.identity().unwrap_or_else(|| "(anonymous)".to_string());
    terminal.print_banner(client.base_url(), &user)?;

    let mut handle = LoadingController::new(
        Arc::new(client),
        Arc::new(cli_config),
        Arc::new(TerminalNavigator),
    )
    .with_polling(polling)
    .mount();

    let mut views = handle.subscribe();
    let outcome = loop {
        tokio::select! {
            outcome = handle.finished() => break outcome,
            Ok(()) = views.changed() => {
                let view = views.borrow_and_update().clone();
                terminal.render_view(&view)?;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, unmounting loading controller");
                handle.unmount();
            }
        }
    };

    let view = handle.view();
    match outcome {
        SessionOutcome::Ready => Ok(()),
        SessionOutcome::Unmounted => {
            terminal.print_info("\nStopped waiting. Run `ragreader-cli wait` to resume.")?;
            Ok(())
        }
        SessionOutcome::Unauthorized => bail!("not logged in"),
        SessionOutcome::InitiationFailed(message) | SessionOutcome::Failed(message) => {
            terminal.print_failure(&view)?;
            bail!("ingestion failed: {}", message)
        }
    }
}
