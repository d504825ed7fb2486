//! usernotify - runs user notification handler definitions against an event
//!
//! The tool loads handler definitions and a directory fixture, then either
//! prints the handler's action and condition descriptors or processes a
//! recorded event and reports what each definition did.

use anyhow::{bail, Result};
use clap::Parser;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use usernotification::{
    app::{build_handler, process_event, Outcome},
    cli::Cli,
    config::Config,
    Event, EventHandler, HandlerDefinition,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!(
        "Handler Files: {:?}",
        config.handlers.definition_files
    );
    match &config.directory.fixture {
        Some(path) => info!("Directory Fixture: {}", path.display()),
        None => info!("Directory Fixture: Not configured"),
    }
    info!("Mail Servers: {:?}", config.notification.mail_servers);
    info!("SMS Gateways: {:?}", config.notification.sms_gateways);
    info!("-------------------------------------------------------");

    let handler = build_handler(&config)?;

    if cli.describe {
        let description = json!({
            "identifier": handler.identifier(),
            "description": handler.description(),
            "events": handler.events(),
            "actions": handler.actions(),
            "conditions": handler.conditions(),
        });
        println!("{}", serde_json::to_string_pretty(&description)?);
        return Ok(());
    }

    let Some(event_path) = &cli.event else {
        bail!("No event given; use --event FILE or --describe");
    };
    let event = Event::load_from_file(event_path)?;
    let definitions = HandlerDefinition::load_from_files(&config.handlers.definition_files)?;
    info!(
        "Loaded {} handler definitions for event '{}'",
        definitions.len(),
        event.name
    );

    let outcomes = process_event(&handler, &definitions, &event);
    for outcome in &outcomes {
        let status = match &outcome.outcome {
            Outcome::ConditionsNotMet => "skipped (conditions not met)".to_string(),
            // Skipped recipients and unknown actions also report success.
            Outcome::Completed(true) => "ok".to_string(),
            Outcome::Completed(false) => "not sent".to_string(),
            Outcome::Failed(reason) => format!("failed: {}", reason),
        };
        println!("{}: {}", outcome.name, status);
    }

    if outcomes.iter().any(|o| matches!(o.outcome, Outcome::Failed(_))) {
        std::process::exit(2);
    }
    Ok(())
}
