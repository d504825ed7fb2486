//! Wiring and event processing for the command-line tool.

use crate::config::Config;
use crate::core::Services;
use crate::directory::InMemoryDirectory;
use crate::event::{Event, HandlerDefinition};
use crate::handler::{EventHandler, UserNotificationHandler};
use crate::notification::logging_transport::LoggingTransport;
use crate::notification::NotificationDispatcher;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// What happened to one handler definition for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The conditions did not match; the action was not run.
    ConditionsNotMet,
    /// The action ran and reported this success flag. `true` also covers
    /// runs that had nothing to deliver, e.g. no resolvable recipient.
    Completed(bool),
    /// Checking or running the definition failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub name: String,
    pub outcome: Outcome,
}

/// Builds the user notification handler from the configuration.
///
/// Delivery goes through a [`LoggingTransport`] that knows the configured
/// mail servers and SMS gateways.
pub fn build_handler(config: &Config) -> Result<UserNotificationHandler> {
    let directory = match &config.directory.fixture {
        Some(path) => InMemoryDirectory::load(path)?,
        None => InMemoryDirectory::new(),
    };
    let directory = Arc::new(directory);
    let services = Services::new(directory.clone(), directory.clone(), directory);

    let transport = Arc::new(LoggingTransport::new(
        config.notification.mail_servers.clone(),
        config.notification.sms_gateways.clone(),
    ));
    let dispatcher = NotificationDispatcher::new(transport.clone(), transport);

    Ok(UserNotificationHandler::new(services, dispatcher)
        .with_admin_realms(config.notification.admin_realms.clone()))
}

/// Runs every definition bound to the event through the handler.
///
/// A failing definition does not stop the others.
#[instrument(skip_all, fields(event = %event.name))]
pub fn process_event(
    handler: &dyn EventHandler,
    definitions: &[HandlerDefinition],
    event: &Event,
) -> Vec<HandlerOutcome> {
    definitions
        .iter()
        .filter(|def| {
            let applies = def.applies_to(&event.name);
            if !applies {
                debug!(handler = %def.name, "Handler definition not bound to event");
            }
            applies
        })
        .map(|def| {
            let ctx = event.context(def);
            let outcome = match handler.check_condition(&ctx) {
                Ok(false) => Outcome::ConditionsNotMet,
                Ok(true) => match handler.do_action(&def.action, &ctx) {
                    Ok(success) => Outcome::Completed(success),
                    Err(e) => Outcome::Failed(e.to_string()),
                },
                Err(e) => Outcome::Failed(e.to_string()),
            };
            match &outcome {
                Outcome::Failed(reason) => {
                    error!(handler = %def.name, %reason, "Handler definition failed")
                }
                other => info!(handler = %def.name, outcome = ?other, "Handler definition processed"),
            }
            HandlerOutcome {
                name: def.name.clone(),
                outcome,
            }
        })
        .collect()
}
