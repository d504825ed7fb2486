/// User notification event handler
///
/// This library decides, after a token lifecycle event, whether a
/// notification should be sent, to whom, with which text and through which
/// channel.
pub mod app;
pub mod cli;
pub mod conditions;
pub mod config;
pub mod core;
pub mod directory;
pub mod event;
pub mod formatting;
pub mod handler;
pub mod notification;
pub mod recipient;

// Re-export core types for convenience
pub use crate::core::*;
pub use event::{Event, EventContext, HandlerDefinition};
pub use handler::{EventHandler, HandlerError, UserNotificationHandler};
