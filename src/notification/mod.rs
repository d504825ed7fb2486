//! Delivery of notifications.
//!
//! This module defines the transport traits the handler delivers through and
//! the dispatcher that shields the event pipeline from delivery failures.
pub mod dispatcher;
pub mod logging_transport;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;

pub use dispatcher::{NotificationDispatcher, NotifyAction};
pub use transport::{MailTransport, SmsTransport};
