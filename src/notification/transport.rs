//! Delivery transports for notifications.
//!
//! The handler never talks to a mail server or SMS gateway itself. It hands
//! the composed message to a transport that owns the connection details for
//! a configured identifier (e.g. the mail server `myserver`).

use anyhow::Result;

/// A transport that can deliver email.
pub trait MailTransport: Send + Sync {
    /// Identifiers of the configured mail servers.
    fn identifiers(&self) -> Vec<String>;

    /// Sends a mail through the server configuration `identifier`.
    ///
    /// # Returns
    /// * `Ok(true)` if the mail was accepted
    /// * `Ok(false)` if the server refused it
    /// * `Err` for transport errors (connection, authentication, ...)
    fn send_email(
        &self,
        identifier: &str,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<bool>;
}

/// A transport that can deliver SMS.
pub trait SmsTransport: Send + Sync {
    /// Identifiers of the configured SMS gateways.
    fn identifiers(&self) -> Vec<String>;

    /// Sends a text message through the gateway `identifier`.
    fn send_sms(&self, identifier: &str, phone: &str, body: &str) -> Result<bool>;
}
