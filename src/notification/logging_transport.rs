//! A transport that only logs what it would deliver.
//!
//! This serves as the delivery backend of the command-line tool, where no
//! mail server or SMS gateway is attached, and is handy for debugging
//! handler definitions.

use crate::notification::transport::{MailTransport, SmsTransport};
use anyhow::{bail, Result};
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct LoggingTransport {
    mail_servers: Vec<String>,
    sms_gateways: Vec<String>,
}

impl LoggingTransport {
    pub fn new(mail_servers: Vec<String>, sms_gateways: Vec<String>) -> Self {
        Self {
            mail_servers,
            sms_gateways,
        }
    }
}

impl MailTransport for LoggingTransport {
    fn identifiers(&self) -> Vec<String> {
        self.mail_servers.clone()
    }

    #[instrument(skip(self, body), fields(body_length = body.len()))]
    fn send_email(
        &self,
        identifier: &str,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<bool> {
        if !self.mail_servers.iter().any(|s| s == identifier) {
            bail!("unknown mail server configuration '{}'", identifier);
        }
        info!(?recipients, subject, body, "Delivering notification email");
        Ok(true)
    }
}

impl SmsTransport for LoggingTransport {
    fn identifiers(&self) -> Vec<String> {
        self.sms_gateways.clone()
    }

    #[instrument(skip(self, body), fields(body_length = body.len()))]
    fn send_sms(&self, identifier: &str, phone: &str, body: &str) -> Result<bool> {
        if !self.sms_gateways.iter().any(|g| g == identifier) {
            bail!("unknown sms gateway '{}'", identifier);
        }
        info!(phone, body, "Delivering notification sms");
        Ok(true)
    }
}
