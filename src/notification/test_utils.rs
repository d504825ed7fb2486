//! Transports for tests: one that records every delivery and one that
//! always fails.

use crate::notification::transport::{MailTransport, SmsTransport};
use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub identifier: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub identifier: String,
    pub phone: String,
    pub body: String,
}

/// Records deliveries and answers with a fixed result.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    accept: bool,
    mails: Arc<Mutex<Vec<SentMail>>>,
    sms: Arc<Mutex<Vec<SentSms>>>,
}

impl RecordingTransport {
    /// A transport that accepts every message.
    pub fn new() -> Self {
        Self {
            accept: true,
            mails: Arc::new(Mutex::new(Vec::new())),
            sms: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A transport that records but refuses every message.
    pub fn refusing() -> Self {
        Self {
            accept: false,
            ..Self::new()
        }
    }

    pub fn sent_mails(&self) -> Vec<SentMail> {
        self.mails.lock().unwrap().clone()
    }

    pub fn sent_sms(&self) -> Vec<SentSms> {
        self.sms.lock().unwrap().clone()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MailTransport for RecordingTransport {
    fn identifiers(&self) -> Vec<String> {
        vec!["myserver".to_string()]
    }

    fn send_email(
        &self,
        identifier: &str,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<bool> {
        self.mails.lock().unwrap().push(SentMail {
            identifier: identifier.to_string(),
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(self.accept)
    }
}

impl SmsTransport for RecordingTransport {
    fn identifiers(&self) -> Vec<String> {
        vec!["myGW".to_string()]
    }

    fn send_sms(&self, identifier: &str, phone: &str, body: &str) -> Result<bool> {
        self.sms.lock().unwrap().push(SentSms {
            identifier: identifier.to_string(),
            phone: phone.to_string(),
            body: body.to_string(),
        });
        Ok(self.accept)
    }
}

/// Fails every delivery with a transport error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingTransport;

impl MailTransport for FailingTransport {
    fn identifiers(&self) -> Vec<String> {
        Vec::new()
    }

    fn send_email(&self, identifier: &str, _: &[String], _: &str, _: &str) -> Result<bool> {
        bail!("connection to mail server '{}' refused", identifier)
    }
}

impl SmsTransport for FailingTransport {
    fn identifiers(&self) -> Vec<String> {
        Vec::new()
    }

    fn send_sms(&self, identifier: &str, _: &str, _: &str) -> Result<bool> {
        bail!("sms gateway '{}' unreachable", identifier)
    }
}
