//! The dispatcher hands a composed notification to the mail or SMS
//! transport and reduces the outcome to a single success flag.

use crate::event::HandlerOptions;
use crate::formatting::DEFAULT_SUBJECT;
use crate::notification::transport::{MailTransport, SmsTransport};
use crate::recipient::Recipient;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// The delivery actions a handler definition can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    SendMail,
    SendSms,
}

impl NotifyAction {
    pub const ALL: [NotifyAction; 2] = [NotifyAction::SendMail, NotifyAction::SendSms];

    /// Parses an action name, ignoring case.
    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(action.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyAction::SendMail => "sendmail",
            NotifyAction::SendSms => "sendsms",
        }
    }
}

impl fmt::Display for NotifyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivers notifications through the configured transports.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn MailTransport>,
    sms: Arc<dyn SmsTransport>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn MailTransport>, sms: Arc<dyn SmsTransport>) -> Self {
        Self { mailer, sms }
    }

    pub fn mail_identifiers(&self) -> Vec<String> {
        self.mailer.identifiers()
    }

    pub fn sms_identifiers(&self) -> Vec<String> {
        self.sms.identifiers()
    }

    /// Sends the notification for `action`.
    ///
    /// Transport errors never escape; they are logged and reported as
    /// `false`.
    pub fn dispatch(
        &self,
        action: NotifyAction,
        options: &HandlerOptions,
        recipient: &Recipient,
        body: &str,
    ) -> bool {
        match action {
            NotifyAction::SendMail => {
                let subject = options
                    .subject
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_SUBJECT);
                self.send_mail(options.emailconfig.as_deref(), recipient, subject, body)
            }
            NotifyAction::SendSms => self.send_sms(options.smsconfig.as_deref(), recipient, body),
        }
    }

    #[instrument(skip(self, recipient, subject, body), fields(recipients = recipient.email.len()))]
    fn send_mail(
        &self,
        emailconfig: Option<&str>,
        recipient: &Recipient,
        subject: &str,
        body: &str,
    ) -> bool {
        let Some(identifier) = emailconfig else {
            error!("Failed to send email: no email configuration given");
            return false;
        };

        let sent = match self
            .mailer
            .send_email(identifier, &recipient.email, subject, body)
        {
            Ok(sent) => sent,
            Err(e) => {
                error!(error = %e, "Failed to send email");
                false
            }
        };

        if sent {
            info!(%recipient, "Sent a notification email to user");
        } else {
            warn!(%recipient, "Failed to send a notification email to user");
        }
        sent
    }

    #[instrument(skip(self, recipient, body))]
    fn send_sms(&self, smsconfig: Option<&str>, recipient: &Recipient, body: &str) -> bool {
        let Some(identifier) = smsconfig else {
            error!("Failed to send sms: no sms gateway given");
            return false;
        };
        let Some(phone) = recipient.mobile.as_deref().filter(|m| !m.is_empty()) else {
            warn!(%recipient, "Failed to send sms: recipient has no mobile number");
            return false;
        };

        let sent = match self.sms.send_sms(identifier, phone, body) {
            Ok(sent) => sent,
            Err(e) => {
                error!(error = %e, "Failed to send sms");
                false
            }
        };

        if sent {
            info!(%recipient, "Sent a notification sms to user");
        } else {
            warn!(%recipient, "Failed to send a notification sms to user");
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::test_utils::{FailingTransport, RecordingTransport};

    fn recipient() -> Recipient {
        Recipient {
            username: Some("cornelius".to_string()),
            email: vec!["cornelius@example.com".to_string()],
            mobile: Some("+491234".to_string()),
            ..Default::default()
        }
    }

    fn mail_options() -> HandlerOptions {
        HandlerOptions {
            emailconfig: Some("myserver".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(NotifyAction::parse("sendmail"), Some(NotifyAction::SendMail));
        assert_eq!(NotifyAction::parse("SendSMS"), Some(NotifyAction::SendSms));
        assert_eq!(NotifyAction::parse("sendfax"), None);
    }

    #[test]
    fn test_sendmail_uses_default_subject() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = NotificationDispatcher::new(transport.clone(), transport.clone());

        let sent = dispatcher.dispatch(NotifyAction::SendMail, &mail_options(), &recipient(), "body");

        assert!(sent);
        let mails = transport.sent_mails();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].identifier, "myserver");
        assert_eq!(mails[0].recipients, vec!["cornelius@example.com"]);
        assert_eq!(mails[0].subject, DEFAULT_SUBJECT);
        assert_eq!(mails[0].body, "body");
    }

    #[test]
    fn test_transport_error_becomes_false() {
        let transport = Arc::new(FailingTransport);
        let dispatcher = NotificationDispatcher::new(transport.clone(), transport);

        assert!(!dispatcher.dispatch(NotifyAction::SendMail, &mail_options(), &recipient(), "body"));

        let options = HandlerOptions {
            smsconfig: Some("myGW".to_string()),
            ..Default::default()
        };
        assert!(!dispatcher.dispatch(NotifyAction::SendSms, &options, &recipient(), "body"));
    }

    #[test]
    fn test_refused_delivery_is_false() {
        let transport = Arc::new(RecordingTransport::refusing());
        let dispatcher = NotificationDispatcher::new(transport.clone(), transport.clone());

        assert!(!dispatcher.dispatch(NotifyAction::SendMail, &mail_options(), &recipient(), "body"));
        assert_eq!(transport.sent_mails().len(), 1);
    }

    #[test]
    fn test_missing_configuration_skips_transport() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = NotificationDispatcher::new(transport.clone(), transport.clone());

        let sent = dispatcher.dispatch(
            NotifyAction::SendMail,
            &HandlerOptions::default(),
            &recipient(),
            "body",
        );
        assert!(!sent);

        let options = HandlerOptions {
            smsconfig: Some("myGW".to_string()),
            ..Default::default()
        };
        let no_mobile = Recipient {
            mobile: None,
            ..recipient()
        };
        assert!(!dispatcher.dispatch(NotifyAction::SendSms, &options, &no_mobile, "body"));

        assert!(transport.sent_mails().is_empty());
        assert!(transport.sent_sms().is_empty());
    }

    #[test]
    fn test_sendsms() {
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = NotificationDispatcher::new(transport.clone(), transport.clone());
        let options = HandlerOptions {
            smsconfig: Some("myGW".to_string()),
            ..Default::default()
        };

        assert!(dispatcher.dispatch(NotifyAction::SendSms, &options, &recipient(), "text"));

        let sms = transport.sent_sms();
        assert_eq!(sms.len(), 1);
        assert_eq!(sms[0].identifier, "myGW");
        assert_eq!(sms[0].phone, "+491234");
        assert_eq!(sms[0].body, "text");
    }
}
