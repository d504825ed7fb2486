//! The user notification handler.
//!
//! It notifies a user (or administrators) about actions on tokens, by email
//! or SMS:
//!
//!   * `sendmail`: send an email to the configured recipient
//!   * `sendsms`: send an SMS to the configured recipient

use crate::conditions::ConditionEvaluator;
use crate::core::{Role, Services, User};
use crate::event::EventContext;
use crate::formatting::{MessageContext, DEFAULT_BODY};
use crate::handler::{
    ActionSpecs, ConditionSpec, ConditionSpecs, EventHandler, HandlerError, OptionSpec,
};
use crate::notification::{NotificationDispatcher, NotifyAction};
use crate::recipient::{NotifyMode, Recipient, RecipientResolver};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

pub const IDENTIFIER: &str = "UserNotification";

const DESCRIPTION: &str = "This eventhandler notifies the user about actions on their tokens";

pub struct UserNotificationHandler {
    services: Services,
    dispatcher: NotificationDispatcher,
    /// Realms offered for the `admin realm` target.
    admin_realms: Vec<String>,
}

impl UserNotificationHandler {
    pub fn new(services: Services, dispatcher: NotificationDispatcher) -> Self {
        Self {
            services,
            dispatcher,
            admin_realms: Vec::new(),
        }
    }

    pub fn with_admin_realms(mut self, admin_realms: Vec<String>) -> Self {
        self.admin_realms = admin_realms;
        self
    }

    /// Fills the body template of the handler definition.
    fn compose_body(
        &self,
        ctx: &EventContext<'_>,
        tokenowner: &User,
        recipient: &Recipient,
    ) -> Result<String, HandlerError> {
        let template = ctx
            .handler_def
            .options
            .body
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BODY);

        let tokens = self.services.tokens.as_ref();
        let (serial, tokentype) = match ctx
            .serial()
            .or(ctx.audit_serial.filter(|s| !s.is_empty()))
        {
            Some(serial) => (
                Some(serial.to_string()),
                tokens.token_by_serial(serial).map(|t| t.tokentype),
            ),
            None if !tokenowner.is_empty() => {
                let serials = tokens
                    .tokens_of_user(tokenowner)
                    .iter()
                    .map(|t| t.serial.as_str())
                    .join(",");
                (Some(serials), None)
            }
            None => (None, None),
        };

        let owner = if tokenowner.is_empty() {
            None
        } else {
            self.services
                .users
                .find_user(&tokenowner.login, &tokenowner.realm)
        };
        let owner_attributes = owner.map(|o| o.attributes).unwrap_or_default();
        let session = ctx.logged_in_user;
        let owner_login = Some(tokenowner.login.as_str()).filter(|l| !l.is_empty());
        let owner_realm = Some(tokenowner.realm.as_str()).filter(|r| !r.is_empty());

        let context = MessageContext::new()
            .set("admin", session.map(|s| s.user.as_str()))
            .set("realm", session.map(|s| s.realm.as_str()))
            .set("action", Some(ctx.request.path.as_str()))
            .set("serial", serial)
            .set("url", Some(ctx.request.url_root.as_str()))
            .set("user", owner_attributes.givenname)
            .set("surname", owner_attributes.surname)
            .set("givenname", recipient.givenname.as_deref())
            .set("username", owner_login)
            .set("userrealm", owner_realm)
            .set("tokentype", tokentype)
            .set("registrationcode", ctx.response.detail("registrationcode"))
            .set("recipient_givenname", recipient.givenname.as_deref())
            .set("recipient_surname", recipient.surname.as_deref());

        Ok(context.render(template)?)
    }
}

impl EventHandler for UserNotificationHandler {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn actions(&self) -> ActionSpecs {
        let targets = NotifyMode::ALL.iter().map(|m| m.as_str().to_string()).collect();
        let admins = self.services.admins.admin_usernames();

        let mut sendmail = BTreeMap::new();
        sendmail.insert(
            "emailconfig".to_string(),
            OptionSpec::new("str")
                .required()
                .description("Send notification email via this email server.")
                .values(self.dispatcher.mail_identifiers()),
        );
        sendmail.insert(
            "subject".to_string(),
            OptionSpec::new("str").description("The subject of the mail that is sent."),
        );
        sendmail.insert(
            "body".to_string(),
            OptionSpec::new("text").description("The body of the mail that is sent."),
        );
        sendmail.insert(
            "To".to_string(),
            OptionSpec::new("str")
                .required()
                .description("Send notification to this user.")
                .values(targets),
        );
        sendmail.insert(
            NotifyMode::AdminRealm.option_key(),
            OptionSpec::new("str")
                .values(self.admin_realms.clone())
                .visible_if("To", NotifyMode::AdminRealm.as_str()),
        );
        sendmail.insert(
            NotifyMode::InternalAdmin.option_key(),
            OptionSpec::new("str")
                .values(admins)
                .visible_if("To", NotifyMode::InternalAdmin.as_str()),
        );
        sendmail.insert(
            NotifyMode::Email.option_key(),
            OptionSpec::new("str")
                .description("Any email address, to which the notification should be sent.")
                .visible_if("To", NotifyMode::Email.as_str()),
        );

        let mut sendsms = BTreeMap::new();
        sendsms.insert(
            "smsconfig".to_string(),
            OptionSpec::new("str")
                .required()
                .description("Send the user notification via a predefined SMS gateway.")
                .values(self.dispatcher.sms_identifiers()),
        );
        sendsms.insert(
            "body".to_string(),
            OptionSpec::new("text").description("The text of the SMS."),
        );
        sendsms.insert(
            "To".to_string(),
            OptionSpec::new("str")
                .required()
                .description("Send notification to this user.")
                .values(vec![NotifyMode::TokenOwner.as_str().to_string()]),
        );

        let mut actions = BTreeMap::new();
        actions.insert(NotifyAction::SendMail.as_str().to_string(), sendmail);
        actions.insert(NotifyAction::SendSms.as_str().to_string(), sendsms);
        actions
    }

    fn conditions(&self) -> ConditionSpecs {
        let realms = self.services.users.realms();
        let flag = || vec!["True".to_string(), "False".to_string()];

        let mut conditions = BTreeMap::new();
        conditions.insert(
            "realm".to_string(),
            ConditionSpec::single(
                "str",
                "The user realm, for which this event should apply.",
                realms.clone(),
            ),
        );
        conditions.insert(
            "tokenrealm".to_string(),
            ConditionSpec::multi("The token realm, for which this event should apply.", realms),
        );
        conditions.insert(
            "tokentype".to_string(),
            ConditionSpec::multi("The type of the token.", self.services.tokens.token_types()),
        );
        conditions.insert(
            "logged_in_user".to_string(),
            ConditionSpec::single(
                "str",
                "The logged in user is of the following type.",
                vec![Role::Admin.to_string(), Role::User.to_string()],
            ),
        );
        conditions.insert(
            "result_value".to_string(),
            ConditionSpec::single(
                "str",
                "The result.value within the response is True or False.",
                flag(),
            ),
        );
        conditions.insert(
            "token_locked".to_string(),
            ConditionSpec::single(
                "str",
                "Check if the max failcounter of the token is reached.",
                flag(),
            ),
        );
        conditions.insert(
            "serial".to_string(),
            ConditionSpec::single(
                "regexp",
                "Action is triggered, if the serial matches this regular expression.",
                Vec::new(),
            ),
        );
        conditions
    }

    #[instrument(skip(self, ctx), fields(handler = %ctx.handler_def.name))]
    fn check_condition(&self, ctx: &EventContext<'_>) -> Result<bool, HandlerError> {
        let matched = ConditionEvaluator::new(&self.services).evaluate(ctx)?;
        debug!(matched, "Checked handler conditions");
        Ok(matched)
    }

    #[instrument(skip(self, ctx), fields(handler = %ctx.handler_def.name))]
    fn do_action(&self, action: &str, ctx: &EventContext<'_>) -> Result<bool, HandlerError> {
        let options = &ctx.handler_def.options;
        let tokenowner = ctx.token_owner(self.services.tokens.as_ref());
        debug!(
            %tokenowner,
            logged_in_user = ?ctx.logged_in_user,
            "Executing event"
        );

        let mode = match options.to.as_deref().filter(|t| !t.is_empty()) {
            None => NotifyMode::default(),
            Some(to) => match to.parse::<NotifyMode>() {
                Ok(mode) => mode,
                Err(e) => {
                    warn!(
                        handler_def = ?ctx.handler_def,
                        "Was not able to determine the recipient for the user notification: {}",
                        e
                    );
                    return Ok(true);
                }
            },
        };

        let recipient = RecipientResolver::new(&self.services).resolve(
            mode,
            options,
            &tokenowner,
            ctx.logged_in_user,
        );
        let Some(recipient) = recipient else {
            warn!(%mode, "No recipient found for the user notification, skipping");
            return Ok(true);
        };

        let body = self.compose_body(ctx, &tokenowner, &recipient)?;

        match NotifyAction::parse(action) {
            Some(action) => Ok(self.dispatcher.dispatch(action, options, &recipient, &body)),
            None => {
                warn!("Unknown action for the user notification, nothing to do");
                Ok(true)
            }
        }
    }
}
