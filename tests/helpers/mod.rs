//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use usernotification::{
    directory::InMemoryDirectory,
    event::{EventRequest, EventResponse},
    notification::{test_utils::RecordingTransport, MailTransport, NotificationDispatcher, SmsTransport},
    AdminAccount, DirectoryUser, Event, HandlerDefinition, LoggedInUser, Role, Services, Token, User,
    UserAttributes, UserNotificationHandler,
};

pub const URL_ROOT: &str = "https://pi.example.com/";

fn directory_user(login: &str, realm: &str, attributes: UserAttributes) -> DirectoryUser {
    DirectoryUser {
        user: User::new(login, realm),
        attributes,
    }
}

/// Two realms, four users, three tokens and two internal admins.
///
/// `cornelius@realm1` owns `OATH123456` (hotp) and the locked `LOCKED01`
/// (totp). `SPASS01` belongs to nobody and lives in `realm2`.
pub fn directory() -> InMemoryDirectory {
    let cornelius = User::new("cornelius", "realm1");

    let mut oath = Token::new("OATH123456", "hotp");
    oath.realms = vec!["realm1".to_string()];
    oath.owner = Some(cornelius.clone());

    let mut locked = Token::new("LOCKED01", "totp");
    locked.realms = vec!["realm1".to_string()];
    locked.owner = Some(cornelius);
    locked.failcount = 10;

    let mut spass = Token::new("SPASS01", "spass");
    spass.realms = vec!["realm2".to_string()];

    InMemoryDirectory::new()
        .with_user(directory_user(
            "cornelius",
            "realm1",
            UserAttributes {
                givenname: Some("Cornelius".to_string()),
                surname: Some("Kölbel".to_string()),
                email: Some("user@localhost.localdomain".to_string()),
                mobile: Some("+491701234567".to_string()),
            },
        ))
        .with_user(directory_user(
            "alice",
            "realm2",
            UserAttributes {
                givenname: Some("Alice".to_string()),
                email: Some("alice@example.com".to_string()),
                ..Default::default()
            },
        ))
        .with_user(directory_user(
            "bob",
            "realm2",
            UserAttributes {
                givenname: Some("Bob".to_string()),
                email: Some("bob@example.com".to_string()),
                ..Default::default()
            },
        ))
        .with_user(directory_user("carol", "realm2", UserAttributes::default()))
        .with_token(oath)
        .with_token(locked)
        .with_token(spass)
        .with_admin(AdminAccount {
            username: "testadmin".to_string(),
            email: Some("admin@example.com".to_string()),
        })
        .with_admin(AdminAccount {
            username: "quietadmin".to_string(),
            email: None,
        })
}

pub fn services() -> Services {
    let directory = Arc::new(directory());
    Services::new(directory.clone(), directory.clone(), directory)
}

/// A handler delivering through the given transport.
pub fn handler<T>(transport: Arc<T>) -> UserNotificationHandler
where
    T: MailTransport + SmsTransport + 'static,
{
    let dispatcher = NotificationDispatcher::new(transport.clone(), transport);
    UserNotificationHandler::new(services(), dispatcher)
        .with_admin_realms(vec!["adminrealm".to_string()])
}

pub fn recording_handler() -> (UserNotificationHandler, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new());
    (handler(transport.clone()), transport)
}

pub fn definition(yaml: &str) -> HandlerDefinition {
    serde_yml::from_str(yaml).unwrap()
}

/// An event for `path` with the given request parameters and user.
pub fn event(path: &str, params: &[(&str, &str)], user: User, response: Value) -> Event {
    Event {
        name: "token_init".to_string(),
        request: EventRequest {
            path: path.to_string(),
            url_root: URL_ROOT.to_string(),
            all_data: params
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect(),
            user,
        },
        response: EventResponse::new(response),
        logged_in_user: None,
        audit_serial: None,
    }
}

/// A successful `/token/init` for `serial`, made by an admin for cornelius.
pub fn token_init_event(serial: &str) -> Event {
    let mut event = event(
        "/token/init",
        &[("serial", serial)],
        User::new("cornelius", "realm1"),
        json!({"result": {"status": true, "value": true}, "detail": {"serial": serial}}),
    );
    event.logged_in_user = Some(admin_session());
    event
}

pub fn admin_session() -> LoggedInUser {
    LoggedInUser {
        user: "admin".to_string(),
        role: Role::Admin,
        realm: "super".to_string(),
    }
}

pub fn user_session(login: &str, realm: &str) -> LoggedInUser {
    LoggedInUser {
        user: login.to_string(),
        role: Role::User,
        realm: realm.to_string(),
    }
}
