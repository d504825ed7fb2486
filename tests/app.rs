mod helpers;

use helpers::{definition, recording_handler, token_init_event};
use std::io::Write;
use tempfile::NamedTempFile;
use usernotification::{
    app::{build_handler, process_event, Outcome},
    config::Config,
    EventHandler, HandlerDefinition,
};

#[test]
fn test_process_event_runs_bound_definitions() {
    let (handler, transport) = recording_handler();
    let definitions = vec![
        definition(
            "name: owner\nevents: [token_init]\naction: sendmail\noptions:\n  To: tokenowner\n  emailconfig: myserver",
        ),
        definition(
            "name: other event\nevents: [token_delete]\naction: sendmail\noptions:\n  To: tokenowner\n  emailconfig: myserver",
        ),
        definition(
            "name: spass only\naction: sendmail\noptions:\n  To: tokenowner\n  emailconfig: myserver\nconditions:\n  tokentype: spass",
        ),
    ];
    let event = token_init_event("OATH123456");

    let outcomes = process_event(&handler, &definitions, &event);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].name, "owner");
    assert_eq!(outcomes[0].outcome, Outcome::Completed(true));
    assert_eq!(outcomes[1].name, "spass only");
    assert_eq!(outcomes[1].outcome, Outcome::ConditionsNotMet);
    assert_eq!(transport.sent_mails().len(), 1);
}

#[test]
fn test_process_event_isolates_failures() {
    let (handler, transport) = recording_handler();
    let definitions = vec![
        definition("name: broken\naction: sendmail\nconditions:\n  serial: \"(OATH\""),
        definition(
            "name: bad template\naction: sendmail\noptions:\n  To: tokenowner\n  emailconfig: myserver\n  body: \"{\"",
        ),
        definition("name: works\naction: sendsms\noptions:\n  smsconfig: myGW"),
    ];
    let event = token_init_event("OATH123456");

    let outcomes = process_event(&handler, &definitions, &event);

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[0].outcome, Outcome::Failed(ref r) if r.contains("(OATH")));
    assert!(matches!(outcomes[1].outcome, Outcome::Failed(_)));
    assert_eq!(outcomes[2].outcome, Outcome::Completed(true));
    assert!(transport.sent_mails().is_empty());
    assert_eq!(transport.sent_sms().len(), 1);
}

#[test]
fn test_build_handler_from_config() {
    let mut fixture = NamedTempFile::new().unwrap();
    write!(
        fixture,
        r#"
realms: [realm1]
users:
  - {{ login: cornelius, realm: realm1, email: user@localhost.localdomain }}
tokens:
  - {{ serial: OATH123456, tokentype: hotp, owner: {{ login: cornelius, realm: realm1 }} }}
admins:
  - {{ username: testadmin }}
"#
    )
    .unwrap();

    let mut config = Config::default();
    config.directory.fixture = Some(fixture.path().to_path_buf());
    config.notification.mail_servers = vec!["myserver".to_string()];
    config.notification.admin_realms = vec!["adminrealm".to_string()];

    let handler = build_handler(&config).unwrap();
    let actions = handler.actions();
    assert_eq!(actions["sendmail"]["emailconfig"].value, vec!["myserver"]);
    assert_eq!(actions["sendmail"]["To internal admin"].value, vec!["testadmin"]);
    assert_eq!(actions["sendmail"]["To admin realm"].value, vec!["adminrealm"]);

    let definitions: Vec<HandlerDefinition> =
        vec![definition("name: owner\naction: sendmail\noptions:\n  emailconfig: myserver")];
    let outcomes = process_event(&handler, &definitions, &token_init_event("OATH123456"));
    assert_eq!(outcomes[0].outcome, Outcome::Completed(true));

    // An unknown mail server is a transport error, reported as not sent.
    let definitions = vec![definition(
        "name: owner\naction: sendmail\noptions:\n  emailconfig: otherserver",
    )];
    let outcomes = process_event(&handler, &definitions, &token_init_event("OATH123456"));
    assert_eq!(outcomes[0].outcome, Outcome::Completed(false));
}

#[test]
fn test_build_handler_with_missing_fixture_fails() {
    let mut config = Config::default();
    config.directory.fixture = Some("/nonexistent/directory.yml".into());
    assert!(build_handler(&config).is_err());
}
