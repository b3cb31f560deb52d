//! End-to-end delivery over HTTP against a mock chat endpoint.

use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;
use telegram_log::{
    logs::MemoryLog,
    notification::{HttpTransport, TransportError},
    Entry, Error, Level, TelegramLog,
};

fn decorator(uri: String, timeout: Duration) -> TelegramLog {
    TelegramLog::new(Box::new(MemoryLog::new()))
        .with_transport(Arc::new(HttpTransport::new(timeout)))
        .with_chat_id(42)
        .with_request_uri(uri)
}

#[test]
fn test_entry_is_posted_as_form() {
    // Arrange
    let mut server = mockito::Server::new();
    let entry = Entry::new(Level::Error, "database unreachable");
    let expected_text = format!(
        "{}\nERROR\n===\ndatabase unreachable\n",
        entry.dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );
    let mock = server
        .mock("POST", "/bot123:abc/sendMessage")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("chat_id".into(), "42".into()),
            Matcher::UrlEncoded("text".into(), expected_text),
        ]))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create();
    let log = decorator(format!("{}/bot123:abc/sendMessage", server.url()), Duration::from_secs(5));

    // Act
    let result = log.with_entry(&entry);

    // Assert
    assert!(result.is_ok());
    mock.assert();
}

#[test]
fn test_quiet_entry_never_reaches_the_endpoint() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();
    let log = decorator(format!("{}/send", server.url()), Duration::from_secs(5));

    log.with_entry(&Entry::new(Level::Debug, "quiet")).unwrap();

    mock.assert();
}

#[test]
fn test_rejected_delivery_returns_error() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/send")
        .with_status(403)
        .with_body(r#"{"ok":false,"description":"Forbidden: bot was kicked"}"#)
        .create();
    let log = decorator(format!("{}/send", server.url()), Duration::from_secs(5));

    let result = log.with_entry(&Entry::new(Level::Critical, "still alive?"));

    match result {
        Err(Error::Delivery(TransportError::Status { status, body })) => {
            assert_eq!(status.as_u16(), 403);
            assert!(body.contains("bot was kicked"));
        }
        other => panic!("expected a delivery error, got {:?}", other.map(|_| ())),
    }
    mock.assert();
}

#[test]
fn test_unreachable_endpoint_returns_error() {
    let log = decorator("http://127.0.0.1:9/send".to_string(), Duration::from_secs(2));

    let result = log.with_entry(&Entry::new(Level::Error, "nobody listening"));

    assert!(matches!(result, Err(Error::Delivery(TransportError::Request(_)))));
}
