//! The HTTP transport used to hand formatted entries to the chat endpoint.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument};

/// A trait for transports that can deliver a form-encoded POST.
pub trait Transport: Send + Sync {
    /// Posts `fields` form-encoded to `address`.
    ///
    /// # Returns
    /// * `Ok(())` if the endpoint answered with a success status
    /// * `Err` on connection failures, timeouts and non-success statuses
    fn post(&self, address: &str, fields: &[(&str, String)]) -> Result<(), TransportError>;
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("endpoint answered with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// A blocking HTTP transport built on `reqwest`.
///
/// Each call builds and drops its own client, so nothing is pooled between
/// deliveries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            accept_invalid_certs: false,
        }
    }

    /// Skips TLS certificate verification. Only meant for test endpoints.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    fn send_request(
        client: reqwest::blocking::Client,
        address: &str,
        fields: &[(&str, String)],
    ) -> Result<(), TransportError> {
        let response = client.post(address).form(fields).send();

        match response {
            Ok(res) => {
                if res.status().is_success() {
                    info!("Delivered log entry to chat endpoint.");
                    Ok(())
                } else {
                    let status = res.status();
                    let body = res.text().unwrap_or_default();
                    error!(
                        status = %status,
                        body = %body,
                        "Chat endpoint rejected log entry"
                    );
                    Err(TransportError::Status { status, body })
                }
            }
            Err(e) => {
                error!(error = %e, "HTTP request to chat endpoint failed");
                Err(TransportError::Request(e))
            }
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, address, fields))]
    fn post(&self, address: &str, fields: &[(&str, String)]) -> Result<(), TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(TransportError::Client)?;
        Self::send_request(client, address, fields)
    }
}

#[cfg(test)]
mod http_transport_tests {
    use super::*;
    use mockito::Matcher;

    fn fields() -> Vec<(&'static str, String)> {
        vec![("chat_id", "42".to_string()), ("text", "hello\nworld\n".to_string())]
    }

    #[test]
    fn test_post_sends_form_encoded_body() {
        // Arrange
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/send")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("chat_id".into(), "42".into()),
                Matcher::UrlEncoded("text".into(), "hello\nworld\n".into()),
            ]))
            .with_status(200)
            .create();

        // Act
        let result = HttpTransport::default().post(&format!("{}/send", server.url()), &fields());

        // Assert
        assert!(result.is_ok());
        mock.assert();
    }

    #[test]
    fn test_post_handles_server_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/send")
            .with_status(500)
            .with_body("upstream down")
            .create();

        let result = HttpTransport::default().post(&format!("{}/send", server.url()), &fields());

        match result {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected a status error, got {:?}", other),
        }
        mock.assert();
    }

    /// Collects everything the fmt subscriber writes.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_post_does_not_log_the_address() {
        // Arrange
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/bot123:secret-token/sendMessage").with_status(200).create();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        // Act
        let result = tracing::subscriber::with_default(subscriber, || {
            HttpTransport::default().post(
                &format!("{}/bot123:secret-token/sendMessage", server.url()),
                &fields(),
            )
        });

        // Assert
        assert!(result.is_ok());
        mock.assert();
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Delivered log entry"), "nothing captured: {output}");
        assert!(!output.contains("secret-token"), "address leaked: {output}");
    }

    #[test]
    fn test_post_handles_connection_refused() {
        // Nothing listens on port 9 of localhost in the test environment.
        let result = HttpTransport::new(Duration::from_secs(2)).post("http://127.0.0.1:9/send", &fields());

        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
