//! Shared helpers for infra integration tests

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mixtape_common::auth::TokenManager;
use mixtape_common::resilience::RetryConfig;
use mixtape_domain::Credentials;
use mixtape_infra::api::{AccessTokenProvider, ServiceAdapter, StaticTokenProvider};
use mixtape_infra::http::HttpTransport;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::MockServer;

pub const TOKEN_PATH: &str = "/api/token";

/// Transport against `server` with fast, jitter-free backoff.
pub fn transport(server: &MockServer, retries: u32, auth: Arc<dyn AccessTokenProvider>) -> HttpTransport {
    HttpTransport::builder()
        .base_url(format!("{}/v1", server.uri()))
        .timeout(Duration::from_secs(2))
        .retry_config(
            RetryConfig::builder()
                .max_retries(retries)
                .base_delay(Duration::from_millis(5))
                .max_delay(Duration::from_millis(100))
                .no_jitter()
                .build()
                .expect("retry config"),
        )
        .auth(auth)
        .build()
        .expect("transport")
}

pub fn static_transport(server: &MockServer, retries: u32) -> HttpTransport {
    transport(server, retries, Arc::new(StaticTokenProvider::new("test-token")))
}

pub fn adapter(server: &MockServer, retries: u32) -> ServiceAdapter {
    ServiceAdapter::new(Arc::new(static_transport(server, retries)))
}

/// Token manager whose endpoint is `server` + [`TOKEN_PATH`].
pub fn token_manager(server: &MockServer) -> TokenManager {
    let credentials =
        Credentials::new("client-id", "client-secret", format!("{}{TOKEN_PATH}", server.uri()))
            .expect("credentials");
    TokenManager::from_credentials(credentials, Duration::from_secs(2)).expect("token manager")
}

/// URL of a local port nothing listens on.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{address}")
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().expect("log buffer")).into_owned()
    }

    /// Subscriber writing every event at `debug` and above into this buffer.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
