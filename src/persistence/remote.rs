//! Remote layout store and capability source over HTTP
//!
//! Both endpoints speak JSON. The layout store wraps its payload in a
//! `{ "layout": [...] | null }` envelope and requires a bearer credential.

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::capability::{CapabilityMap, CapabilitySource};
use crate::constants::remote::CONNECT_TIMEOUT_SECS;
use crate::error::StoreError;
use crate::types::SavedLayout;

/// Supplies the bearer token of the signed-in user, if any
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed credential (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(pub Option<String>);

impl StaticCredential {
    pub fn token(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the token from an environment variable on every call; empty means absent
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredential {
    fn bearer_token(&self) -> Option<String> {
        env::var(&self.var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// Remote home of the user's saved layout
pub trait RemoteLayoutStore: Send + Sync {
    fn fetch(&self, token: &str) -> Result<Option<SavedLayout>, StoreError>;
    fn store(&self, token: &str, layout: &SavedLayout) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct LayoutEnvelope {
    #[serde(default)]
    layout: Option<SavedLayout>,
}

#[derive(Debug, Serialize)]
struct LayoutEnvelopeRef<'a> {
    layout: &'a SavedLayout,
}

fn build_client(timeout: Duration) -> Result<Client, StoreError> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
        .timeout(timeout)
        .build()?)
}

fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::Status { status: status.as_u16() });
    }
    Ok(response)
}

/// `GET`/`POST` layout endpoint
#[derive(Debug, Clone)]
pub struct HttpLayoutStore {
    client: Client,
    endpoint: String,
}

impl HttpLayoutStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    /// Use a preconfigured client (proxy or TLS settings)
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl RemoteLayoutStore for HttpLayoutStore {
    fn fetch(&self, token: &str) -> Result<Option<SavedLayout>, StoreError> {
        let response = self.client.get(&self.endpoint).bearer_auth(token).send()?;
        let body = check_status(response)?.text()?;
        let envelope: LayoutEnvelope = serde_json::from_str(&body)?;
        debug!(endpoint = %self.endpoint, entries = ?envelope.layout.as_ref().map(SavedLayout::len), "Fetched remote layout");
        Ok(envelope.layout)
    }

    fn store(&self, token: &str, layout: &SavedLayout) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&LayoutEnvelopeRef { layout })
            .send()?;
        check_status(response)?;
        debug!(endpoint = %self.endpoint, entries = layout.len(), "Stored remote layout");
        Ok(())
    }
}

/// `GET` capability endpoint returning a map of widget id to record
pub struct HttpCapabilitySource {
    client: Client,
    endpoint: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpCapabilitySource {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        }
    }
}

impl CapabilitySource for HttpCapabilitySource {
    fn fetch(&self) -> Result<CapabilityMap, StoreError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = self.credentials.bearer_token() {
            request = request.bearer_auth(token);
        }
        let body = check_status(request.send()?)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GridRect, SavedPlacement};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Answers exactly one HTTP request with `status` and `body`, returning the raw request
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str("\r\n");
            request.push_str(&String::from_utf8_lossy(&payload));

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(request).unwrap();
        });

        (format!("http://{addr}/layout"), rx)
    }

    fn local_client() -> Client {
        Client::builder().no_proxy().timeout(Duration::from_secs(5)).build().unwrap()
    }

    #[test]
    fn test_fetch_parses_envelope_and_sends_bearer() {
        let (url, requests) = serve_once("200 OK", r#"{"layout":[{"i":"radio","x":1,"y":2,"w":3,"h":4}]}"#);
        let store = HttpLayoutStore::with_client(local_client(), url);

        let layout = store.fetch("secret").unwrap().unwrap();
        assert_eq!(layout.get("radio").unwrap().grid_rect(), GridRect::new(1, 2, 3, 4));

        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /layout"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
    }

    #[test]
    fn test_fetch_null_layout() {
        let (url, _requests) = serve_once("200 OK", r#"{"layout":null}"#);
        let store = HttpLayoutStore::with_client(local_client(), url);
        assert_eq!(store.fetch("t").unwrap(), None);
    }

    #[test]
    fn test_fetch_non_success_is_status_error() {
        let (url, _requests) = serve_once("500 Internal Server Error", "{}");
        let store = HttpLayoutStore::with_client(local_client(), url);
        let err = store.fetch("t").unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 500 }));
    }

    #[test]
    fn test_fetch_malformed_payload() {
        let (url, _requests) = serve_once("200 OK", "not json");
        let store = HttpLayoutStore::with_client(local_client(), url);
        assert!(matches!(store.fetch("t").unwrap_err(), StoreError::Malformed(_)));
    }

    #[test]
    fn test_store_posts_envelope() {
        let (url, requests) = serve_once("200 OK", r#"{"ok":true}"#);
        let store = HttpLayoutStore::with_client(local_client(), url);
        let layout = SavedLayout(vec![SavedPlacement::new("weather", GridRect::new(0, 5, 3, 6))]);

        store.store("t", &layout).unwrap();

        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /layout"));
        let body = request.split("\r\n\r\n").last().unwrap();
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["layout"][0]["i"], "weather");
    }

    #[test]
    fn test_capability_source_parses_map() {
        let (url, _requests) = serve_once("200 OK", r#"{"radio":{"isLocked":true}}"#);
        let source = HttpCapabilitySource::with_client(local_client(), url, Arc::new(StaticCredential::none()));
        let records = source.fetch().unwrap();
        assert!(records["radio"].is_locked);
        assert!(records["radio"].allow_drag);
    }

    #[test]
    fn test_static_credential() {
        assert_eq!(StaticCredential::token("abc").bearer_token().as_deref(), Some("abc"));
        assert_eq!(StaticCredential::none().bearer_token(), None);
    }

    #[test]
    fn test_env_credential_missing_var() {
        let credential = EnvCredential::new("DASHGRID_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert_eq!(credential.bearer_token(), None);
    }
}
