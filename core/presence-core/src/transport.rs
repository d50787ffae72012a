//! Request/response transport to the daemon.
//!
//! The daemon listens on a loopback HTTP address and answers each POSTed
//! envelope with a bare JSON value. No request timeout is configured: a dead
//! daemon shows up as a refused connection, and the heartbeat cadence is what
//! detects a hung one.

use async_trait::async_trait;
use presence_daemon_protocol::{Method, Request};
use serde_json::Value;

use crate::error::CallError;

/// One round trip to the daemon.
///
/// The session client only ever talks through this trait, so tests can swap
/// the network for a scripted fake.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: &Request) -> Result<Value, CallError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    address: String,
}

impl HttpTransport {
    pub fn new(address: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, address))
    }

    pub fn with_client(client: reqwest::Client, address: impl Into<String>) -> Self {
        Self {
            client,
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn classify(&self, method: Method, err: reqwest::Error) -> CallError {
        if err.is_connect() {
            CallError::Unreachable {
                address: self.address.clone(),
                details: err.to_string(),
            }
        } else if err.is_status() || err.is_decode() || err.is_builder() {
            CallError::Protocol {
                method,
                details: err.to_string(),
            }
        } else {
            CallError::Transport {
                method,
                details: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: &Request) -> Result<Value, CallError> {
        let method = request.method;
        let response = self
            .client
            .post(&self.address)
            .json(request)
            .send()
            .await
            .map_err(|err| self.classify(method, err))?
            .error_for_status()
            .map_err(|err| self.classify(method, err))?;

        let body = response
            .bytes()
            .await
            .map_err(|err| self.classify(method, err))?;

        // `im_leaving` may be answered with an empty body.
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|err| CallError::Protocol {
            method,
            details: format!("Failed to parse reply JSON: {}", err),
        })
    }
}
