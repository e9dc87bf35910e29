use std::{
    io::{self, Write},
    time::Duration,
};

use pickup_interface::{CompletionPublisher, Error, WaitFuture};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{joints::default_request_timeout_sec, utils::*};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WebCompletionPublisherConfig {
    /// Receives `{"data": "<ID>:<name>"}`.
    pub url: String,
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: f64,
}

#[derive(Debug)]
pub struct WebCompletionPublisher {
    agent: ureq::Agent,
    url: Url,
}

impl WebCompletionPublisher {
    pub fn try_new(config: &WebCompletionPublisherConfig) -> Result<Self, Error> {
        Ok(Self {
            agent: agent(Duration::from_secs_f64(config.request_timeout_sec)),
            url: parse_url(&config.url)?,
        })
    }
}

impl CompletionPublisher for WebCompletionPublisher {
    fn publish(&self, message: &str) -> Result<WaitFuture, Error> {
        debug!(message, url = %self.url, "publish");
        let connection_error = |e: &dyn std::fmt::Display| Error::Connection {
            message: format!("url:{}: {e}", self.url),
        };
        let body = serde_json::to_value(CompletionEvent { data: message })
            .map_err(|e| connection_error(&e))?;
        let response = self
            .agent
            .post(self.url.as_str())
            .send_json(body)
            .map_err(|e| connection_error(&e))?;
        debug!(status = response.status(), "published");
        Ok(WaitFuture::ready())
    }
}

/// Writes each completion event on its own line.
#[derive(Debug, Default)]
pub struct PrintCompletionPublisher {}

impl PrintCompletionPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionPublisher for PrintCompletionPublisher {
    fn publish(&self, message: &str) -> Result<WaitFuture, Error> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{message}")
            .and_then(|()| stdout.flush())
            .map_err(|e| Error::Other(e.into()))?;
        Ok(WaitFuture::ready())
    }
}
