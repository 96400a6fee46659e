//! HTTP client for the remote metrics collector
//!
//! The collector assigns a run id before each client execution; the
//! external client process later pushes its metrics against that id on
//! its own. Only the id assignment lives here.
//!
//! The contract is strict: HTTP 200, non-empty body, base-10 integer.
//! Anything else is a typed error carrying the raw response for
//! diagnostics. There is no retry; the coordinator treats a failed
//! request as a failed slot.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::CollectorConfig;
use xfer_bench_common::defaults::API_KEY_HEADER;
use xfer_bench_common::{Environment, Protocol, TimeSlot};

/// Body of `POST /begin`. Key casing is the collector's wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    #[serde(rename = "Protocol")]
    pub protocol: Protocol,
    #[serde(rename = "Environment")]
    pub environment: Environment,
    #[serde(rename = "TimeSlot")]
    pub time_slot: TimeSlot,
    #[serde(rename = "ClientID")]
    pub client_id: u32,
    #[serde(rename = "ParallelClients")]
    pub parallel_clients: u32,
}

/// A run-id request that did not produce a usable id
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Request never completed (connect, TLS, timeout, ...)
    #[error("collector request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any response status other than 200
    #[error("collector returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// 200 with an empty body
    #[error("collector returned an empty run id")]
    EmptyBody,

    /// 200 with a body that is not a base-10 integer
    #[error("run id is not a valid integer: {body}")]
    NotAnInteger { body: String },
}

/// Client for the collector's run-id endpoint.
///
/// Wraps a `reqwest::Client`, which pools connections internally and is
/// safe to clone and share across concurrent slots.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CollectorClient {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Request a new run id for one client slot.
    pub async fn get_run_id(&self, request: &RunRequest) -> Result<i64, CollectorError> {
        let url = format!("{}/begin", self.base_url);
        debug!(
            url = %url,
            protocol = %request.protocol,
            client_id = request.client_id,
            parallel_clients = request.parallel_clients,
            "Requesting run id"
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(CollectorError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        if body.is_empty() {
            return Err(CollectorError::EmptyBody);
        }

        let run_id = body
            .trim()
            .parse::<i64>()
            .map_err(|_| CollectorError::NotAnInteger { body: body.clone() })?;

        debug!(run_id, client_id = request.client_id, "Run id assigned");
        Ok(run_id)
    }
}
