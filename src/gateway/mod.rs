//! HTTP gateway to the fitting backend.
//!
//! Every outbound call goes through one path:
//! - a per-call deadline (120 s by default) covering send and body read
//! - no automatic retries
//! - uniform decoding of transport, HTTP, and application failures (`decode`)
//!
//! The `Backend` trait is the seam the session pipeline and the TUI depend
//! on; `HttpGateway` is the production implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientSettings;
use crate::domain::{BrowserTable, DatasetUpload, FitOutcome, FittingRequest, LoadedDataset, TableData};
use crate::report::StatusMessage;

pub mod decode;

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Why a backend call produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Connection, TLS, body read, or undecodable success body.
    #[error("Failed to reach backend: {0}")]
    Transport(String),

    #[error("Failed to reach backend: request timed out after {}", fmt_duration(.0))]
    Timeout(Duration),

    /// Non-2xx response, with the message extracted from its body.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 2xx response whose `status` field was not `"success"`.
    #[error("{0}")]
    Application(String),

    /// Success response missing a required field.
    #[error("{0}")]
    InvalidPayload(String),

    #[error("Invalid backend URL '{0}'")]
    InvalidUrl(String),
}

impl From<GatewayError> for StatusMessage {
    fn from(err: GatewayError) -> Self {
        StatusMessage::error(err.to_string())
    }
}

fn fmt_duration(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Operations the console needs from the fitting backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Upload a raw dataset file (`POST datasets/load`).
    async fn load_dataset(&self, upload: DatasetUpload) -> Result<LoadedDataset, GatewayError>;

    /// Submit a fitting run (`POST fitting/run`).
    async fn run_fitting(&self, request: &FittingRequest) -> Result<FitOutcome, GatewayError>;

    /// List browsable result tables (`GET browser/tables`).
    async fn list_tables(&self) -> Result<Vec<BrowserTable>, GatewayError>;

    /// Fetch all rows of one table (`GET browser/data/<table>`).
    async fn fetch_table(&self, table_name: &str) -> Result<TableData, GatewayError>;
}

/// `reqwest`-backed implementation of [`Backend`].
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, GatewayError> {
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, GatewayError> {
        Self::new(settings.api_base_url.clone(), settings.http_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append path segments to the base URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send a request and read the whole body under the call deadline.
    async fn exchange(&self, endpoint: &'static str, request: RequestBuilder) -> Result<(u16, Vec<u8>), GatewayError> {
        let started = Instant::now();
        debug!(endpoint, "dispatching backend call");

        let call = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        let result = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(GatewayError::Transport(e.to_string())),
            Ok(Ok(parts)) => Ok(parts),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok((status, _)) => debug!(endpoint, status, elapsed_ms, "backend call finished"),
            Err(e) => warn!(endpoint, elapsed_ms, error = %e, "backend call failed"),
        }
        result
    }
}

#[async_trait]
impl Backend for HttpGateway {
    async fn load_dataset(&self, upload: DatasetUpload) -> Result<LoadedDataset, GatewayError> {
        let url = self.endpoint(&["datasets", "load"])?;
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("file", part);
        let (status, body) = self
            .exchange("datasets/load", self.client.post(url).multipart(form))
            .await?;
        decode::decode_dataset(status, &body)
    }

    async fn run_fitting(&self, request: &FittingRequest) -> Result<FitOutcome, GatewayError> {
        let url = self.endpoint(&["fitting", "run"])?;
        let (status, body) = self
            .exchange("fitting/run", self.client.post(url).json(request))
            .await?;
        decode::decode_fit(status, &body)
    }

    async fn list_tables(&self) -> Result<Vec<BrowserTable>, GatewayError> {
        let url = self.endpoint(&["browser", "tables"])?;
        let (status, body) = self.exchange("browser/tables", self.client.get(url)).await?;
        decode::decode_tables(status, &body)
    }

    async fn fetch_table(&self, table_name: &str) -> Result<TableData, GatewayError> {
        let url = self.endpoint(&["browser", "data", table_name])?;
        let (status, body) = self.exchange("browser/data", self.client.get(url)).await?;
        decode::decode_table_data(table_name, status, &body)
    }
}
