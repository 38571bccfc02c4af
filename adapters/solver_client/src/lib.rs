#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Client for the external grid solver service.
//!
//! The pipeline serializes a [`SolveRequest`], issues exactly one `POST` to
//! `<base>/solve`, and validates the response before any state is touched.
//! Network access sits behind the [`Transport`] trait so the pipeline can be
//! exercised without a live service.

mod dispatch;
mod wire;

use std::time::Duration;

use gridpath_core::{SolveFailure, SolveRequest, SolveResult};
use thiserror::Error;
use tracing::{debug, warn};

pub use self::dispatch::{PendingSolve, SolveLauncher};
pub use self::wire::{decode_response, encode_request, error_detail};

/// Base address used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Environment variable overriding the solver base address.
pub const BASE_URL_ENV: &str = "GRIDPATH_SOLVER_URL";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while talking to the solver.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The request could not be delivered or the response could not be read.
    #[error("solver request failed: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
    /// The solver answered with a non-success status.
    #[error("solver responded with status {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Detail extracted from the response body.
        detail: String,
    },
    /// The response body did not match the expected shape.
    #[error("invalid solver response: {message}")]
    InvalidResponse {
        /// Description of the first violation found.
        message: String,
    },
    /// The request could not be serialized.
    #[error("failed to encode solve request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SolveError {
    /// Classifies the error into the failure taxonomy surfaced to users.
    #[must_use]
    pub fn failure(&self) -> SolveFailure {
        match self {
            Self::Transport { .. } | Self::Status { .. } | Self::Encode(_) => {
                SolveFailure::Transport {
                    message: self.to_string(),
                }
            }
            Self::InvalidResponse { message } => SolveFailure::InvalidResponse {
                message: message.clone(),
            },
        }
    }
}

impl From<reqwest::Error> for SolveError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("timed out: {error}")
        } else {
            error.to_string()
        };
        Self::Transport { message }
    }
}

/// Raw response returned by a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl TransportResponse {
    /// Reports whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers JSON bodies to the solver.
pub trait Transport {
    /// Posts `body` to `url` and returns the raw response.
    fn post_json(&self, url: &str, body: String) -> Result<TransportResponse, SolveError>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds a client with the provided request timeout.
    pub fn new(timeout: Duration) -> Result<Self, SolveError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, body: String) -> Result<TransportResponse, SolveError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(TransportResponse { status, body })
    }
}

/// Location of the solver service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverEndpoint {
    base_url: String,
}

impl SolverEndpoint {
    /// Creates an endpoint rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    /// Resolves the base address from the first non-empty source.
    ///
    /// Precedence is command-line flag, then environment, then configuration
    /// file, then [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn from_sources(
        flag: Option<&str>,
        environment: Option<&str>,
        file: Option<&str>,
    ) -> Self {
        let base_url = [flag, environment, file]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        Self::new(base_url)
    }

    /// Resolves the base address, reading [`BASE_URL_ENV`] from the process environment.
    #[must_use]
    pub fn resolve(flag: Option<&str>, file: Option<&str>) -> Self {
        let environment = std::env::var(BASE_URL_ENV).ok();
        Self::from_sources(flag, environment.as_deref(), file)
    }

    /// Base address without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full address of the solve endpoint.
    #[must_use]
    pub fn solve_url(&self) -> String {
        format!("{}/solve", self.base_url)
    }
}

impl Default for SolverEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Serializes requests, calls the solver and validates responses.
#[derive(Debug)]
pub struct SolvePipeline<T> {
    transport: T,
    endpoint: SolverEndpoint,
}

impl<T: Transport> SolvePipeline<T> {
    /// Creates a pipeline that talks to `endpoint` through `transport`.
    #[must_use]
    pub fn new(transport: T, endpoint: SolverEndpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    /// Endpoint the pipeline posts to.
    #[must_use]
    pub fn endpoint(&self) -> &SolverEndpoint {
        &self.endpoint
    }

    /// Transport used to reach the solver.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Performs a single solve call.
    ///
    /// Any transport failure, non-success status or malformed body is
    /// returned as an error; no retries are attempted.
    pub fn solve(&self, request: &SolveRequest) -> Result<SolveResult, SolveError> {
        let body = encode_request(request)?;
        let url = self.endpoint.solve_url();
        debug!(
            %url,
            algorithm = %request.algorithm,
            dimensions = %request.grid.dimensions(),
            "sending solve request"
        );

        let response = self.transport.post_json(&url, body)?;
        if !response.is_success() {
            let error = SolveError::Status {
                status: response.status,
                detail: error_detail(&response.body),
            };
            warn!(%error, "solver rejected request");
            return Err(error);
        }

        let result = decode_response(&response.body, request.grid.dimensions())?;
        debug!(
            solved = result.stats.solved,
            time_ms = result.stats.time_ms,
            visited = result.visited.len(),
            path = result.path.len(),
            "solver response accepted"
        );
        Ok(result)
    }
}

impl SolvePipeline<HttpTransport> {
    /// Creates a pipeline using an HTTP transport with the provided timeout.
    pub fn http(endpoint: SolverEndpoint, timeout: Duration) -> Result<Self, SolveError> {
        Ok(Self::new(HttpTransport::new(timeout)?, endpoint))
    }
}
