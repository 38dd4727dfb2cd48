//! Error types shared by the client, the stats table and the poller.

use thiserror::Error;

/// Failures reported by the Waldur API client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("error sending request to {url}: {message}")]
    Transport { url: String, message: String },
    #[error("authentication rejected by {url} (status {status})")]
    Unauthorized { url: String, status: u16 },
    #[error("unexpected status code {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("error parsing JSON from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("response from {url} has no usable X-Result-Count header")]
    MissingCount { url: String },
}

/// Why collecting a single statistic failed.
///
/// `Source` wraps a recognised data-source failure. `Unexpected` covers
/// everything else: rows missing a field, values that are not numbers,
/// payloads of the wrong shape or label tuples the registry rejects.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{stat}: {source}")]
    Source {
        stat: String,
        #[source]
        source: ClientError,
    },
    #[error("{stat}: {message}")]
    Unexpected { stat: String, message: String },
}

impl CollectError {
    pub fn from_client(stat: &str, source: ClientError) -> Self {
        CollectError::Source {
            stat: stat.to_string(),
            source,
        }
    }

    pub fn unexpected(stat: &str, message: impl Into<String>) -> Self {
        CollectError::Unexpected {
            stat: stat.to_string(),
            message: message.into(),
        }
    }

    /// Name of the statistic that failed.
    pub fn stat(&self) -> &str {
        match self {
            CollectError::Source { stat, .. } | CollectError::Unexpected { stat, .. } => stat,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, CollectError::Source { .. })
    }
}

/// Errors that prevent the exporter from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("invalid logging configuration: {0}")]
    Logging(String),
    #[error("failed to build API client: {0}")]
    Client(#[from] ClientError),
    #[error("failed to declare gauge: {0}")]
    Registry(#[from] crate::metrics::RegistryError),
    #[error("failed to register poller metrics: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("could not bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
