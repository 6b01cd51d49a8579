use thiserror::Error;
use tracing::{debug, error};

/// Errors raised by a query engine, either while submitting a query or while
/// its result stream is being drained.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Endpoint answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Unsupported request: {0}")]
    Unsupported(String),

    #[error("Result stream failed: {0}")]
    Stream(String),

    #[error("Result stream closed")]
    StreamClosed,

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Parse(err.to_string())
    }
}

impl EngineError {
    pub fn log_error(&self) {
        match self {
            EngineError::Unreachable(e) => {
                error!(target: "fed_sparql::engine", "Endpoint unreachable: {}", e);
            }
            EngineError::Http(e) => {
                error!(target: "fed_sparql::engine", "HTTP error: {}", e);
            }
            EngineError::Status { status, body } => {
                error!(target: "fed_sparql::engine", status, "Endpoint rejected query");
                debug!(target: "fed_sparql::engine", "Rejected query response body: {}", body);
            }
            EngineError::Parse(e) => {
                error!(target: "fed_sparql::engine", "Response parse failed: {}", e);
            }
            EngineError::Unsupported(e) => {
                error!(target: "fed_sparql::engine", "Unsupported request: {}", e);
            }
            EngineError::Stream(e) => {
                error!(target: "fed_sparql::engine", "Result stream failed: {}", e);
            }
            EngineError::StreamClosed => {
                debug!(target: "fed_sparql::engine", "Result stream closed by consumer");
            }
            EngineError::Other(e) => {
                error!(target: "fed_sparql::engine", "Engine error: {}", e);
            }
        }
    }
}
