use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, info};

use crate::engine::errors::EngineError;
use crate::engine::traits::{QueryEngine, ResultHandle};
use crate::federation::{FederationTarget, Protocol};
use crate::shared::config::model::HttpConfig;

use super::{ntriples, sparql_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    SparqlJson,
    NTriples,
}

impl ResponseFormat {
    /// Maps a `Content-Type` header value to a supported format, ignoring parameters.
    pub fn from_content_type(value: &str) -> Option<Self> {
        let media = value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match media.as_str() {
            "application/sparql-results+json" | "application/json" => Some(Self::SparqlJson),
            "application/n-triples" | "application/n-quads" | "text/plain" => {
                Some(Self::NTriples)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpEngineSettings {
    pub user_agent: String,
    pub accept: String,
    pub stream_buffer: usize,
}

impl From<&HttpConfig> for HttpEngineSettings {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            accept: cfg.accept.clone(),
            stream_buffer: cfg.stream_buffer,
        }
    }
}

impl Default for HttpEngineSettings {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

/// Speaks the SPARQL 1.1 protocol to a single endpoint over plain HTTP.
///
/// Fan-out federation needs an engine that decomposes queries into
/// triple-pattern lookups; this one rejects such target lists.
pub struct HttpSparqlEngine {
    client: Client<HttpConnector, Full<Bytes>>,
    settings: HttpEngineSettings,
}

impl HttpSparqlEngine {
    pub fn new(settings: HttpEngineSettings) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client, settings }
    }

    fn build_request(&self, endpoint: &Uri, query: &str) -> Result<Request<Full<Bytes>>, EngineError> {
        Request::builder()
            .method(Method::POST)
            .uri(endpoint.clone())
            .header(CONTENT_TYPE, "application/sparql-query")
            .header(ACCEPT, self.settings.accept.as_str())
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .body(Full::new(Bytes::from(query.to_string())))
            .map_err(|e| EngineError::Http(format!("Failed to build request: {}", e)))
    }
}

/// Picks the endpoint to contact, rejecting target lists this engine cannot serve.
pub fn single_direct_target(targets: &[FederationTarget]) -> Result<Uri, EngineError> {
    let target = match targets {
        [] => return Err(EngineError::Unsupported("no federation targets".to_string())),
        [target] if target.protocol == Protocol::Direct => target,
        _ => {
            return Err(EngineError::Unsupported(format!(
                "fan-out federation across {} sources needs a federating engine",
                targets.len()
            )));
        }
    };

    let uri = target
        .address
        .parse::<Uri>()
        .map_err(|e| EngineError::Unsupported(format!("invalid endpoint {}: {}", target.address, e)))?;

    match uri.scheme_str() {
        Some("http") => Ok(uri),
        Some(scheme) => Err(EngineError::Unsupported(format!(
            "{} endpoints are not supported over plain HTTP: {}",
            scheme, target.address
        ))),
        None => Err(EngineError::Unsupported(format!(
            "endpoint has no scheme: {}",
            target.address
        ))),
    }
}

#[async_trait]
impl QueryEngine for HttpSparqlEngine {
    async fn submit(
        &self,
        query: &str,
        targets: &[FederationTarget],
    ) -> Result<ResultHandle, EngineError> {
        let endpoint = single_direct_target(targets)?;
        let request = self.build_request(&endpoint, query)?;

        debug!(target: "fed_sparql::engine", endpoint = %endpoint, "Posting query");

        let response = self.client.request(request).await.map_err(|e| {
            if e.is_connect() {
                EngineError::Unreachable(format!("{}: {}", endpoint, e))
            } else {
                EngineError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .into_body()
                .collect()
                .await
                .map(|collected| String::from_utf8_lossy(&collected.to_bytes()).into_owned())
                .unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        let format = ResponseFormat::from_content_type(&content_type).ok_or_else(|| {
            EngineError::Unsupported(format!("unsupported response content type '{}'", content_type))
        })?;

        info!(
            target: "fed_sparql::engine",
            endpoint = %endpoint,
            format = ?format,
            "Endpoint accepted query"
        );

        match format {
            ResponseFormat::SparqlJson => {
                sparql_json::stream_handle(response.into_body(), self.settings.stream_buffer).await
            }
            ResponseFormat::NTriples => Ok(ResultHandle::Graph {
                stream: ntriples::spawn_stream(response.into_body(), self.settings.stream_buffer),
            }),
        }
    }
}
