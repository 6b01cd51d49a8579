use async_trait::async_trait;

use crate::federation::FederationTarget;

use super::errors::EngineError;
use super::stream::ItemStream;
use super::types::{Binding, Quad};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Bindings,
    Graph,
    Boolean,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Bindings => "bindings",
            ResultKind::Graph => "graph",
            ResultKind::Boolean => "boolean",
        }
    }
}

/// The typed result of a successfully submitted query.
pub enum ResultHandle {
    /// SELECT-style results: declared variables plus a stream of rows.
    Bindings {
        variables: Vec<String>,
        stream: ItemStream<Binding>,
    },
    /// CONSTRUCT/DESCRIBE-style results.
    Graph { stream: ItemStream<Quad> },
    /// ASK-style results.
    Boolean(bool),
}

impl ResultHandle {
    pub fn kind(&self) -> ResultKind {
        match self {
            ResultHandle::Bindings { .. } => ResultKind::Bindings,
            ResultHandle::Graph { .. } => ResultKind::Graph,
            ResultHandle::Boolean(_) => ResultKind::Boolean,
        }
    }
}

/// Executes a query against a set of federation targets.
///
/// Implementations return as soon as the result shape is known; rows keep
/// arriving on the handle's stream afterwards.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn submit(
        &self,
        query: &str,
        targets: &[FederationTarget],
    ) -> Result<ResultHandle, EngineError>;
}
