use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::engine::{EngineError, QueryEngine, ResultHandle};
use crate::federation::FederationTarget;

pub enum Scripted {
    Handle(ResultHandle),
    Fail(String),
    /// Submission blocks until the test sends the outcome through the paired sender.
    Gated(oneshot::Receiver<Result<ResultHandle, EngineError>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub query: String,
    pub targets: Vec<FederationTarget>,
}

/// A query engine that replays scripted responses in order and records every submission.
#[derive(Default)]
pub struct ScriptedEngine {
    responses: Mutex<VecDeque<Scripted>>,
    submissions: Mutex<Vec<Submission>>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond_with(&self, handle: ResultHandle) {
        self.responses.lock().push_back(Scripted::Handle(handle));
    }

    pub fn fail_with(&self, message: &str) {
        self.responses
            .lock()
            .push_back(Scripted::Fail(message.to_string()));
    }

    pub fn gate(&self) -> oneshot::Sender<Result<ResultHandle, EngineError>> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn submit(
        &self,
        query: &str,
        targets: &[FederationTarget],
    ) -> Result<ResultHandle, EngineError> {
        self.submissions.lock().push(Submission {
            query: query.to_string(),
            targets: targets.to_vec(),
        });

        let next = self.responses.lock().pop_front();
        match next {
            Some(Scripted::Handle(handle)) => Ok(handle),
            Some(Scripted::Fail(message)) => Err(EngineError::Other(message)),
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(EngineError::Other("gate dropped".to_string()))),
            None => Err(EngineError::Other("no scripted response".to_string())),
        }
    }
}
