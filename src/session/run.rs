use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::engine::Binding;
use crate::federation::FederationTarget;

use super::accumulator::ResultAccumulator;
use super::timer::{RunTimer, format_progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Settled,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Settled => "settled",
        }
    }
}

/// How a run left the `Running` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// State of the live run. Owned by the session and mutated only under its lock.
#[derive(Debug)]
pub struct Run {
    pub generation: u64,
    pub state: RunState,
    pub query_text: String,
    pub targets: Vec<FederationTarget>,
    pub columns: Vec<String>,
    pub rows: ResultAccumulator,
    pub timer: RunTimer,
    pub possibly_incomplete: bool,
    pub error_message: String,
    stream_end: Arc<AtomicBool>,
    consumer: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            generation: 0,
            state: RunState::Idle,
            query_text: String::new(),
            targets: Vec::new(),
            columns: Vec::new(),
            rows: ResultAccumulator::new(),
            timer: RunTimer::default(),
            possibly_incomplete: false,
            error_message: String::new(),
            stream_end: Arc::new(AtomicBool::new(false)),
            consumer: None,
            ticker: None,
        }
    }
}

impl Run {
    /// Starts a new run, discarding the previous run's tasks. Returns the new generation.
    pub fn begin(&mut self, query_text: String, targets: Vec<FederationTarget>) -> u64 {
        self.abort_tasks();
        self.generation += 1;
        self.state = RunState::Running;
        self.query_text = query_text;
        self.targets = targets;
        self.columns.clear();
        self.rows.reset();
        self.possibly_incomplete = false;
        self.error_message.clear();
        self.stream_end = Arc::new(AtomicBool::new(false));
        self.timer.start();
        self.generation
    }

    /// True while `generation` is the live, still-running run.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.state == RunState::Running
    }

    pub fn append(&mut self, generation: u64, row: Binding) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Raised by the consumer as soon as the result stream reports its end,
    /// before it gets to settle the run. Each run gets a fresh marker.
    pub fn end_marker(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stream_end)
    }

    pub fn stream_ended(&self) -> bool {
        self.stream_end.load(Ordering::Acquire)
    }

    pub fn attach_consumer(&mut self, task: JoinHandle<()>) {
        self.consumer = Some(task);
    }

    pub fn attach_ticker(&mut self, task: JoinHandle<()>) {
        self.ticker = Some(task);
    }

    /// Settles the run. Cancellation aborts the consumer; natural ends let it finish on its own.
    pub fn finish(&mut self, outcome: Outcome) {
        self.state = RunState::Settled;
        self.timer.stop();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        let consumer = self.consumer.take();
        match outcome {
            Outcome::Completed => {
                self.possibly_incomplete = false;
            }
            Outcome::Failed(message) => {
                self.possibly_incomplete = true;
                self.error_message = message;
            }
            Outcome::Cancelled => {
                self.possibly_incomplete = true;
                if let Some(task) = consumer {
                    task.abort();
                }
            }
        }
    }

    pub fn progress_text(&self) -> String {
        format_progress(self.rows.len(), self.timer.elapsed())
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            generation: self.generation,
            state: self.state,
            query_text: self.query_text.clone(),
            targets: self.targets.clone(),
            columns: self.columns.clone(),
            row_count: self.rows.len(),
            possibly_incomplete: self.possibly_incomplete,
            error_message: self.error_message.clone(),
            elapsed: self.timer.elapsed(),
            started_at: self.timer.started_wall(),
            progress_text: self.progress_text(),
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.consumer.take() {
            task.abort();
        }
        if let Some(task) = self.ticker.take() {
            task.abort();
        }
    }
}

impl Drop for Run {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// A point-in-time copy of the run, without the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    pub generation: u64,
    pub state: RunState,
    pub query_text: String,
    pub targets: Vec<FederationTarget>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub possibly_incomplete: bool,
    pub error_message: String,
    pub elapsed: Duration,
    pub started_at: Option<DateTime<Utc>>,
    pub progress_text: String,
}
