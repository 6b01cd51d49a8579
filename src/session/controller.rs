use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::engine::{Binding, QueryEngine, ResultHandle};
use crate::federation::{
    FederationTarget, SelectionError, SourceCatalog, SourceRegistry, SourceSelection, plan,
};
use crate::shared::config::model::SessionConfig;

use super::editor::QueryEditor;
use super::run::{Outcome, Run, RunSnapshot, RunState};
use super::shape::{RowSource, normalize};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// How often the run timer is re-sampled while a query runs.
    pub timer_tick: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            timer_tick: Duration::from_millis(cfg.timer_tick_ms.max(1)),
        }
    }
}

struct SessionState {
    query_text: String,
    registry: SourceRegistry,
    run: Run,
}

struct Shared {
    state: Mutex<SessionState>,
    changes: watch::Sender<u64>,
    engine: Arc<dyn QueryEngine>,
    editor: Mutex<Option<Arc<dyn QueryEditor>>>,
    settings: SessionSettings,
}

impl Shared {
    fn notify(&self) {
        self.changes
            .send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    /// Settles `generation` if it is still the live run. Stale outcomes are dropped.
    fn finish(&self, generation: u64, outcome: Outcome) -> bool {
        let label = match &outcome {
            Outcome::Completed => "completed",
            Outcome::Failed(_) => "failed",
            Outcome::Cancelled => "cancelled",
        };

        let rows = {
            let mut state = self.state.lock();
            if !state.run.is_current(generation) {
                debug!(
                    target: "fed_sparql::session",
                    generation,
                    outcome = label,
                    "Ignoring outcome of superseded run"
                );
                return false;
            }
            state.run.finish(outcome);
            state.run.rows.len()
        };

        self.notify();
        info!(
            target: "fed_sparql::session",
            generation,
            rows,
            outcome = label,
            "Run settled"
        );
        true
    }
}

/// Owns the query text, source selection and the single live run.
///
/// Cloning yields another handle to the same session. All reads return copies,
/// and every change is announced through [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct QuerySession {
    shared: Arc<Shared>,
}

impl QuerySession {
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        registry: SourceRegistry,
        settings: SessionSettings,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    query_text: String::new(),
                    registry,
                    run: Run::default(),
                }),
                changes,
                engine,
                editor: Mutex::new(None),
                settings,
            }),
        }
    }

    pub fn from_catalog(
        engine: Arc<dyn QueryEngine>,
        catalog: &dyn SourceCatalog,
        settings: SessionSettings,
    ) -> Self {
        Self::new(engine, SourceRegistry::from_catalog(catalog), settings)
    }

    pub fn with_editor(self, editor: Arc<dyn QueryEditor>) -> Self {
        *self.shared.editor.lock() = Some(editor);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }

    pub fn query_text(&self) -> String {
        self.shared.state.lock().query_text.clone()
    }

    pub fn set_query_text(&self, text: impl Into<String>) {
        self.shared.state.lock().query_text = text.into();
        self.shared.notify();
    }

    pub fn sources(&self) -> Vec<SourceSelection> {
        self.shared.state.lock().registry.entries().to_vec()
    }

    pub fn selected_sources(&self) -> Vec<SourceSelection> {
        self.shared
            .state
            .lock()
            .registry
            .selected()
            .cloned()
            .collect()
    }

    pub fn set_source_selected(&self, identifier: &str, selected: bool) -> Result<(), SelectionError> {
        self.shared
            .state
            .lock()
            .registry
            .set_selected(identifier, selected)?;
        self.shared.notify();
        Ok(())
    }

    pub fn toggle_source(&self, identifier: &str) -> Result<bool, SelectionError> {
        let selected = self.shared.state.lock().registry.toggle(identifier)?;
        self.shared.notify();
        Ok(selected)
    }

    /// Targets the next run would be submitted with.
    pub fn targets(&self) -> Vec<FederationTarget> {
        plan(self.shared.state.lock().registry.entries())
    }

    pub fn is_runnable(&self) -> bool {
        !self.targets().is_empty()
    }

    pub fn state(&self) -> RunState {
        self.shared.state.lock().run.state
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn possibly_incomplete(&self) -> bool {
        self.shared.state.lock().run.possibly_incomplete
    }

    pub fn error_message(&self) -> String {
        self.shared.state.lock().run.error_message.clone()
    }

    pub fn columns(&self) -> Vec<String> {
        self.shared.state.lock().run.columns.clone()
    }

    pub fn row_count(&self) -> usize {
        self.shared.state.lock().run.rows.len()
    }

    pub fn rows(&self) -> Vec<Binding> {
        self.shared.state.lock().run.rows.rows().to_vec()
    }

    pub fn rows_since(&self, offset: usize) -> Vec<Binding> {
        self.shared.state.lock().run.rows.since(offset).to_vec()
    }

    pub fn progress_text(&self) -> String {
        self.shared.state.lock().run.progress_text()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.shared.state.lock().run.snapshot()
    }

    /// Loads a saved or example query. Does not execute it.
    pub fn replay<S: AsRef<str>>(&self, query_text: &str, source_ids: &[S]) {
        {
            let mut state = self.shared.state.lock();
            state.query_text = query_text.to_string();
            state.registry.select_exactly(source_ids);
        }

        let editor = self.shared.editor.lock().clone();
        if let Some(editor) = editor {
            editor.set_value(query_text);
        }

        self.shared.notify();
        debug!(
            target: "fed_sparql::session",
            sources = source_ids.len(),
            "Replayed query"
        );
    }

    /// Starts a new run with the current query text and selection.
    ///
    /// Returns the run's generation, or `None` without touching any state when
    /// no source is selected. Engine failures never escape: they settle the run
    /// with an error message.
    pub async fn execute(&self) -> Option<u64> {
        let (generation, query, targets) = {
            let mut state = self.shared.state.lock();
            let targets = plan(state.registry.entries());
            if targets.is_empty() {
                debug!(target: "fed_sparql::session", "No source selected, nothing to execute");
                return None;
            }
            let query = state.query_text.clone();
            let generation = state.run.begin(query.clone(), targets.clone());
            let ticker = tokio::spawn(tick(Arc::downgrade(&self.shared), generation));
            state.run.attach_ticker(ticker);
            (generation, query, targets)
        };
        self.shared.notify();

        info!(
            target: "fed_sparql::session",
            generation,
            targets = targets.len(),
            protocol = %targets[0].protocol,
            "Submitting query"
        );

        let submission = tokio::select! {
            result = self.shared.engine.submit(&query, &targets) => Some(result),
            _ = self.superseded(generation) => None,
        };

        match submission {
            Some(Ok(handle)) => self.attach(generation, handle),
            Some(Err(error)) => {
                error.log_error();
                self.shared
                    .finish(generation, Outcome::Failed(error.to_string()));
            }
            None => {
                debug!(
                    target: "fed_sparql::session",
                    generation,
                    "Submission abandoned"
                );
            }
        }

        Some(generation)
    }

    /// Stops the live run. Returns `false` when nothing was running.
    ///
    /// Rows gathered so far stay visible and the run is flagged as possibly incomplete.
    /// A run whose result stream has already ended is settled as completed instead.
    pub fn cancel(&self) -> bool {
        let (generation, cancelled) = {
            let mut state = self.shared.state.lock();
            if state.run.state != RunState::Running {
                debug!(
                    target: "fed_sparql::session",
                    state = state.run.state.as_str(),
                    "Nothing to cancel"
                );
                return false;
            }
            let cancelled = !state.run.stream_ended();
            state.run.finish(if cancelled {
                Outcome::Cancelled
            } else {
                Outcome::Completed
            });
            (state.run.generation, cancelled)
        };

        self.shared.notify();
        if cancelled {
            info!(target: "fed_sparql::session", generation, "Run cancelled");
        } else {
            info!(
                target: "fed_sparql::session",
                generation,
                "Result stream already ended, run settled as completed"
            );
        }
        cancelled
    }

    #[cfg(test)]
    pub(crate) fn stream_end_marker(&self) -> Arc<AtomicBool> {
        self.shared.state.lock().run.end_marker()
    }

    /// Resolves once the live run has settled.
    pub async fn wait_settled(&self) -> RunSnapshot {
        let mut changes = self.subscribe();
        loop {
            if !self.is_running() {
                return self.snapshot();
            }
            if changes.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    fn attach(&self, generation: u64, handle: ResultHandle) {
        let kind = handle.kind();
        let (columns, mut rows) = normalize(handle);

        {
            let mut state = self.shared.state.lock();
            if !state.run.is_current(generation) {
                drop(state);
                rows.destroy();
                debug!(
                    target: "fed_sparql::session",
                    generation,
                    "Discarding result of superseded run"
                );
                return;
            }
            state.run.columns = columns;
            let ended = state.run.end_marker();
            let consumer = tokio::spawn(consume(
                Arc::downgrade(&self.shared),
                generation,
                rows,
                ended,
            ));
            state.run.attach_consumer(consumer);
        }

        self.shared.notify();
        debug!(
            target: "fed_sparql::session",
            generation,
            kind = kind.as_str(),
            "Result stream attached"
        );
    }

    async fn superseded(&self, generation: u64) {
        let mut changes = self.subscribe();
        loop {
            let current = self.shared.state.lock().run.is_current(generation);
            if !current {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Drains one run's rows into the accumulator until the stream ends or the run is superseded.
///
/// Tasks hold the session weakly; dropping the last handle stops them.
async fn consume(
    shared: Weak<Shared>,
    generation: u64,
    mut rows: RowSource,
    ended: Arc<AtomicBool>,
) {
    loop {
        let next = rows.next_row().await;
        if next.is_none() {
            ended.store(true, Ordering::Release);
        }
        let Some(shared) = shared.upgrade() else {
            return;
        };
        match next {
            Some(Ok(row)) => {
                let appended = shared.state.lock().run.append(generation, row);
                if !appended {
                    rows.destroy();
                    return;
                }
                shared.notify();
            }
            Some(Err(error)) => {
                error.log_error();
                shared.finish(generation, Outcome::Failed(error.to_string()));
                return;
            }
            None => {
                shared.finish(generation, Outcome::Completed);
                return;
            }
        }
    }
}

/// Re-samples the run timer until the run settles.
async fn tick(shared: Weak<Shared>, generation: u64) {
    let period = match shared.upgrade() {
        Some(shared) => shared.settings.timer_tick,
        None => return,
    };
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let sampled = {
            let mut state = shared.state.lock();
            if state.run.is_current(generation) {
                state.run.timer.sample();
                true
            } else {
                false
            }
        };
        if !sampled {
            return;
        }
        shared.notify();
    }
}
