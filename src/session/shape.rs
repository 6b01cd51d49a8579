use crate::engine::{Binding, EngineError, ItemStream, Quad, ResultHandle, Term};

pub const GRAPH_COLUMNS: [&str; 4] = ["subject", "predicate", "object", "graph"];
pub const BOOLEAN_COLUMN: &str = "result";

/// A result handle reduced to a uniform stream of rows.
pub enum RowSource {
    Bindings(ItemStream<Binding>),
    Graph(ItemStream<Quad>),
    Single(Option<Binding>),
}

impl RowSource {
    pub async fn next_row(&mut self) -> Option<Result<Binding, EngineError>> {
        match self {
            RowSource::Bindings(stream) => stream.recv().await,
            RowSource::Graph(stream) => stream.recv().await.map(|item| item.map(quad_row)),
            RowSource::Single(row) => row.take().map(Ok),
        }
    }

    pub fn destroy(&mut self) {
        match self {
            RowSource::Bindings(stream) => stream.destroy(),
            RowSource::Graph(stream) => stream.destroy(),
            RowSource::Single(row) => {
                row.take();
            }
        }
    }
}

/// Splits a handle into its column list and row source.
pub fn normalize(handle: ResultHandle) -> (Vec<String>, RowSource) {
    match handle {
        ResultHandle::Bindings { variables, stream } => bindings_shape(variables, stream),
        ResultHandle::Graph { stream } => graph_shape(stream),
        ResultHandle::Boolean(value) => boolean_shape(value),
    }
}

fn bindings_shape(variables: Vec<String>, stream: ItemStream<Binding>) -> (Vec<String>, RowSource) {
    (variables, RowSource::Bindings(stream))
}

fn graph_shape(stream: ItemStream<Quad>) -> (Vec<String>, RowSource) {
    let columns = GRAPH_COLUMNS.iter().map(|c| c.to_string()).collect();
    (columns, RowSource::Graph(stream))
}

fn boolean_shape(value: bool) -> (Vec<String>, RowSource) {
    (
        vec![BOOLEAN_COLUMN.to_string()],
        RowSource::Single(Some(boolean_row(value))),
    )
}

/// Maps a statement onto the fixed graph columns. The default graph leaves `graph` unbound.
pub fn quad_row(quad: Quad) -> Binding {
    let mut row = Binding::new()
        .with(GRAPH_COLUMNS[0], quad.subject)
        .with(GRAPH_COLUMNS[1], quad.predicate)
        .with(GRAPH_COLUMNS[2], quad.object);
    if let Some(graph) = quad.graph {
        row.insert(GRAPH_COLUMNS[3], graph);
    }
    row
}

pub fn boolean_row(value: bool) -> Binding {
    Binding::new().with(BOOLEAN_COLUMN, Term::boolean(value))
}
