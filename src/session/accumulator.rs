use crate::engine::Binding;

/// Append-only row buffer for the current run.
///
/// Rows are never reordered or deduplicated; the buffer is cleared only when a
/// new run starts. There is no upper bound.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    rows: Vec<Binding>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Binding) {
        self.rows.push(row);
    }

    pub fn reset(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Binding] {
        &self.rows
    }

    /// Rows appended at or after `offset`, for consumers that render incrementally.
    pub fn since(&self, offset: usize) -> &[Binding] {
        self.rows.get(offset..).unwrap_or(&[])
    }
}
