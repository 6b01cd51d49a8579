use crate::engine::{Binding, Quad, Term};

pub struct BindingFactory {
    row: Binding,
}

impl BindingFactory {
    pub fn new() -> Self {
        Self {
            row: Binding::new(),
        }
    }

    /// An `?s ?p ?o` row for statement number `n`.
    pub fn spo(n: usize) -> Binding {
        Self::new()
            .with_iri("s", &format!("http://ex.org/s{}", n))
            .with_iri("p", "http://ex.org/p")
            .with_literal("o", &n.to_string())
            .create()
    }

    pub fn spo_list(count: usize) -> Vec<Binding> {
        (0..count).map(Self::spo).collect()
    }

    pub fn quad(n: usize) -> Quad {
        Quad::triple(
            Term::iri(format!("http://ex.org/s{}", n)),
            Term::iri("http://ex.org/p"),
            Term::literal(n.to_string()),
        )
    }

    pub fn with_iri(mut self, variable: &str, iri: &str) -> Self {
        self.row.insert(variable, Term::iri(iri));
        self
    }

    pub fn with_literal(mut self, variable: &str, value: &str) -> Self {
        self.row.insert(variable, Term::literal(value));
        self
    }

    pub fn create(self) -> Binding {
        self.row
    }
}
