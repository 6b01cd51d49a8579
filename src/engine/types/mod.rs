use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};


pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// An RDF term as it appears in a result row.
///
/// The serde layout follows the SPARQL 1.1 JSON results format, so rows decoded
/// from an endpoint response deserialize straight into `Term` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Term {
    Uri {
        value: String,
    },
    #[serde(alias = "typed-literal")]
    Literal {
        value: String,
        #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
    Bnode {
        value: String,
    },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Uri {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            lang: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::Bnode {
            value: label.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Term::typed_literal(value.to_string(), XSD_BOOLEAN)
    }

    /// The lexical value without any N-Triples decoration.
    pub fn value(&self) -> &str {
        match self {
            Term::Uri { value } | Term::Literal { value, .. } | Term::Bnode { value } => value,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Uri { value } => write!(f, "<{}>", value),
            Term::Bnode { value } => write!(f, "_:{}", value),
            Term::Literal {
                value,
                lang: Some(lang),
                ..
            } => write!(f, "\"{}\"@{}", value, lang),
            Term::Literal {
                value,
                datatype: Some(datatype),
                ..
            } => write!(f, "\"{}\"^^<{}>", value, datatype),
            Term::Literal { value, .. } => write!(f, "\"{}\"", value),
        }
    }
}

/// One result row: variable name to bound term, in declaration order.
///
/// Unbound variables are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding {
    values: IndexMap<String, Term>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: &str, term: Term) -> Self {
        self.insert(variable, term);
        self
    }

    pub fn insert(&mut self, variable: &str, term: Term) -> Option<Term> {
        self.values.insert(variable.to_string(), term)
    }

    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.values.get(variable)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.values.iter().map(|(name, term)| (name.as_str(), term))
    }
}

/// A triple, or a quad when `graph` names a non-default graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Option<Term>,
}

impl Quad {
    pub fn triple(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    pub fn in_graph(mut self, graph: Term) -> Self {
        self.graph = Some(graph);
        self
    }
}
