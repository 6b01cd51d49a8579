use super::planner::Protocol;

/// How a source can be addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A single SPARQL endpoint.
    Sparql { endpoint: String },
    /// A source offering both a SPARQL endpoint and a triple-pattern fragments endpoint.
    Compound {
        sparql_endpoint: String,
        tpf_endpoint: String,
    },
}

/// A configured remote data source. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub shortname: String,
    pub kind: SourceKind,
}

impl Source {
    pub fn sparql(name: &str, shortname: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            shortname: shortname.to_string(),
            kind: SourceKind::Sparql {
                endpoint: endpoint.to_string(),
            },
        }
    }

    pub fn compound(name: &str, shortname: &str, sparql_endpoint: &str, tpf_endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            shortname: shortname.to_string(),
            kind: SourceKind::Compound {
                sparql_endpoint: sparql_endpoint.to_string(),
                tpf_endpoint: tpf_endpoint.to_string(),
            },
        }
    }

    /// Stable identifier used by saved queries and selection replay.
    pub fn identifier(&self) -> &str {
        &self.shortname
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// The address to hand to the engine under `protocol`.
    ///
    /// A single-endpoint source resolves to its only endpoint whatever the protocol.
    pub fn address_for(&self, protocol: Protocol) -> &str {
        match (&self.kind, protocol) {
            (SourceKind::Sparql { endpoint }, _) => endpoint,
            (SourceKind::Compound { sparql_endpoint, .. }, Protocol::Direct) => sparql_endpoint,
            (SourceKind::Compound { tpf_endpoint, .. }, Protocol::Fanout) => tpf_endpoint,
        }
    }
}
