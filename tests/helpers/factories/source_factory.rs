use crate::federation::{Source, SourceKind};

pub struct SourceFactory {
    name: String,
    shortname: String,
    kind: SourceKind,
}

impl SourceFactory {
    pub fn new() -> Self {
        Self {
            name: "Test Endpoint".to_string(),
            shortname: "test".to_string(),
            kind: SourceKind::Sparql {
                endpoint: "http://test.example/sparql".to_string(),
            },
        }
    }

    /// A single-endpoint source whose endpoint is derived from `shortname`.
    pub fn sparql(shortname: &str) -> Source {
        Self::new()
            .with_shortname(shortname)
            .with_name(&format!("{} endpoint", shortname))
            .with_endpoint(&format!("http://{}.example/sparql", shortname))
            .create()
    }

    /// A compound source with `/sparql` and `/tpf` addresses derived from `shortname`.
    pub fn compound(shortname: &str) -> Source {
        Self::new()
            .with_shortname(shortname)
            .with_name(&format!("{} graph", shortname))
            .with_compound(
                &format!("http://{}.example/sparql", shortname),
                &format!("http://{}.example/tpf", shortname),
            )
            .create()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_shortname(mut self, shortname: &str) -> Self {
        self.shortname = shortname.to_string();
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.kind = SourceKind::Sparql {
            endpoint: endpoint.to_string(),
        };
        self
    }

    pub fn with_compound(mut self, sparql_endpoint: &str, tpf_endpoint: &str) -> Self {
        self.kind = SourceKind::Compound {
            sparql_endpoint: sparql_endpoint.to_string(),
            tpf_endpoint: tpf_endpoint.to_string(),
        };
        self
    }

    pub fn create(self) -> Source {
        Source {
            name: self.name,
            shortname: self.shortname,
            kind: self.kind,
        }
    }
}
