use std::collections::HashSet;

use thiserror::Error;

use crate::shared::config::model::SourceConfig;

use super::source::Source;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Source '{source_name}' is missing `{field}`")]
    MissingEndpoint {
        source_name: String,
        field: &'static str,
    },

    #[error("Source '{source_name}' has unknown type '{kind}'")]
    UnknownKind { source_name: String, kind: String },

    #[error("Duplicate source shortname: {0}")]
    DuplicateShortname(String),
}

/// Enumerates the available sources. Read once at startup.
pub trait SourceCatalog {
    fn list(&self) -> Vec<Source>;

    /// Identifiers selected when a session starts.
    fn default_selection(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A catalog backed by the `[[sources]]` tables of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredCatalog {
    sources: Vec<Source>,
    defaults: Vec<String>,
}

impl ConfiguredCatalog {
    pub fn new(sources: Vec<Source>, defaults: Vec<String>) -> Self {
        Self { sources, defaults }
    }

    pub fn from_config(entries: &[SourceConfig]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(entries.len());
        let mut defaults = Vec::new();

        for entry in entries {
            if !seen.insert(entry.shortname.as_str()) {
                return Err(CatalogError::DuplicateShortname(entry.shortname.clone()));
            }
            sources.push(source_from_config(entry)?);
            if entry.selected {
                defaults.push(entry.shortname.clone());
            }
        }

        Ok(Self { sources, defaults })
    }
}

impl SourceCatalog for ConfiguredCatalog {
    fn list(&self) -> Vec<Source> {
        self.sources.clone()
    }

    fn default_selection(&self) -> Vec<String> {
        self.defaults.clone()
    }
}

fn source_from_config(entry: &SourceConfig) -> Result<Source, CatalogError> {
    let required = |value: &Option<String>, field: &'static str| {
        value.clone().ok_or_else(|| CatalogError::MissingEndpoint {
            source_name: entry.name.clone(),
            field,
        })
    };

    match entry.kind.as_str() {
        "sparql" => {
            let endpoint = required(&entry.endpoint, "endpoint")?;
            Ok(Source::sparql(&entry.name, &entry.shortname, &endpoint))
        }
        "compound" => {
            let sparql_endpoint = required(&entry.sparql_endpoint, "sparql_endpoint")?;
            let tpf_endpoint = required(&entry.tpf_endpoint, "tpf_endpoint")?;
            Ok(Source::compound(
                &entry.name,
                &entry.shortname,
                &sparql_endpoint,
                &tpf_endpoint,
            ))
        }
        other => Err(CatalogError::UnknownKind {
            source_name: entry.name.clone(),
            kind: other.to_string(),
        }),
    }
}
