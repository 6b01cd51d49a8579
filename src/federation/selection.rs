use thiserror::Error;

use super::catalog::SourceCatalog;
use super::source::Source;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source is disabled: {0}")]
    SourceDisabled(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    pub source: Source,
    pub selected: bool,
    /// Reserved for constraint propagation between sources; never set by the registry itself.
    pub disabled: bool,
}

impl SourceSelection {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            selected: false,
            disabled: false,
        }
    }
}

/// One selection entry per known source, kept in catalog order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    entries: Vec<SourceSelection>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            entries: sources.into_iter().map(SourceSelection::new).collect(),
        }
    }

    pub fn from_catalog(catalog: &dyn SourceCatalog) -> Self {
        let mut registry = Self::new(catalog.list());
        registry.select_exactly(catalog.default_selection().as_slice());
        registry
    }

    pub fn entries(&self) -> &[SourceSelection] {
        &self.entries
    }

    pub fn get(&self, identifier: &str) -> Option<&SourceSelection> {
        self.entries
            .iter()
            .find(|entry| entry.source.identifier() == identifier)
    }

    pub fn selected(&self) -> impl Iterator<Item = &SourceSelection> {
        self.entries.iter().filter(|entry| entry.selected)
    }

    pub fn selected_identifiers(&self) -> Vec<String> {
        self.selected()
            .map(|entry| entry.source.identifier().to_string())
            .collect()
    }

    pub fn set_selected(&mut self, identifier: &str, selected: bool) -> Result<(), SelectionError> {
        let entry = self.entry_mut(identifier)?;
        if entry.disabled && selected {
            return Err(SelectionError::SourceDisabled(identifier.to_string()));
        }
        entry.selected = selected;
        Ok(())
    }

    /// Flips the selection flag and returns the new value.
    pub fn toggle(&mut self, identifier: &str) -> Result<bool, SelectionError> {
        let current = self
            .get(identifier)
            .map(|entry| entry.selected)
            .ok_or_else(|| SelectionError::UnknownSource(identifier.to_string()))?;
        self.set_selected(identifier, !current)?;
        Ok(!current)
    }

    /// Selects exactly the sources named in `identifiers`; unknown names are ignored.
    pub fn select_exactly<S: AsRef<str>>(&mut self, identifiers: &[S]) {
        for entry in &mut self.entries {
            entry.selected = identifiers
                .iter()
                .any(|id| id.as_ref() == entry.source.identifier());
        }
    }

    pub fn set_disabled(&mut self, identifier: &str, disabled: bool) -> Result<(), SelectionError> {
        self.entry_mut(identifier)?.disabled = disabled;
        Ok(())
    }

    fn entry_mut(&mut self, identifier: &str) -> Result<&mut SourceSelection, SelectionError> {
        self.entries
            .iter_mut()
            .find(|entry| entry.source.identifier() == identifier)
            .ok_or_else(|| SelectionError::UnknownSource(identifier.to_string()))
    }
}
