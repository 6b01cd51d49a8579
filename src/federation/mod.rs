pub mod catalog;
pub mod planner;
pub mod selection;
pub mod source;

#[cfg(test)]
mod selection_test;

pub use catalog::{CatalogError, ConfiguredCatalog, SourceCatalog};
pub use planner::{FederationTarget, Protocol, plan};
pub use selection::{SelectionError, SourceRegistry, SourceSelection};
pub use source::{Source, SourceKind};
