use std::fmt;

use super::selection::SourceSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Send the whole query to the endpoint.
    Direct,
    /// Triple-pattern fan-out across several sources.
    Fanout,
}

impl Protocol {
    /// Fan-out is chosen for the whole batch as soon as more than one source is selected.
    pub fn for_selection_count(selected: usize) -> Self {
        if selected > 1 {
            Protocol::Fanout
        } else {
            Protocol::Direct
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Direct => "direct",
            Protocol::Fanout => "fanout",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FederationTarget {
    pub protocol: Protocol,
    pub address: String,
}

impl fmt::Display for FederationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.protocol, self.address)
    }
}

/// Derives the engine targets for the selected sources, in registry order.
///
/// An empty result means nothing is runnable.
pub fn plan(selections: &[SourceSelection]) -> Vec<FederationTarget> {
    let selected: Vec<&SourceSelection> = selections.iter().filter(|s| s.selected).collect();
    let protocol = Protocol::for_selection_count(selected.len());

    selected
        .into_iter()
        .map(|selection| FederationTarget {
            protocol,
            address: selection.source.address_for(protocol).to_string(),
        })
        .collect()
}
