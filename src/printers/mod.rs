//! This module contains the printer framework and the built-in printers:
//! graph-description writers for the CFG and the call graph, and the
//! human-readable summary.
//!
//! Printers follow the same registration pattern as detectors: a table maps
//! identifiers to constructors returning boxed trait objects, and plugins
//! are additional registrations.

pub mod call_graph_dot;
pub mod cfg_dot;
pub mod human_summary;
pub mod report;

use std::{fmt, io};

use downcast_rs::{impl_downcast, Downcast};

use crate::analysis::AnnotatedCfg;

/// The interface every printer implements.
pub trait Printer
where
    Self: Downcast,
{
    /// The stable identifier the printer is selected by.
    fn id(&self) -> &'static str;

    /// A one-line description of what the printer emits.
    fn description(&self) -> &'static str;

    /// Writes the printer's rendering of the annotated graph to `out`.
    ///
    /// # Errors
    ///
    /// If writing to `out` fails.
    fn print(&self, annotated: &AnnotatedCfg, out: &mut dyn io::Write) -> io::Result<()>;
}

impl_downcast!(Printer);

/// A constructor for a registered printer.
pub type PrinterConstructor = fn() -> Box<dyn Printer>;

/// The registration table mapping printer identifiers to constructors.
#[derive(Clone, Default)]
pub struct PrinterRegistry {
    entries: Vec<(&'static str, PrinterConstructor)>,
}

impl PrinterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated with the built-in printers.
    #[must_use]
    pub fn with_default_library() -> Self {
        let mut registry = Self::new();
        registry.register("cfg-dot", || Box::new(cfg_dot::CfgDot));
        registry.register("call-graph-dot", || Box::new(call_graph_dot::CallGraphDot));
        registry.register("human-summary", || Box::new(human_summary::HumanSummary));
        registry
    }

    /// Adds a registration, replacing any previous one under the same
    /// identifier.
    pub fn register(&mut self, id: &'static str, constructor: PrinterConstructor) {
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.push((id, constructor));
    }

    /// The registered identifiers, in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Instantiates the printer registered under `id`, if any.
    #[must_use]
    pub fn instantiate(&self, id: &str) -> Option<Box<dyn Printer>> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, constructor)| constructor())
    }
}

impl fmt::Debug for PrinterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrinterRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Escapes a string for use inside a DOT label.
pub(crate) fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registry_resolves_registered_printers() {
        let registry = PrinterRegistry::with_default_library();
        assert!(registry.instantiate("cfg-dot").is_some());
        assert!(registry.instantiate("no-such-printer").is_none());
        assert_eq!(registry.ids().len(), 3);
    }

    #[test]
    fn dot_escaping_handles_quotes() {
        assert_eq!(escape_dot("byte \"hi\""), "byte \\\"hi\\\"");
    }
}
