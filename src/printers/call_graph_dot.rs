//! Printer that renders the subroutine call graph as a DOT digraph.

use std::io;

use itertools::Itertools;

use crate::{
    analysis::AnnotatedCfg,
    printers::{escape_dot, Printer},
};

/// Renders one node per subroutine plus the entry region, and one edge per
/// distinct caller/callee pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CallGraphDot;

impl Printer for CallGraphDot {
    fn id(&self) -> &'static str {
        "call-graph-dot"
    }

    fn description(&self) -> &'static str {
        "Export the subroutine call graph in DOT format"
    }

    fn print(&self, annotated: &AnnotatedCfg, out: &mut dyn io::Write) -> io::Result<()> {
        let cfg = annotated.cfg();
        writeln!(out, "digraph g{{")?;

        writeln!(out, "main [shape=box]")?;
        for subroutine in cfg.subroutines() {
            writeln!(out, "\"{}\" [shape=box]", escape_dot(subroutine.name()))?;
        }

        let pairs = cfg
            .call_graph()
            .sites()
            .iter()
            .map(|site| (site.caller, site.callee))
            .unique();
        for (caller, callee) in pairs {
            let caller_name = match caller {
                Some(id) => format!("\"{}\"", escape_dot(cfg.subroutine(id).name())),
                None => "main".to_string(),
            };
            let callee_name = format!("\"{}\"", escape_dot(cfg.subroutine(callee).name()));
            writeln!(out, "{caller_name} -> {callee_name}")?;
        }

        writeln!(out, "}}")
    }
}
