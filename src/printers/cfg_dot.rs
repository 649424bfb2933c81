//! Printer that renders the control-flow graph as a DOT digraph.

use std::io;

use crate::{
    analysis::AnnotatedCfg,
    cfg::EdgeKind,
    printers::{escape_dot, Printer},
};

/// Renders one record-shaped node per basic block, listing the block's
/// instructions with their source lines, and one edge per control transfer.
/// Branch edges are coloured by polarity the way graph viewers conventionally
/// expect (green taken, red not-taken).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CfgDot;

impl Printer for CfgDot {
    fn id(&self) -> &'static str {
        "cfg-dot"
    }

    fn description(&self) -> &'static str {
        "Export the control-flow graph in DOT format"
    }

    fn print(&self, annotated: &AnnotatedCfg, out: &mut dyn io::Write) -> io::Result<()> {
        let cfg = annotated.cfg();
        writeln!(out, "digraph g{{")?;
        writeln!(out, " ranksep = 1 ")?;
        writeln!(out, " overlap = scale ")?;

        for block in cfg.blocks() {
            let mut label = format!("{}\\l", block.id());
            for instruction in cfg.instructions(block.id()) {
                label.push_str(&format!(
                    "{}: {}\\l",
                    instruction.line(),
                    escape_dot(&instruction.to_string())
                ));
            }
            writeln!(out, "{} [label=\"{}\" shape=box]", block.id(), label)?;
        }

        for block in cfg.blocks() {
            for edge in block.successors() {
                let attributes = match edge.kind {
                    EdgeKind::BranchTaken => " [color=green]",
                    EdgeKind::BranchNotTaken => " [color=red]",
                    EdgeKind::RetsubToReturnSite => " [style=dashed]",
                    _ => "",
                };
                writeln!(out, "{} -> {}{}", edge.from, edge.to, attributes)?;
            }
        }

        writeln!(out, "}}")
    }
}
