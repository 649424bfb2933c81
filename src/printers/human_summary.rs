//! Printer for a human-readable summary of a program.

use std::io;

use crate::{analysis::AnnotatedCfg, printers::Printer};

/// Summarises the parsed program: version, mode, counts of instructions,
/// blocks and subroutines, the subroutine names, and how much of the graph
/// the dataflow engine proved unreachable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HumanSummary;

impl Printer for HumanSummary {
    fn id(&self) -> &'static str {
        "human-summary"
    }

    fn description(&self) -> &'static str {
        "Print a human-readable summary of the program"
    }

    fn print(&self, annotated: &AnnotatedCfg, out: &mut dyn io::Write) -> io::Result<()> {
        let cfg = annotated.cfg();
        let program = cfg.program();

        writeln!(out, "Program: {}", program.name())?;
        writeln!(out, "  Version: {}", program.version())?;
        writeln!(out, "  Mode: {}", program.mode())?;
        writeln!(out, "  Instructions: {}", program.instructions().len())?;
        writeln!(out, "  Basic blocks: {}", cfg.blocks().len())?;

        let unreachable = cfg
            .blocks()
            .iter()
            .filter(|block| annotated.is_unreachable(block.id()))
            .count();
        writeln!(out, "  Unreachable blocks: {unreachable}")?;

        writeln!(out, "  Subroutines: {}", cfg.subroutines().len())?;
        for subroutine in cfg.subroutines() {
            writeln!(
                out,
                "    {} ({} blocks, {} call sites)",
                subroutine.name(),
                subroutine.blocks().len(),
                subroutine.call_sites().len()
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{analysis, cfg, parser, program::Source};

    #[test]
    fn summarises_structure() {
        let program = parser::parse(&Source::new(
            "vault.teal",
            "#pragma version 4\ncallsub auth\nint 1\nreturn\nauth:\nint 2\npop\nretsub\n",
        ))
        .unwrap();
        let graph = cfg::build(program).unwrap();
        let annotated = analysis::analyze(graph, &analysis::Config::default(), None);

        let mut rendered = vec![];
        HumanSummary.print(&annotated, &mut rendered).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert!(text.contains("Program: vault.teal"));
        assert!(text.contains("Version: 4"));
        assert!(text.contains("Mode: stateless"));
        assert!(text.contains("Subroutines: 1"));
        assert!(text.contains("auth (1 blocks, 1 call sites)"));
    }
}
