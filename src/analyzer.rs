//! This module contains the definition of the analyzer itself: the pipeline
//! that takes a program's source text through parsing, CFG reconstruction,
//! and dataflow annotation.
//!
//! # Enforcing Valid State Transitions
//!
//! The analyzer enforces that only correct pipeline transitions can occur
//! through use of structs that implement the exact state required by it at
//! any given point: an analyzer holding only source text cannot be asked for
//! a CFG, and one that has not run the dataflow engine cannot feed
//! detectors.

use crate::{
    analysis::{self, AnnotatedCfg, FieldState},
    cfg::{self, ControlFlowGraph},
    detectors::{self, Detector, Finding},
    error,
    parser,
    program::{Program, Source},
};

/// The pipeline states an [`Analyzer`] moves through.
pub mod state {
    use super::{AnnotatedCfg, ControlFlowGraph, Program};

    /// A marker trait for the analyzer's pipeline states.
    pub trait State {}

    /// The initial state: only the source text is available.
    #[derive(Clone, Debug)]
    pub struct HasSource;
    impl State for HasSource {}

    /// The source has been parsed into a typed program.
    #[derive(Clone, Debug)]
    pub struct Parsed {
        /// The parsed program.
        pub program: Program,
    }
    impl State for Parsed {}

    /// The control-flow graph has been reconstructed.
    #[derive(Clone, Debug)]
    pub struct CfgReady {
        /// The reconstructed graph.
        pub cfg: ControlFlowGraph,
    }
    impl State for CfgReady {}

    /// The dataflow engine has annotated the graph.
    #[derive(Clone, Debug)]
    pub struct Analyzed {
        /// The annotated graph.
        pub annotated: AnnotatedCfg,
    }
    impl State for Analyzed {}
}

/// Creates a new analyzer wrapping the provided `source`.
#[must_use]
pub fn new(source: Source) -> Analyzer<state::HasSource> {
    Analyzer {
        source,
        state: state::HasSource,
    }
}

/// The core of the analysis, the `Analyzer` is responsible for ingesting a
/// program's source and producing the annotated CFG that detectors and
/// printers consume.
#[derive(Clone, Debug)]
pub struct Analyzer<S: state::State> {
    /// The source being analyzed.
    source: Source,

    /// The internal state of the analyzer.
    state: S,
}

/// Safe operations available in all states.
impl<S: state::State> Analyzer<S> {
    /// Gets a reference to the source being analyzed.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Gets a reference to the current state of the analyzer.
    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Operations available on a newly-created analyzer.
impl Analyzer<state::HasSource> {
    /// Executes the analysis pipeline from beginning to end, performing all
    /// the intermediate steps automatically.
    ///
    /// # Errors
    ///
    /// If parsing or CFG reconstruction fails.
    pub fn run(
        self,
        config: &analysis::Config,
        initial: Option<FieldState>,
    ) -> error::Result<Analyzer<state::Analyzed>> {
        let analyzer = self.parse()?;
        let analyzer = analyzer.build_cfg()?;
        Ok(analyzer.analyze(config, initial))
    }

    /// Parses the source text into a typed program.
    ///
    /// # Errors
    ///
    /// If the source does not parse; see [`crate::parser::parse`].
    pub fn parse(self) -> error::Result<Analyzer<state::Parsed>> {
        let program = parser::parse(&self.source)?;
        Ok(Analyzer {
            source: self.source,
            state:  state::Parsed { program },
        })
    }
}

/// Operations available once the source has been parsed.
impl Analyzer<state::Parsed> {
    /// Gets a reference to the parsed program.
    pub fn program(&self) -> &Program {
        &self.state.program
    }

    /// Reconstructs the control-flow graph, subroutines included.
    ///
    /// # Errors
    ///
    /// If the graph cannot be reconstructed; see [`crate::cfg::build`].
    pub fn build_cfg(self) -> error::Result<Analyzer<state::CfgReady>> {
        let cfg = cfg::build(self.state.program)?;
        Ok(Analyzer {
            source: self.source,
            state:  state::CfgReady { cfg },
        })
    }
}

/// Operations available once the control-flow graph is ready.
impl Analyzer<state::CfgReady> {
    /// Gets a reference to the reconstructed graph.
    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.state.cfg
    }

    /// Runs the dataflow engine, seeding the entry block with `initial`
    /// where a group configuration supplies one.
    #[must_use]
    pub fn analyze(
        self,
        config: &analysis::Config,
        initial: Option<FieldState>,
    ) -> Analyzer<state::Analyzed> {
        let annotated = analysis::analyze(self.state.cfg, config, initial);
        Analyzer {
            source: self.source,
            state:  state::Analyzed { annotated },
        }
    }
}

/// Operations available on a fully-annotated analyzer.
impl Analyzer<state::Analyzed> {
    /// Gets a reference to the annotated graph.
    pub fn annotated(&self) -> &AnnotatedCfg {
        &self.state.annotated
    }

    /// Runs the provided detectors over the annotated graph.
    #[must_use]
    pub fn run_detectors(&self, detectors: &[Box<dyn Detector>]) -> Vec<Finding> {
        detectors::run_detectors(self.annotated(), detectors)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn the_pipeline_runs_end_to_end() {
        let source = Source::new("test.teal", "#pragma version 6\nint 1\nreturn\n");
        let analyzer = new(source)
            .run(&analysis::Config::default(), None)
            .unwrap();
        assert_eq!(analyzer.annotated().cfg().blocks().len(), 1);
    }

    #[test]
    fn parse_failures_surface_as_interface_errors() {
        let source = Source::new("bad.teal", "#pragma version 3\nfrobnicate\n");
        let result = new(source).parse();
        assert!(result.is_err());
    }
}
