//! This library implements a static analysis of
//! [TEAL](https://developer.algorand.org/docs/get-details/dapps/avm/teal/)
//! programs that recovers each program's control-flow graph, propagates a
//! small family of transaction-context dataflow facts across it, and runs a
//! library of path-based security detectors and structural printers over the
//! result. It is a _best effort_ analysis.
//!
//! Note that this library is not intended to be nor expected to evolve into
//! an interpreter or symbolic executor for TEAL.
//!
//! # How it Works
//!
//! From a very high level, the analysis is performed as follows:
//!
//! 1. Source text is ingested and turned into a [`program::Program`]: a
//!    sequence of typed [`instruction::Instruction`]s plus a label table,
//!    with the program's version and execution mode attached.
//! 2. The instruction stream is split into basic blocks and linked into a
//!    [`cfg::ControlFlowGraph`], including the recovery of subroutines from
//!    `callsub`/`retsub` pairing and the call graph they induce.
//! 3. The dataflow engine computes, per block, the set of values each
//!    tracked transaction-context field could take, yielding an
//!    [`analysis::AnnotatedCfg`].
//! 4. Registered [`detectors::Detector`]s walk the annotated graph searching
//!    for paths that violate their constraints, and collect
//!    [`detectors::Finding`]s.
//! 5. [`printers::Printer`]s render the graph and summaries for human and
//!    tool consumption.
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, it is sufficient to construct an
//! analyzer with your program's source and call `.run`:
//!
//! ```
//! use teal_flow_analyzer as tfa;
//! use teal_flow_analyzer::{analysis, detectors::DetectorRegistry, program::Source};
//!
//! let source = Source::new(
//!     "example.teal",
//!     "#pragma version 6\ntxn RekeyTo\nglobal ZeroAddress\n==\nassert\nint 1\nreturn\n",
//! );
//! let analyzer = tfa::new(source)
//!     .run(&analysis::Config::default(), None)
//!     .unwrap();
//!
//! let registry = DetectorRegistry::with_default_library();
//! let detectors = registry.instantiate(None, &[]);
//! let findings = analyzer.run_detectors(&detectors);
//!
//! // The rekey check in the program suppresses the rekey-to detector.
//! assert!(findings.iter().all(|finding| finding.detector() != "rekey-to"));
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod analysis;
pub mod analyzer;
pub mod cfg;
pub mod constant;
pub mod detectors;
pub mod error;
pub mod group_config;
pub mod instruction;
pub mod parser;
pub mod printers;
pub mod program;

// Re-exports to provide the library interface.
pub use analyzer::new;
