//! This module contains the control-flow graph representation and the
//! builder that reconstructs it from a parsed [`Program`].
//!
//! # Arena Layout
//!
//! Blocks live in a flat arena and are addressed by dense [`BlockId`]s;
//! edges are `(from, to, kind)` triples. Successor lists are authoritative
//! and predecessor lists are derived by inversion, so the cyclic shape of
//! the graph involves no cyclic ownership.

pub mod subroutine;

use std::fmt;

use tracing::debug;

use crate::{
    error::cfg::{ErrorKind, Result},
    instruction::{Instruction, Op},
    program::Program,
};

pub use subroutine::{CallGraph, CallSite, Subroutine, SubroutineId};

/// A dense identifier for a basic block in the arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// The kind of a control-flow edge.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EdgeKind {
    /// Sequential flow into the next block.
    Fallthrough,

    /// An unconditional `b` jump.
    Jump,

    /// The edge taken when a conditional branch fires.
    BranchTaken,

    /// The edge taken when a conditional branch falls through.
    BranchNotTaken,

    /// Flow from a `callsub` block into the callee's entry block.
    CallsubToEntry,

    /// Flow from a callee's `retsub` block back to a call-site's
    /// return-site block.
    RetsubToReturnSite,
}

/// A directed control-flow edge between two blocks.
///
/// Halts (`return`, `err`) have no edge at all: a block whose terminator
/// halts simply has no successors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge {
    /// The block the edge leaves.
    pub from: BlockId,

    /// The block the edge enters.
    pub to: BlockId,

    /// The kind of control transfer the edge models.
    pub kind: EdgeKind,
}

/// A maximal straight-line run of instructions.
///
/// No internal instruction is a branch target and no internal instruction
/// transfers control: only the first instruction can be entered and only the
/// last can leave.
#[derive(Clone, Debug)]
pub struct BasicBlock {
    id:           BlockId,
    first:        usize,
    last:         usize,
    successors:   Vec<Edge>,
    predecessors: Vec<Edge>,
    subroutine:   Option<SubroutineId>,
}

impl BasicBlock {
    /// The block's identifier in the arena.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The index of the block's first instruction.
    #[must_use]
    pub fn first(&self) -> usize {
        self.first
    }

    /// The index of the block's last instruction.
    #[must_use]
    pub fn last(&self) -> usize {
        self.last
    }

    /// The outgoing edges, in the order they were discovered.
    #[must_use]
    pub fn successors(&self) -> &[Edge] {
        &self.successors
    }

    /// The incoming edges, derived from the successor lists.
    #[must_use]
    pub fn predecessors(&self) -> &[Edge] {
        &self.predecessors
    }

    /// The subroutine that owns the block, or [`None`] for the entry region.
    #[must_use]
    pub fn subroutine(&self) -> Option<SubroutineId> {
        self.subroutine
    }

    /// Whether the block ends in a halt: it has no static successors at all.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.successors.is_empty()
    }
}

/// The control-flow graph of a single program: the block arena, the
/// recovered subroutines, and the call graph.
#[derive(Clone, Debug)]
pub struct ControlFlowGraph {
    program:     Program,
    blocks:      Vec<BasicBlock>,
    subroutines: Vec<Subroutine>,
    call_graph:  CallGraph,
}

impl ControlFlowGraph {
    /// The program the graph was built from.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// All blocks, in arena order (which is also source order).
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Gets the block with the provided `id`.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    /// The program entry block.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    /// The instructions contained in the block with the provided `id`.
    #[must_use]
    pub fn instructions(&self, id: BlockId) -> &[Instruction] {
        let block = self.block(id);
        &self.program.instructions()[block.first..=block.last]
    }

    /// The recovered subroutines.
    #[must_use]
    pub fn subroutines(&self) -> &[Subroutine] {
        &self.subroutines
    }

    /// Gets the subroutine with the provided `id`.
    #[must_use]
    pub fn subroutine(&self, id: SubroutineId) -> &Subroutine {
        &self.subroutines[id.0]
    }

    /// The subroutine call graph.
    #[must_use]
    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    /// The label defined at the entry of the block, if any.
    #[must_use]
    pub fn label_of(&self, id: BlockId) -> Option<&str> {
        self.program.label_at(self.block(id).first)
    }
}

/// Builds the control-flow graph for the provided `program`.
///
/// Block formation follows the classic leader-set construction: the first
/// instruction, every label target, and every instruction following a
/// terminator or branch start a block. Edges are then derived from each
/// block's final instruction, and subroutine recovery adds the
/// retsub-to-return-site edges once `callsub`/`retsub` pairing is known.
///
/// # Errors
///
/// If a branch targets a label that resolves to no block, or if a `retsub`
/// is not contained in any subroutine.
pub fn build(program: Program) -> Result<ControlFlowGraph> {
    let instructions = program.instructions();
    let count = instructions.len();

    // Leader set: index 0, every label target, and every instruction
    // following a terminator or branch.
    let mut is_leader = vec![false; count];
    if let Some(entry) = is_leader.first_mut() {
        *entry = true;
    }
    for (_, index) in program.labels().iter() {
        if *index < count {
            is_leader[*index] = true;
        }
    }
    for (index, instruction) in instructions.iter().enumerate() {
        let op = instruction.op();
        if (op.is_terminator() || op.is_branch()) && index + 1 < count {
            is_leader[index + 1] = true;
        }
    }

    // Form blocks as maximal runs between consecutive leaders.
    let mut blocks: Vec<BasicBlock> = vec![];
    let mut block_of = vec![BlockId(0); count];
    let mut first = 0;
    for index in 1..=count {
        if index == count || is_leader[index] {
            let id = BlockId(blocks.len());
            blocks.push(BasicBlock {
                id,
                first,
                last: index - 1,
                successors: vec![],
                predecessors: vec![],
                subroutine: None,
            });
            for slot in &mut block_of[first..index] {
                *slot = id;
            }
            first = index;
        }
    }

    let resolve = |label: &str, line: u32| -> Result<BlockId> {
        program
            .label_target(label)
            .filter(|index| *index < count)
            .map(|index| block_of[index])
            .ok_or_else(|| ErrorKind::UnresolvedBranchTarget(label.to_string()).at(line))
    };

    // Derive the outgoing edges from each block's final instruction.
    let mut edges: Vec<Edge> = vec![];
    for block in &blocks {
        let exit = &instructions[block.last];
        let line = exit.line();
        let from = block.id;
        let next = (block.id.0 + 1 < blocks.len()).then(|| BlockId(block.id.0 + 1));

        match exit.op() {
            Op::Branch { target } => {
                edges.push(Edge {
                    from,
                    to: resolve(target, line)?,
                    kind: EdgeKind::Jump,
                });
            }
            Op::BranchZero { target } | Op::BranchNonZero { target } => {
                edges.push(Edge {
                    from,
                    to: resolve(target, line)?,
                    kind: EdgeKind::BranchTaken,
                });
                if let Some(to) = next {
                    edges.push(Edge {
                        from,
                        to,
                        kind: EdgeKind::BranchNotTaken,
                    });
                }
            }
            Op::Switch { targets } | Op::Match { targets } => {
                for target in targets {
                    edges.push(Edge {
                        from,
                        to: resolve(target, line)?,
                        kind: EdgeKind::BranchTaken,
                    });
                }
                if let Some(to) = next {
                    edges.push(Edge {
                        from,
                        to,
                        kind: EdgeKind::BranchNotTaken,
                    });
                }
            }
            Op::Callsub { target } => {
                edges.push(Edge {
                    from,
                    to: resolve(target, line)?,
                    kind: EdgeKind::CallsubToEntry,
                });
            }
            // `retsub` successors are synthesised during subroutine
            // recovery; `return` and `err` halt.
            Op::Retsub | Op::Return | Op::Err => {}
            _ => {
                if let Some(to) = next {
                    edges.push(Edge {
                        from,
                        to,
                        kind: EdgeKind::Fallthrough,
                    });
                }
            }
        }
    }

    for edge in &edges {
        blocks[edge.from.0].successors.push(*edge);
    }

    // Subroutine recovery pairs `callsub` with `retsub` and appends the
    // retsub-to-return-site edges in place.
    let (subroutines, call_graph) = subroutine::recover(&program, &mut blocks, &block_of)?;

    // Predecessor lists are derived, not authoritative.
    let all_edges: Vec<Edge> = blocks.iter().flat_map(|b| b.successors.clone()).collect();
    for edge in all_edges {
        blocks[edge.to.0].predecessors.push(edge);
    }

    debug!(
        program = program.name(),
        blocks = blocks.len(),
        subroutines = subroutines.len(),
        "reconstructed control-flow graph"
    );

    Ok(ControlFlowGraph {
        program,
        blocks,
        subroutines,
        call_graph,
    })
}
