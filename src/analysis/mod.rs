//! This module contains the dataflow engine that computes, for every basic
//! block, the set of values each tracked transaction-context field could
//! take on an execution that enters the block.
//!
//! # Algorithm
//!
//! Each block is first summarised by the peephole matcher into the
//! refinements its asserts establish, the refinements its trailing
//! conditional branch splits across its edges, and whether it rejects
//! outright. A forward worklist pass then propagates states to a fixed
//! point: a block's in-state is the join of its predecessors' out-states
//! (filtered through the edge constraints), and its out-state is the
//! in-state refined by the block's own constraints.
//!
//! `callsub` edges carry the caller's out-state into the callee's entry
//! join, and `retsub` edges carry the callee's out-state into the return
//! site. There is no context sensitivity: states merge across call-sites,
//! which over-approximates but keeps the lattice finite.

pub mod lattice;
pub mod pattern;

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::{
    cfg::{BlockId, ControlFlowGraph, EdgeKind},
    constant::DEFAULT_VALUE_SET_CAP,
};

pub use lattice::{FieldState, FieldValue, TrackedField, ValueSet};
pub use pattern::{BlockSummary, Condition, Constraints, FieldKey};

/// Configuration for the dataflow engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// The cap on the size of an enumerated value set before it widens to ⊤.
    pub value_set_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            value_set_cap: DEFAULT_VALUE_SET_CAP,
        }
    }
}

/// A control-flow graph with the dataflow facts attached: for every block,
/// the joined state on entry and the state after the block's own
/// refinements.
#[derive(Clone, Debug)]
pub struct AnnotatedCfg {
    cfg:        ControlFlowGraph,
    summaries:  Vec<BlockSummary>,
    in_states:  Vec<FieldState>,
    out_states: Vec<FieldState>,
}

impl AnnotatedCfg {
    /// The underlying control-flow graph.
    #[must_use]
    pub fn cfg(&self) -> &ControlFlowGraph {
        &self.cfg
    }

    /// The peephole summary of the block: the refinements its asserts
    /// establish and the constraints its trailing branch splits.
    ///
    /// Detectors that reason about checks on transactions other than the
    /// current one read the `gtxn`-keyed refinements from here, since those
    /// do not land in the per-field states.
    #[must_use]
    pub fn summary(&self, id: BlockId) -> &BlockSummary {
        &self.summaries[id.0]
    }

    /// The joined state in force when execution enters the block.
    #[must_use]
    pub fn in_state(&self, id: BlockId) -> &FieldState {
        &self.in_states[id.0]
    }

    /// The state in force when execution leaves the block, with the block's
    /// own assert refinements applied.
    #[must_use]
    pub fn out_state(&self, id: BlockId) -> &FieldState {
        &self.out_states[id.0]
    }

    /// Whether the block is unreachable under the computed constraints.
    #[must_use]
    pub fn is_unreachable(&self, id: BlockId) -> bool {
        self.in_state(id).is_unreachable()
    }
}

/// Runs the dataflow engine over `cfg`.
///
/// The `initial` state seeds the program entry block; pass [`None`] for the
/// unconstrained ⊤ state, or a state derived from a group configuration to
/// pin fields the surrounding group declares.
#[must_use]
pub fn analyze(cfg: ControlFlowGraph, config: &Config, initial: Option<FieldState>) -> AnnotatedCfg {
    let cap = config.value_set_cap;
    let block_count = cfg.blocks().len();

    let summaries: Vec<BlockSummary> = cfg
        .blocks()
        .iter()
        .map(|block| pattern::summarize(cfg.instructions(block.id()), cap))
        .collect();

    let entry_state = initial.unwrap_or_else(FieldState::top);
    let mut in_states = vec![FieldState::bottom(); block_count];
    let mut out_states = vec![FieldState::bottom(); block_count];

    // The lattice has finite height per (block, field) slot, so the worklist
    // drains; the step bound is a backstop against the group-indexed
    // refinements, whose applicability can shift while `GroupIndex` settles.
    let max_steps = block_count
        .saturating_mul(TrackedField::COUNT)
        .saturating_mul(cap + 2)
        .saturating_mul(4)
        .saturating_add(block_count);
    let mut steps = 0usize;

    let mut worklist: VecDeque<BlockId> = cfg.blocks().iter().map(|b| b.id()).collect();
    let mut queued = vec![true; block_count];

    while let Some(id) = worklist.pop_front() {
        queued[id.0] = false;
        steps += 1;
        if steps > max_steps {
            warn!("dataflow did not settle within the step bound; keeping current states");
            break;
        }

        // Join of predecessor out-states along the incoming edge kinds.
        let mut in_state = if id == cfg.entry() {
            entry_state.clone()
        } else {
            FieldState::bottom()
        };
        for edge in cfg.block(id).predecessors() {
            let along = state_along_edge(&out_states[edge.from.0], &summaries[edge.from.0], edge.kind);
            in_state = in_state.join(&along, cap);
        }

        let out_state = transfer(&in_state, &summaries[id.0]);
        let changed = in_state != in_states[id.0] || out_state != out_states[id.0];
        in_states[id.0] = in_state;
        out_states[id.0] = out_state;

        if changed {
            for edge in cfg.block(id).successors() {
                if !queued[edge.to.0] {
                    queued[edge.to.0] = true;
                    worklist.push_back(edge.to);
                }
            }
        }
    }

    debug!(
        program = cfg.program().name(),
        steps, "dataflow reached a fixed point"
    );

    AnnotatedCfg {
        cfg,
        summaries,
        in_states,
        out_states,
    }
}

/// Applies a block's own refinements to its in-state.
fn transfer(in_state: &FieldState, summary: &BlockSummary) -> FieldState {
    if in_state.is_unreachable() {
        return FieldState::bottom();
    }
    let mut out = in_state.clone();
    apply_constraints(&mut out, &summary.refinements);
    if summary.rejects {
        return FieldState::bottom();
    }
    out
}

/// The predecessor's out-state as seen along an edge of the provided kind,
/// with the branch-split refinements applied where the edge is one side of a
/// conditional branch.
fn state_along_edge(
    out_state: &FieldState,
    summary: &BlockSummary,
    kind: EdgeKind,
) -> FieldState {
    let constraints = match (&summary.branch, kind) {
        (Some(branch), EdgeKind::BranchTaken) => &branch.taken,
        (Some(branch), EdgeKind::BranchNotTaken) => &branch.not_taken,
        _ => return out_state.clone(),
    };
    let mut along = out_state.clone();
    apply_constraints(&mut along, constraints);
    along
}

/// Meets each constraint into the state.
///
/// A constraint keyed on `gtxn i F` only describes the current transaction
/// when the current transaction is known to sit at group index `i`.
fn apply_constraints(state: &mut FieldState, constraints: &Constraints) {
    for (key, values) in constraints {
        match key {
            FieldKey::Txn(field) => state.refine(*field, values),
            FieldKey::Gtxn(index, field) => {
                let own_index = state.get(TrackedField::GroupIndex).as_singleton();
                if own_index == Some(&FieldValue::Uint(*index)) {
                    state.refine(*field, values);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{cfg, parser, program::Source};

    fn annotate(text: &str) -> AnnotatedCfg {
        let program = parser::parse(&Source::new("test.teal", text)).unwrap();
        let graph = cfg::build(program).unwrap();
        analyze(graph, &Config::default(), None)
    }

    fn uint_set(values: &[u64]) -> ValueSet {
        ValueSet::Values(values.iter().map(|v| FieldValue::Uint(*v)).collect())
    }

    #[test]
    fn entry_state_is_unconstrained() {
        let annotated = annotate("#pragma version 6\nint 1\nreturn\n");
        let entry = annotated.cfg().entry();
        assert!(annotated.in_state(entry).get(TrackedField::GroupSize).is_top());
        assert!(annotated.in_state(entry).get(TrackedField::Fee).is_top());
    }

    #[test]
    fn asserts_refine_the_out_state() {
        let annotated = annotate(
            "#pragma version 3\nglobal GroupSize\nint 2\n==\nassert\nint 1\nreturn\n",
        );
        let entry = annotated.cfg().entry();
        assert_eq!(
            annotated.out_state(entry).get(TrackedField::GroupSize),
            &uint_set(&[2])
        );
    }

    #[test]
    fn branch_refinements_split_across_successors() {
        let annotated = annotate(
            "#pragma version 3\ntxn OnCompletion\nint DeleteApplication\n==\nbnz del\nint 1\nreturn\ndel:\nint 0\nreturn\n",
        );
        let cfg = annotated.cfg();
        let taken = cfg
            .block(cfg.entry())
            .successors()
            .iter()
            .find(|e| e.kind == EdgeKind::BranchTaken)
            .unwrap()
            .to;
        let not_taken = cfg
            .block(cfg.entry())
            .successors()
            .iter()
            .find(|e| e.kind == EdgeKind::BranchNotTaken)
            .unwrap()
            .to;

        assert_eq!(
            annotated.in_state(taken).get(TrackedField::OnCompletion),
            &uint_set(&[5])
        );
        assert_eq!(
            annotated.in_state(not_taken).get(TrackedField::OnCompletion),
            &uint_set(&[0, 1, 2, 3, 4])
        );
    }

    #[test]
    fn rejecting_blocks_contribute_bottom() {
        let annotated = annotate(
            "#pragma version 3\ntxn OnCompletion\nbnz rest\nerr\nrest:\nint 1\nreturn\n",
        );
        let err_block = BlockId(1);
        assert!(annotated.out_state(err_block).is_unreachable());
    }

    #[test]
    fn subroutine_refinements_flow_back_to_the_return_site() {
        let annotated = annotate(
            "#pragma version 4\ncallsub check\nint 1\nreturn\ncheck:\ntxn Sender\nbyte 0x61646d696e\n==\nassert\nretsub\n",
        );
        // The return-site block sees the callee's refinement on Sender.
        let return_site = BlockId(1);
        assert_eq!(
            annotated.in_state(return_site).get(TrackedField::Sender),
            &ValueSet::singleton(FieldValue::Bytes(b"admin".to_vec()))
        );
    }

    #[test]
    fn recursive_subroutines_reach_a_fixed_point() {
        // `ping` pins GroupSize to {2} and `pong` bounds it to {1, 2}; the
        // two recurse into each other behind opaque conditions. Termination
        // is the property under test, and the state at the outer return
        // site is the meet of both refinements.
        let annotated = annotate(concat!(
            "#pragma version 4\n",
            "callsub ping\n",
            "int 1\n",
            "return\n",
            "ping:\n",
            "global GroupSize\n",
            "int 2\n",
            "==\n",
            "assert\n",
            "txn Fee\n",
            "bz ping_end\n",
            "callsub pong\n",
            "ping_end:\n",
            "retsub\n",
            "pong:\n",
            "global GroupSize\n",
            "int 2\n",
            "<=\n",
            "assert\n",
            "txn Fee\n",
            "bz pong_end\n",
            "callsub ping\n",
            "pong_end:\n",
            "retsub\n",
        ));
        let return_site = BlockId(1);
        assert_eq!(
            annotated.in_state(return_site).get(TrackedField::GroupSize),
            &uint_set(&[2])
        );
    }

    #[test]
    fn unconditional_mutual_recursion_never_returns() {
        // With no base case no execution reaches a retsub, so the return
        // sites are unreachable; the engine still terminates.
        let annotated = annotate(
            "#pragma version 4\ncallsub ping\nint 1\nreturn\nping:\ncallsub pong\nretsub\npong:\ncallsub ping\nretsub\n",
        );
        assert!(annotated.is_unreachable(BlockId(1)));
    }

    #[test]
    fn group_indexed_refinement_requires_known_index() {
        // Without a GroupIndex constraint the gtxn-keyed refinement cannot
        // describe the current transaction, so Sender stays ⊤.
        let annotated = annotate(
            "#pragma version 3\ngtxn 0 Sender\nbyte 0x61\n==\nassert\nint 1\nreturn\n",
        );
        let entry = annotated.cfg().entry();
        assert!(annotated.out_state(entry).get(TrackedField::Sender).is_top());

        // Pinning GroupIndex first makes the same refinement apply.
        let annotated = annotate(
            "#pragma version 3\ntxn GroupIndex\nint 0\n==\nassert\ngtxn 0 Sender\nbyte 0x61\n==\nassert\nint 1\nreturn\n",
        );
        let entry = annotated.cfg().entry();
        assert_eq!(
            annotated.out_state(entry).get(TrackedField::Sender),
            &ValueSet::singleton(FieldValue::Bytes(vec![0x61]))
        );
    }

    #[test]
    fn unreachable_blocks_stay_bottom() {
        let annotated = annotate(
            "#pragma version 3\nb done\nint 99\npop\ndone:\nint 1\nreturn\n",
        );
        assert!(annotated.is_unreachable(BlockId(1)));
    }
}
