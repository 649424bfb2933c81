//! This module contains the recovery of subroutines from `callsub`/`retsub`
//! pairing, and the call graph that the pairing induces.
//!
//! Subroutine call and return is modelled with explicit
//! retsub-to-return-site edges rather than a runtime call stack: every
//! `retsub` block of a callee is linked back to the fall-through block of
//! every call-site of that callee.

use std::{collections::BTreeMap, fmt};

use crate::{
    cfg::{BasicBlock, BlockId, Edge, EdgeKind},
    error::cfg::{ErrorKind, Result},
    instruction::Op,
    program::Program,
};

/// A dense identifier for a recovered subroutine.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubroutineId(pub usize);

impl fmt::Display for SubroutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A subroutine: the region of blocks reachable from a `callsub` target
/// without crossing a `retsub`.
#[derive(Clone, Debug)]
pub struct Subroutine {
    id:            SubroutineId,
    name:          String,
    entry:         BlockId,
    blocks:        Vec<BlockId>,
    retsub_blocks: Vec<BlockId>,
    call_sites:    Vec<BlockId>,
}

impl Subroutine {
    /// The subroutine's identifier.
    #[must_use]
    pub fn id(&self) -> SubroutineId {
        self.id
    }

    /// The label the subroutine is called through.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry block.
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// The blocks owned by the subroutine, entry first.
    ///
    /// Callees of nested `callsub`s are not owned; the traversal steps over
    /// them to the call's return site.
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// The owned blocks that end in `retsub`.
    #[must_use]
    pub fn retsub_blocks(&self) -> &[BlockId] {
        &self.retsub_blocks
    }

    /// The blocks, anywhere in the program, whose `callsub` targets this
    /// subroutine.
    #[must_use]
    pub fn call_sites(&self) -> &[BlockId] {
        &self.call_sites
    }
}

/// One `callsub` site in the call graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallSite {
    /// The subroutine the call occurs in, or [`None`] for the entry region.
    pub caller: Option<SubroutineId>,

    /// The subroutine being called.
    pub callee: SubroutineId,

    /// The block whose final instruction is the `callsub`.
    pub block: BlockId,
}

/// The subroutine call graph: one node per subroutine plus the entry region,
/// one edge per call-site.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    sites: Vec<CallSite>,
}

impl CallGraph {
    /// All call-sites, in source order of the calling block.
    #[must_use]
    pub fn sites(&self) -> &[CallSite] {
        &self.sites
    }

    /// The subroutines called from `caller` ([`None`] for the entry region).
    #[must_use]
    pub fn callees_of(&self, caller: Option<SubroutineId>) -> Vec<SubroutineId> {
        let mut callees: Vec<SubroutineId> = self
            .sites
            .iter()
            .filter(|site| site.caller == caller)
            .map(|site| site.callee)
            .collect();
        callees.sort_unstable();
        callees.dedup();
        callees
    }
}

/// Recovers subroutines and the call graph, and appends the
/// retsub-to-return-site edges to the block arena in place.
///
/// # Errors
///
/// If a `retsub` block is not owned by any subroutine.
pub(crate) fn recover(
    program: &Program,
    blocks: &mut [BasicBlock],
    block_of: &[BlockId],
) -> Result<(Vec<Subroutine>, CallGraph)> {
    let instructions = program.instructions();
    let exit_op = |block: &BasicBlock| instructions[block.last].op().clone();

    // Group the call-sites by the callee's entry block, in entry order.
    let mut sites_by_entry: BTreeMap<BlockId, (String, Vec<BlockId>)> = BTreeMap::new();
    for block in blocks.iter() {
        if let Op::Callsub { target } = exit_op(block) {
            let entry = program
                .label_target(&target)
                .map(|index| block_of[index])
                .ok_or_else(|| {
                    ErrorKind::UnresolvedBranchTarget(target.clone())
                        .at(instructions[block.last].line())
                })?;
            sites_by_entry
                .entry(entry)
                .or_insert_with(|| (target.clone(), vec![]))
                .1
                .push(block.id);
        }
    }

    // Walk each subroutine's owned region: reachable from the entry, not
    // crossing a retsub, and stepping over nested calls to their return
    // sites rather than into the callee.
    let mut subroutines: Vec<Subroutine> = vec![];
    for (entry, (name, call_sites)) in &sites_by_entry {
        let id = SubroutineId(subroutines.len());
        let mut owned: Vec<BlockId> = vec![];
        let mut retsub_blocks: Vec<BlockId> = vec![];
        let mut stack = vec![*entry];
        let mut visited = vec![false; blocks.len()];

        while let Some(current) = stack.pop() {
            if visited[current.0] {
                continue;
            }
            visited[current.0] = true;
            owned.push(current);

            match exit_op(&blocks[current.0]) {
                Op::Retsub => retsub_blocks.push(current),
                Op::Callsub { .. } => {
                    if current.0 + 1 < blocks.len() {
                        stack.push(BlockId(current.0 + 1));
                    }
                }
                _ => {
                    for edge in blocks[current.0].successors() {
                        stack.push(edge.to);
                    }
                }
            }
        }

        owned.sort_unstable();
        retsub_blocks.sort_unstable();
        subroutines.push(Subroutine {
            id,
            name: name.clone(),
            entry: *entry,
            blocks: owned,
            retsub_blocks,
            call_sites: call_sites.clone(),
        });
    }

    // Tag ownership; the first-discovered subroutine wins a contested block.
    for subroutine in &subroutines {
        for block in &subroutine.blocks {
            let slot = &mut blocks[block.0].subroutine;
            if slot.is_none() {
                *slot = Some(subroutine.id);
            }
        }
    }

    // Every retsub must sit inside some subroutine.
    for block in blocks.iter() {
        if matches!(exit_op(block), Op::Retsub) && block.subroutine.is_none() {
            return Err(
                ErrorKind::RetsubOutsideSubroutine.at(instructions[block.last].line())
            );
        }
    }

    // Synthesise the retsub-to-return-site edges.
    let mut new_edges: Vec<Edge> = vec![];
    for subroutine in &subroutines {
        for site in &subroutine.call_sites {
            let return_site = BlockId(site.0 + 1);
            if return_site.0 >= blocks.len() {
                continue;
            }
            for retsub_block in &subroutine.retsub_blocks {
                new_edges.push(Edge {
                    from: *retsub_block,
                    to:   return_site,
                    kind: EdgeKind::RetsubToReturnSite,
                });
            }
        }
    }
    for edge in new_edges {
        blocks[edge.from.0].successors.push(edge);
    }

    // The call graph records, per site, which region the call occurs in.
    let mut sites: Vec<CallSite> = vec![];
    for subroutine in &subroutines {
        for site in &subroutine.call_sites {
            sites.push(CallSite {
                caller: blocks[site.0].subroutine,
                callee: subroutine.id,
                block:  *site,
            });
        }
    }
    sites.sort_unstable_by_key(|site| site.block);

    Ok((subroutines, CallGraph { sites }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{cfg, parser, program::Source};

    fn build_cfg(text: &str) -> cfg::ControlFlowGraph {
        let program = parser::parse(&Source::new("test.teal", text)).unwrap();
        cfg::build(program).unwrap()
    }

    #[test]
    fn blocks_belong_to_exactly_one_subroutine() {
        let cfg = build_cfg(
            "#pragma version 4\ncallsub first\ncallsub second\nint 1\nreturn\nfirst:\nint 2\npop\nretsub\nsecond:\nint 3\npop\nretsub\n",
        );
        assert_eq!(cfg.subroutines().len(), 2);
        for subroutine in cfg.subroutines() {
            for block in subroutine.blocks() {
                assert_eq!(cfg.block(*block).subroutine(), Some(subroutine.id()));
            }
        }
    }

    #[test]
    fn nested_calls_are_not_owned_by_the_caller() {
        let cfg = build_cfg(
            "#pragma version 4\ncallsub outer\nint 1\nreturn\nouter:\ncallsub inner\nretsub\ninner:\nint 2\npop\nretsub\n",
        );
        let outer = cfg
            .subroutines()
            .iter()
            .find(|s| s.name() == "outer")
            .unwrap();
        let inner = cfg
            .subroutines()
            .iter()
            .find(|s| s.name() == "inner")
            .unwrap();
        assert!(!outer.blocks().contains(&inner.entry()));
    }

    #[test]
    fn recursion_is_permitted_in_the_graph() {
        let cfg = build_cfg(
            "#pragma version 4\ncallsub ping\nint 1\nreturn\nping:\ncallsub pong\nretsub\npong:\ncallsub ping\nretsub\n",
        );
        let ping = cfg.subroutines().iter().find(|s| s.name() == "ping").unwrap();
        let pong = cfg.subroutines().iter().find(|s| s.name() == "pong").unwrap();
        assert_eq!(cfg.call_graph().callees_of(Some(ping.id())), vec![pong.id()]);
        assert_eq!(cfg.call_graph().callees_of(Some(pong.id())), vec![ping.id()]);
    }

    #[test]
    fn retsub_without_caller_is_rejected() {
        let program =
            parser::parse(&Source::new("test.teal", "#pragma version 4\nint 1\npop\nretsub\n"))
                .unwrap();
        let err = cfg::build(program).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::RetsubOutsideSubroutine));
    }
}
