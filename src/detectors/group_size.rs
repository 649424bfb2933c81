//! Detector for sibling-transaction accesses made without a group-size
//! guarantee.

use crate::{
    analysis::{AnnotatedCfg, FieldValue, TrackedField, ValueSet},
    cfg::BlockId,
    detectors::{Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::{ExecutionMode, Instruction, Op},
};

/// Reports paths on which a `gtxn i F` family access happens while
/// `GroupSize` is not known to exceed `i`: with a smaller group the accessed
/// index belongs to a different, attacker-chosen transaction layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GroupSizeCheck;

impl GroupSizeCheck {
    /// The literal group indices the instruction reads, if any.
    fn literal_indices(instruction: &Instruction) -> Option<u64> {
        match instruction.op() {
            Op::Gtxn { group_index, .. }
            | Op::Gtxna { group_index, .. }
            | Op::Gtxnas { group_index, .. } => Some(*group_index),
            _ => None,
        }
    }

    /// Whether the state guarantees that the group contains an index `i`
    /// transaction: `GroupSize` is enumerated and every member is at least
    /// `i + 1`.
    fn guarantees_index(state: &ValueSet, index: u64) -> bool {
        match state {
            ValueSet::Bottom => true,
            ValueSet::Top => false,
            ValueSet::Values(values) => values.iter().all(|value| match value {
                FieldValue::Uint(size) => *size >= index + 1,
                FieldValue::Bytes(_) => false,
            }),
        }
    }

    fn search(
        &self,
        annotated: &AnnotatedCfg,
        block: BlockId,
        current: &mut Vec<BlockId>,
        findings: &mut Vec<Finding>,
    ) {
        if current.contains(&block) || annotated.is_unreachable(block) {
            return;
        }
        current.push(block);

        let group_size = annotated.out_state(block).get(TrackedField::GroupSize);
        let unchecked_uses: Vec<u32> = annotated
            .cfg()
            .instructions(block)
            .iter()
            .filter_map(|instruction| {
                Self::literal_indices(instruction)
                    .filter(|index| !Self::guarantees_index(group_size, *index))
                    .map(|_| instruction.line())
            })
            .collect();

        if unchecked_uses.is_empty() {
            for edge in annotated.cfg().block(block).successors() {
                self.search(annotated, edge.to, current, findings);
            }
        } else {
            findings.push(Finding::new(
                self.id(),
                self.severity(),
                self.confidence(),
                self.description(),
                current.clone(),
                unchecked_uses,
            ));
        }

        current.pop();
    }
}

impl Detector for GroupSizeCheck {
    fn id(&self) -> &'static str {
        "group-size-check"
    }

    fn description(&self) -> &'static str {
        "Sibling transaction accessed without a GroupSize guarantee"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn confidence(&self) -> Confidence {
        Confidence::High
    }

    fn applicable_to(&self, _mode: ExecutionMode) -> bool {
        true
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        let mut findings = vec![];
        let mut current = vec![];
        self.search(annotated, annotated.cfg().entry(), &mut current, &mut findings);
        Ok(findings)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{analysis, cfg, detectors::run_detectors, parser, program::Source};

    fn findings_for(text: &str) -> Vec<Finding> {
        let program = parser::parse(&Source::new("test.teal", text)).unwrap();
        let graph = cfg::build(program).unwrap();
        let annotated = analysis::analyze(graph, &analysis::Config::default(), None);
        let detectors: Vec<Box<dyn Detector>> = vec![Box::new(GroupSizeCheck)];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn fires_when_group_size_is_unconstrained() {
        let findings = findings_for(
            "#pragma version 3\ngtxn 1 Amount\npop\nint 1\nreturn\n",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].evidence(), &[2]);
    }

    #[test]
    fn a_prior_group_size_assert_suppresses_the_finding() {
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "global GroupSize\n",
            "int 2\n",
            "==\n",
            "assert\n",
            "gtxn 1 Amount\n",
            "pop\n",
            "int 1\n",
            "return\n",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn a_too_small_group_bound_still_fires() {
        // GroupSize pinned to {1} cannot contain an index-1 sibling.
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "global GroupSize\n",
            "int 1\n",
            "==\n",
            "assert\n",
            "gtxn 1 Amount\n",
            "pop\n",
            "int 1\n",
            "return\n",
        ));
        assert_eq!(findings.len(), 1);
    }
}
