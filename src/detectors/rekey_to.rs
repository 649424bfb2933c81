//! Detector for signatures that never constrain `RekeyTo`.
//!
//! Two passes, mirroring the two ways a signature can be rekeyed out from
//! under its owner: the signed transaction itself, and any sibling
//! transaction the program reaches into by literal group index without ever
//! validating that sibling's `RekeyTo`.

use std::collections::BTreeSet;

use crate::{
    analysis::{AnnotatedCfg, FieldKey, TrackedField},
    cfg::BlockId,
    detectors::{self, Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::{ExecutionMode, Op},
};

/// Reports approval paths on which `RekeyTo` stays ⊤: the signed transaction
/// can hand the signing account's authorisation key to an arbitrary address,
/// giving up control of the account entirely.
///
/// Also reports, per literal group index the program touches, approval paths
/// on which that sibling transaction's `RekeyTo` is never checked: a program
/// that inspects `gtxn i` fields is vouching for the whole group, and an
/// unchecked sibling can carry the rekey instead.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RekeyTo;

impl RekeyTo {
    /// The literal group index the instruction reads, if any.
    fn sibling_index(op: &Op) -> Option<u64> {
        match op {
            Op::Gtxn { group_index, .. }
            | Op::Gtxna { group_index, .. }
            | Op::Gtxnas { group_index, .. } => Some(*group_index),
            _ => None,
        }
    }

    /// Whether the block asserts something about `gtxn index RekeyTo`.
    fn checks_sibling(annotated: &AnnotatedCfg, id: BlockId, index: u64) -> bool {
        annotated
            .summary(id)
            .refinements
            .iter()
            .any(|(key, _)| *key == FieldKey::Gtxn(index, TrackedField::RekeyTo))
    }

    /// The group indices the program reads through literal-index accesses,
    /// with the source lines of those reads, reachable blocks only.
    fn sibling_uses(annotated: &AnnotatedCfg) -> Vec<(u64, Vec<u32>)> {
        let mut indices: BTreeSet<u64> = BTreeSet::new();
        for block in annotated.cfg().blocks() {
            if annotated.is_unreachable(block.id()) {
                continue;
            }
            for instruction in annotated.cfg().instructions(block.id()) {
                if let Some(index) = Self::sibling_index(instruction.op()) {
                    indices.insert(index);
                }
            }
        }

        indices
            .into_iter()
            .map(|index| {
                let lines = annotated
                    .cfg()
                    .blocks()
                    .iter()
                    .filter(|block| !annotated.is_unreachable(block.id()))
                    .flat_map(|block| annotated.cfg().instructions(block.id()))
                    .filter(|instruction| {
                        Self::sibling_index(instruction.op()) == Some(index)
                    })
                    .map(crate::instruction::Instruction::line)
                    .collect();
                (index, lines)
            })
            .collect()
    }
}

impl Detector for RekeyTo {
    fn id(&self) -> &'static str {
        "rekey-to"
    }

    fn description(&self) -> &'static str {
        "RekeyTo is never constrained: the account can be rekeyed"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn confidence(&self) -> Confidence {
        Confidence::High
    }

    fn applicable_to(&self, mode: ExecutionMode) -> bool {
        mode == ExecutionMode::Stateless
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        // The current transaction's own RekeyTo.
        let paths = detectors::find_unchecked_paths(annotated, &|state| {
            !state.get(TrackedField::RekeyTo).is_top()
        });
        let mut findings: Vec<Finding> = paths
            .into_iter()
            .map(|path| detectors::path_finding(self, annotated, path))
            .collect();

        // Siblings referenced by literal group index.
        for (index, lines) in Self::sibling_uses(annotated) {
            let unchecked = detectors::find_paths_lacking(annotated, &|id| {
                Self::checks_sibling(annotated, id, index)
            });
            for path in unchecked {
                findings.push(Finding::new(
                    self.id(),
                    self.severity(),
                    self.confidence(),
                    format!(
                        "RekeyTo of the group transaction at index {index} is never constrained"
                    ),
                    path,
                    lines.clone(),
                ));
            }
        }

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
        let detectors: Vec<Box<dyn Detector>> = vec![Box::new(RekeyTo)];
        run_detectors(&annotated, &detectors)
    }

    const OWN_GUARD: &str = concat!(
        "txn RekeyTo\n",
        "global ZeroAddress\n",
        "==\n",
        "assert\n",
    );

    #[test]
    fn fires_without_a_rekey_check() {
        let findings = findings_for("#pragma version 3\nint 1\nreturn\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detector(), "rekey-to");
    }

    #[test]
    fn a_zero_address_check_suppresses_the_finding() {
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "txn RekeyTo\n",
            "global ZeroAddress\n",
            "==\n",
            "assert\n",
            "int 1\n",
            "return\n",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn an_inspected_sibling_without_a_rekey_check_fires() {
        // The program vouches for the index-1 transaction's amount but never
        // looks at its RekeyTo; its own RekeyTo is guarded to isolate the
        // group half.
        let findings = findings_for(&format!(
            "#pragma version 3\n{OWN_GUARD}gtxn 1 Amount\npop\nint 1\nreturn\n"
        ));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description().contains("index 1"));
        assert_eq!(findings[0].evidence(), &[6]);
    }

    #[test]
    fn a_sibling_rekey_assert_suppresses_the_group_finding() {
        let findings = findings_for(&format!(
            concat!(
                "#pragma version 3\n",
                "{}",
                "gtxn 1 RekeyTo\n",
                "global ZeroAddress\n",
                "==\n",
                "assert\n",
                "gtxn 1 Amount\n",
                "pop\n",
                "int 1\n",
                "return\n",
            ),
            OWN_GUARD
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn each_unchecked_sibling_is_reported_separately() {
        let findings = findings_for(&format!(
            "#pragma version 3\n{OWN_GUARD}gtxn 0 Amount\npop\ngtxn 1 Amount\npop\nint 1\nreturn\n"
        ));
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().any(|f| f.description().contains("index 0")));
        assert!(findings.iter().any(|f| f.description().contains("index 1")));
    }
}
