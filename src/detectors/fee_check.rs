//! Detector for signatures that never bound the transaction fee.

use crate::{
    analysis::{AnnotatedCfg, TrackedField},
    detectors::{self, Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::ExecutionMode,
};

/// Reports approval paths on which `Fee` stays ⊤: whoever holds the
/// signature can set an arbitrarily large fee and burn the signing
/// account's balance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MissingFeeCheck;

impl Detector for MissingFeeCheck {
    fn id(&self) -> &'static str {
        "missing-fee-check"
    }

    fn description(&self) -> &'static str {
        "Fee is never bounded: the signed transaction can carry any fee"
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
        let paths = detectors::find_unchecked_paths(annotated, &|state| {
            !state.get(TrackedField::Fee).is_top()
        });
        Ok(paths
            .into_iter()
            .map(|path| detectors::path_finding(self, annotated, path))
            .collect())
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
        let detectors: Vec<Box<dyn Detector>> = vec![Box::new(MissingFeeCheck)];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn fires_without_a_fee_bound() {
        let findings = findings_for("#pragma version 3\nint 1\nreturn\n");
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn a_small_fee_bound_suppresses_the_finding() {
        let findings = findings_for(
            "#pragma version 3\ntxn Fee\nint 10\n<=\nassert\nint 1\nreturn\n",
        );
        assert!(findings.is_empty());
    }
}
