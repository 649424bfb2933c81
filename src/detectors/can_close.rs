//! Detectors for signatures that leave the account- or asset-closing fields
//! of their transaction unconstrained.

use crate::{
    analysis::{AnnotatedCfg, TrackedField},
    detectors::{self, Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::ExecutionMode,
};

fn detect_unconstrained_field(
    detector: &dyn Detector,
    annotated: &AnnotatedCfg,
    field: TrackedField,
) -> Vec<Finding> {
    let paths =
        detectors::find_unchecked_paths(annotated, &|state| !state.get(field).is_top());
    paths
        .into_iter()
        .map(|path| detectors::path_finding(detector, annotated, path))
        .collect()
}

/// Reports approval paths on which `CloseRemainderTo` stays ⊤: the holder of
/// the signature can drain the signing account by closing it to themselves.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CanCloseAccount;

impl Detector for CanCloseAccount {
    fn id(&self) -> &'static str {
        "can-close-account"
    }

    fn description(&self) -> &'static str {
        "CloseRemainderTo is never constrained: the account can be closed out"
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
        Ok(detect_unconstrained_field(
            self,
            annotated,
            TrackedField::CloseRemainderTo,
        ))
    }
}

/// Reports approval paths on which `AssetCloseTo` stays ⊤: the holder of the
/// signature can close out the account's asset holdings.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CanCloseAsset;

impl Detector for CanCloseAsset {
    fn id(&self) -> &'static str {
        "can-close-asset"
    }

    fn description(&self) -> &'static str {
        "AssetCloseTo is never constrained: asset holdings can be closed out"
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
        Ok(detect_unconstrained_field(
            self,
            annotated,
            TrackedField::AssetCloseTo,
        ))
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
        let detectors: Vec<Box<dyn Detector>> =
            vec![Box::new(CanCloseAccount), Box::new(CanCloseAsset)];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn both_fire_on_an_unconstrained_signature() {
        let findings = findings_for("#pragma version 3\nint 1\nreturn\n");
        let ids: Vec<_> = findings.iter().map(Finding::detector).collect();
        assert!(ids.contains(&"can-close-account"));
        assert!(ids.contains(&"can-close-asset"));
    }

    #[test]
    fn a_zero_address_check_suppresses_the_account_finding() {
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "txn CloseRemainderTo\n",
            "global ZeroAddress\n",
            "==\n",
            "assert\n",
            "int 1\n",
            "return\n",
        ));
        let ids: Vec<_> = findings.iter().map(Finding::detector).collect();
        assert!(!ids.contains(&"can-close-account"));
        assert!(ids.contains(&"can-close-asset"));
    }
}
