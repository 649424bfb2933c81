//! Detectors for update and delete paths that are additionally unprotected:
//! no constraint pins the sender to a known account, so anybody can submit
//! the call.

use crate::{
    analysis::{AnnotatedCfg, FieldState, FieldValue, TrackedField},
    constant::{ON_COMPLETION_DELETE_APPLICATION, ON_COMPLETION_UPDATE_APPLICATION},
    detectors::{self, Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::ExecutionMode,
};

/// A path is protected when the dangerous `OnCompletion` value is refuted,
/// or when the sender has been pinned to a single concrete address (the
/// contract has at least identified who may perform the call).
fn checks_protection(state: &FieldState, vulnerable: &FieldValue) -> bool {
    if !state.get(TrackedField::OnCompletion).may_contain(vulnerable) {
        return true;
    }
    state.get(TrackedField::Sender).as_singleton().is_some()
}

fn detect_unprotected(
    detector: &dyn Detector,
    annotated: &AnnotatedCfg,
    on_completion: u64,
) -> Vec<Finding> {
    let vulnerable = FieldValue::Uint(on_completion);
    let paths = detectors::find_unchecked_paths(annotated, &|state| {
        checks_protection(state, &vulnerable)
    });
    paths
        .into_iter()
        .map(|path| detectors::path_finding(detector, annotated, path))
        .collect()
}

/// Reports update-capable paths with no sender restriction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UnprotectedUpdatable;

impl Detector for UnprotectedUpdatable {
    fn id(&self) -> &'static str {
        "unprotected-updatable"
    }

    fn description(&self) -> &'static str {
        "Unprotected upgrade: anyone can submit an approved UpdateApplication call"
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
        mode == ExecutionMode::Stateful
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        Ok(detect_unprotected(
            self,
            annotated,
            ON_COMPLETION_UPDATE_APPLICATION,
        ))
    }
}

/// Reports delete-capable paths with no sender restriction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UnprotectedDeletable;

impl Detector for UnprotectedDeletable {
    fn id(&self) -> &'static str {
        "unprotected-deletable"
    }

    fn description(&self) -> &'static str {
        "Unprotected deletion: anyone can submit an approved DeleteApplication call"
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
        mode == ExecutionMode::Stateful
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        Ok(detect_unprotected(
            self,
            annotated,
            ON_COMPLETION_DELETE_APPLICATION,
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
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(UnprotectedUpdatable),
            Box::new(UnprotectedDeletable),
        ];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn fires_when_no_sender_check_guards_the_path() {
        let findings = findings_for(
            "#pragma version 3\nbyte \"k\"\napp_global_get\npop\nint 1\nreturn\n",
        );
        let ids: Vec<_> = findings.iter().map(Finding::detector).collect();
        assert!(ids.contains(&"unprotected-updatable"));
        assert!(ids.contains(&"unprotected-deletable"));
    }

    #[test]
    fn a_pinned_sender_suppresses_the_finding() {
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "byte \"k\"\n",
            "app_global_get\n",
            "pop\n",
            "txn Sender\n",
            "byte 0x61646d696e\n",
            "==\n",
            "assert\n",
            "int 1\n",
            "return\n",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn a_sender_check_in_a_subroutine_counts() {
        let findings = findings_for(concat!(
            "#pragma version 4\n",
            "byte \"k\"\n",
            "app_global_get\n",
            "pop\n",
            "callsub auth\n",
            "int 1\n",
            "return\n",
            "auth:\n",
            "txn Sender\n",
            "byte 0x61646d696e\n",
            "==\n",
            "assert\n",
            "retsub\n",
        ));
        assert!(findings.is_empty());
    }
}
