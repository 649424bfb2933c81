//! Detector for execution paths that approve a `DeleteApplication` call.

use crate::{
    analysis::{AnnotatedCfg, FieldValue, TrackedField},
    constant::ON_COMPLETION_DELETE_APPLICATION,
    detectors::{self, Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::ExecutionMode,
};

/// Reports paths ending at a terminator on which `OnCompletion` can still be
/// `DeleteApplication`: approving such a call removes the application from
/// the ledger along with any funds it escrows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IsDeletable;

impl Detector for IsDeletable {
    fn id(&self) -> &'static str {
        "is-deletable"
    }

    fn description(&self) -> &'static str {
        "Deletable application: a DeleteApplication call can be approved"
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
        let vulnerable = FieldValue::Uint(ON_COMPLETION_DELETE_APPLICATION);
        let paths = detectors::find_unchecked_paths(annotated, &|state| {
            !state.get(TrackedField::OnCompletion).may_contain(&vulnerable)
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
        let detectors: Vec<Box<dyn Detector>> = vec![Box::new(IsDeletable)];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn fires_on_the_branch_that_approves_deletion() {
        // The taken branch approves exactly when OnCompletion is
        // DeleteApplication, so only that path is reported.
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "byte \"k\"\n",
            "app_global_get\n",
            "pop\n",
            "txn OnCompletion\n",
            "int DeleteApplication\n",
            "==\n",
            "bnz approve\n",
            "int 0\n",
            "return\n",
            "approve:\n",
            "int 1\n",
            "return\n",
        ));
        assert_eq!(findings.len(), 1);
        let path = findings[0].path();
        assert_eq!(path.first().map(|b| b.0), Some(0));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn does_not_fire_when_deletion_errs() {
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "byte \"k\"\n",
            "app_global_get\n",
            "pop\n",
            "txn OnCompletion\n",
            "int DeleteApplication\n",
            "==\n",
            "bnz reject\n",
            "int 1\n",
            "return\n",
            "reject:\n",
            "err\n",
        ));
        assert!(findings.is_empty());
    }
}
