//! Detector for execution paths that approve an `UpdateApplication` call.

use crate::{
    analysis::{AnnotatedCfg, FieldValue, TrackedField},
    constant::ON_COMPLETION_UPDATE_APPLICATION,
    detectors::{self, Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::ExecutionMode,
};

/// Reports paths ending at a terminator on which `OnCompletion` can still be
/// `UpdateApplication`: anyone able to get such a call approved can replace
/// the application's programs.
///
/// Paths that only execute when the call is not `UpdateApplication` are
/// excluded through the dataflow facts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IsUpdatable;

impl Detector for IsUpdatable {
    fn id(&self) -> &'static str {
        "is-updatable"
    }

    fn description(&self) -> &'static str {
        "Upgradable application: an UpdateApplication call can be approved"
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
        let vulnerable = FieldValue::Uint(ON_COMPLETION_UPDATE_APPLICATION);
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
        let detectors: Vec<Box<dyn Detector>> = vec![Box::new(IsUpdatable)];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn fires_on_an_unguarded_application() {
        let findings = findings_for(
            "#pragma version 3\nbyte \"k\"\napp_global_get\npop\nint 1\nreturn\n",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].detector(), "is-updatable");
    }

    #[test]
    fn does_not_fire_when_update_is_rejected() {
        let findings = findings_for(concat!(
            "#pragma version 3\n",
            "byte \"k\"\n",
            "app_global_get\n",
            "pop\n",
            "txn OnCompletion\n",
            "int UpdateApplication\n",
            "!=\n",
            "assert\n",
            "int 1\n",
            "return\n",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn skipped_for_stateless_programs() {
        let findings = findings_for("#pragma version 3\nint 1\nreturn\n");
        assert!(findings.is_empty());
    }
}
