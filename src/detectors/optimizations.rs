//! Structural optimisation detectors.
//!
//! These scan instruction windows directly and use no dataflow facts: each
//! reports a cheaper encoding of something the program already does.

use crate::{
    analysis::AnnotatedCfg,
    detectors::{Category, Confidence, Detector, Finding, Severity},
    error,
    instruction::{ExecutionMode, Instruction, Op, TransactionField},
};

/// Runs a two-instruction sliding window over every block, reporting the
/// windows `matches` accepts.
fn scan_windows(
    detector: &dyn Detector,
    annotated: &AnnotatedCfg,
    matches: &dyn Fn(&Instruction, &Instruction) -> bool,
) -> Vec<Finding> {
    let mut findings = vec![];
    for block in annotated.cfg().blocks() {
        let instructions = annotated.cfg().instructions(block.id());
        for window in instructions.windows(2) {
            if matches(&window[0], &window[1]) {
                findings.push(Finding::new(
                    detector.id(),
                    detector.severity(),
                    detector.confidence(),
                    detector.description(),
                    vec![block.id()],
                    vec![window[0].line(), window[1].line()],
                ));
            }
        }
    }
    findings
}

/// Reports `int N; gtxns F` pairs: pushing a constant index and indexing
/// dynamically costs two instructions where `gtxn N F` costs one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConstantGtxn;

impl Detector for ConstantGtxn {
    fn id(&self) -> &'static str {
        "constant-gtxn"
    }

    fn description(&self) -> &'static str {
        "A constant-index gtxns can be encoded as a single gtxn"
    }

    fn category(&self) -> Category {
        Category::Optimization
    }

    fn severity(&self) -> Severity {
        Severity::Optimization
    }

    fn confidence(&self) -> Confidence {
        Confidence::High
    }

    fn applicable_to(&self, mode: ExecutionMode) -> bool {
        mode == ExecutionMode::Stateless
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        Ok(scan_windows(self, annotated, &|first, second| {
            matches!(first.op(), Op::Int { .. }) && matches!(second.op(), Op::Gtxns { .. })
        }))
    }
}

/// Reports `txn GroupIndex; gtxns F` pairs: indexing the group with the
/// transaction's own index is just `txn F`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SelfAccess;

impl Detector for SelfAccess {
    fn id(&self) -> &'static str {
        "self-access"
    }

    fn description(&self) -> &'static str {
        "Accessing the group at the transaction's own index is just txn"
    }

    fn category(&self) -> Category {
        Category::Optimization
    }

    fn severity(&self) -> Severity {
        Severity::Optimization
    }

    fn confidence(&self) -> Confidence {
        Confidence::High
    }

    fn applicable_to(&self, mode: ExecutionMode) -> bool {
        mode == ExecutionMode::Stateless
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        Ok(scan_windows(self, annotated, &|first, second| {
            matches!(
                first.op(),
                Op::Txn {
                    field: TransactionField::GroupIndex
                }
            ) && matches!(
                second.op(),
                Op::Gtxns { .. } | Op::Gtxnsa { .. } | Op::Gtxnsas { .. }
            )
        }))
    }
}

/// Reports `txna Accounts 0` accesses: index zero of the accounts array is
/// the sender, available directly as `txn Sender`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SenderAccess;

impl Detector for SenderAccess {
    fn id(&self) -> &'static str {
        "sender-access"
    }

    fn description(&self) -> &'static str {
        "txna Accounts 0 is the sender, available as txn Sender"
    }

    fn category(&self) -> Category {
        Category::Optimization
    }

    fn severity(&self) -> Severity {
        Severity::Optimization
    }

    fn confidence(&self) -> Confidence {
        Confidence::High
    }

    fn applicable_to(&self, mode: ExecutionMode) -> bool {
        mode == ExecutionMode::Stateless
    }

    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>> {
        let mut findings = vec![];
        for block in annotated.cfg().blocks() {
            for instruction in annotated.cfg().instructions(block.id()) {
                if matches!(
                    instruction.op(),
                    Op::Txna {
                        field: TransactionField::Accounts,
                        index: 0,
                    }
                ) {
                    findings.push(Finding::new(
                        self.id(),
                        self.severity(),
                        self.confidence(),
                        self.description(),
                        vec![block.id()],
                        vec![instruction.line()],
                    ));
                }
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
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(ConstantGtxn),
            Box::new(SelfAccess),
            Box::new(SenderAccess),
        ];
        run_detectors(&annotated, &detectors)
    }

    #[test]
    fn constant_gtxn_window_is_reported() {
        let findings = findings_for(
            "#pragma version 3\nint 1\ngtxns Amount\npop\nint 1\nreturn\n",
        );
        let ids: Vec<_> = findings.iter().map(Finding::detector).collect();
        assert!(ids.contains(&"constant-gtxn"));
    }

    #[test]
    fn self_access_window_is_reported() {
        let findings = findings_for(
            "#pragma version 3\ntxn GroupIndex\ngtxns Amount\npop\nint 1\nreturn\n",
        );
        let ids: Vec<_> = findings.iter().map(Finding::detector).collect();
        assert!(ids.contains(&"self-access"));
    }

    #[test]
    fn sender_access_is_reported_with_its_line() {
        let findings = findings_for(
            "#pragma version 3\ntxna Accounts 0\npop\nint 1\nreturn\n",
        );
        let sender: Vec<_> = findings
            .iter()
            .filter(|f| f.detector() == "sender-access")
            .collect();
        assert_eq!(sender.len(), 1);
        assert_eq!(sender[0].evidence(), &[2]);
    }

    #[test]
    fn no_window_no_finding() {
        let findings = findings_for("#pragma version 3\nint 1\nreturn\n");
        assert!(findings.is_empty());
    }
}
