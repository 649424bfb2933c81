//! Tabular rendering of detector findings.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::detectors::Finding;

/// Renders the findings as a text table: one header block per detector with
/// its severity and confidence, then one row per finding listing the
/// evidence path and lines.
#[must_use]
pub fn render_findings(program: &str, findings: &[Finding]) -> String {
    let mut out = String::new();

    if findings.is_empty() {
        let _ = writeln!(out, "{program}: no findings");
        return out;
    }

    let _ = writeln!(out, "{program}: {} finding(s)", findings.len());
    for (detector, group) in &findings.iter().chunk_by(|f| f.detector()) {
        let group: Vec<&Finding> = group.collect();
        let first = group[0];
        let _ = writeln!(
            out,
            "\nCheck: {detector}, Severity: {}, Confidence: {}",
            first.severity(),
            first.confidence()
        );
        let _ = writeln!(out, "Description: {}", first.description());
        for (index, finding) in group.iter().enumerate() {
            let path = finding.path().iter().map(ToString::to_string).join(" -> ");
            let lines = finding.evidence().iter().map(ToString::to_string).join(", ");
            let _ = writeln!(out, "  [{}] path: {path} (lines {lines})", index + 1);
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        cfg::BlockId,
        detectors::{Confidence, Severity},
    };

    #[test]
    fn renders_grouped_findings() {
        let findings = vec![
            Finding::new(
                "rekey-to",
                Severity::High,
                Confidence::High,
                "RekeyTo is never constrained",
                vec![BlockId(0), BlockId(2)],
                vec![7],
            ),
            Finding::new(
                "rekey-to",
                Severity::High,
                Confidence::High,
                "RekeyTo is never constrained",
                vec![BlockId(0), BlockId(3)],
                vec![9],
            ),
        ];
        let text = render_findings("sig.teal", &findings);
        assert!(text.contains("sig.teal: 2 finding(s)"));
        assert!(text.contains("Check: rekey-to, Severity: High, Confidence: High"));
        assert!(text.contains("[1] path: B0 -> B2 (lines 7)"));
        assert!(text.contains("[2] path: B0 -> B3 (lines 9)"));
    }

    #[test]
    fn renders_the_empty_case() {
        let text = render_findings("sig.teal", &[]);
        assert_eq!(text, "sig.teal: no findings\n");
    }
}
