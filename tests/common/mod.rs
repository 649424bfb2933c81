//! This module contains common testing utilities for testing this library.
#![cfg(test)]

use teal_flow_analyzer as tfa;
use teal_flow_analyzer::{
    analysis,
    analyzer::{state, Analyzer},
    detectors::{DetectorRegistry, Finding},
    program::Source,
};

/// Runs the full pipeline over the provided source text with the default
/// configuration and no group information.
#[allow(unused)] // It is actually
pub fn analyze_text(name: &str, text: &str) -> Analyzer<state::Analyzed> {
    tfa::new(Source::new(name, text))
        .run(&analysis::Config::default(), None)
        .expect("program should analyze")
}

/// Runs the full detector library over the provided source text.
#[allow(unused)] // It is actually
pub fn findings_for(name: &str, text: &str) -> Vec<Finding> {
    let analyzer = analyze_text(name, text);
    let registry = DetectorRegistry::with_default_library();
    let detectors = registry.instantiate(None, &[]);
    analyzer.run_detectors(&detectors)
}

/// The identifiers of the detectors that produced the findings.
#[allow(unused)] // It is actually
pub fn detector_ids(findings: &[Finding]) -> Vec<&'static str> {
    findings.iter().map(Finding::detector).collect()
}
