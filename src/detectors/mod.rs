//! This module contains the detector framework: the [`Detector`] trait, the
//! registration table that maps identifiers to constructors, the path-search
//! strategies the framework offers, and the driver that runs a detector set
//! over an annotated control-flow graph.
//!
//! # Object Safety
//!
//! The [`Detector`] trait must remain
//! [object safe](https://doc.rust-lang.org/reference/items/traits.html#object-safety)
//! as the implementors of the trait are used in dynamic dispatch: the
//! registry stores constructors returning boxed trait objects, and plugins
//! are nothing more than additional registrations.

pub mod can_close;
pub mod fee_check;
pub mod group_size;
pub mod is_deletable;
pub mod is_updatable;
pub mod optimizations;
pub mod rekey_to;
pub mod unprotected;

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

use downcast_rs::{impl_downcast, Downcast};
use tracing::warn;

use crate::{
    analysis::{AnnotatedCfg, FieldState},
    cfg::BlockId,
    error,
    instruction::{ExecutionMode, Op},
};

/// The broad category a detector belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Category {
    /// The detector reports security problems.
    Security,

    /// The detector reports optimisation opportunities.
    Optimization,
}

/// The severity of a reported finding.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Informational,
    Optimization,
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Informational => "Informational",
            Severity::Optimization => "Optimization",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        write!(f, "{text}")
    }
}

/// How often the detector's findings are expected to be true positives.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        write!(f, "{text}")
    }
}

/// The path-enumeration strategies the framework offers to detectors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// Loop-free paths from the program entry to any halting block.
    EntryToReturn,

    /// Loop-free paths from the program entry to any block containing a
    /// state-changing operation.
    EntryToStateChangingOp,

    /// Loop-free paths from each subroutine's entry to its `retsub` blocks,
    /// restricted to the subroutine's owned blocks.
    SubroutineInternal,
}

/// A positive result from a detector: the evidence path from an entry block
/// to the block satisfying the detector's condition, and the source lines
/// that justify it.
#[derive(Clone, Debug)]
pub struct Finding {
    detector:    &'static str,
    severity:    Severity,
    confidence:  Confidence,
    description: String,
    path:        Vec<BlockId>,
    evidence:    Vec<u32>,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(
        detector: &'static str,
        severity: Severity,
        confidence: Confidence,
        description: impl Into<String>,
        path: Vec<BlockId>,
        evidence: Vec<u32>,
    ) -> Self {
        Self {
            detector,
            severity,
            confidence,
            description: description.into(),
            path,
            evidence,
        }
    }

    /// The identifier of the detector that produced the finding.
    #[must_use]
    pub fn detector(&self) -> &'static str {
        self.detector
    }

    /// The severity of the finding.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The confidence of the finding.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// The human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The evidence path from an entry block to the offending block.
    #[must_use]
    pub fn path(&self) -> &[BlockId] {
        &self.path
    }

    /// The source lines of the instructions that justify the finding.
    #[must_use]
    pub fn evidence(&self) -> &[u32] {
        &self.evidence
    }

    /// The deduplication key: detector identifier, final block, and a hash
    /// of the path prefix and evidence lines (so two distinct windows in
    /// the same block stay distinct).
    fn dedup_key(&self) -> (&'static str, Option<BlockId>, u64) {
        let mut hasher = DefaultHasher::new();
        for block in &self.path {
            block.0.hash(&mut hasher);
        }
        self.evidence.hash(&mut hasher);
        (self.detector, self.path.last().copied(), hasher.finish())
    }
}

/// The interface every detector implements.
///
/// Detectors are stateless: they are constructed per run through the
/// registry and read everything they need from the annotated graph.
pub trait Detector
where
    Self: Downcast,
{
    /// The stable identifier the detector is selected by.
    fn id(&self) -> &'static str;

    /// A one-line description of what the detector reports.
    fn description(&self) -> &'static str;

    /// The category of the detector's findings.
    fn category(&self) -> Category;

    /// The severity assigned to the detector's findings.
    fn severity(&self) -> Severity;

    /// The confidence assigned to the detector's findings.
    fn confidence(&self) -> Confidence;

    /// Whether the detector applies to programs of the provided `mode`.
    fn applicable_to(&self, mode: ExecutionMode) -> bool;

    /// The traversal the detector's reasoning is based on.
    fn strategy(&self) -> Strategy {
        Strategy::EntryToReturn
    }

    /// Runs the detector over the annotated graph, yielding its findings.
    ///
    /// # Errors
    ///
    /// A detector may fail internally; the driver logs and skips it, and the
    /// remaining detectors still run.
    fn detect(&self, annotated: &AnnotatedCfg) -> error::Result<Vec<Finding>>;
}

impl_downcast!(Detector);

/// A constructor for a registered detector.
pub type DetectorConstructor = fn() -> Box<dyn Detector>;

/// The registration table mapping detector identifiers to constructors.
///
/// Plugins extend the analyzer by adding registrations at startup.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    entries: Vec<(&'static str, DetectorConstructor)>,
}

impl DetectorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated with the built-in detector library.
    #[must_use]
    pub fn with_default_library() -> Self {
        let mut registry = Self::new();
        registry.register("is-updatable", || Box::new(is_updatable::IsUpdatable));
        registry.register("is-deletable", || Box::new(is_deletable::IsDeletable));
        registry.register("unprotected-updatable", || {
            Box::new(unprotected::UnprotectedUpdatable)
        });
        registry.register("unprotected-deletable", || {
            Box::new(unprotected::UnprotectedDeletable)
        });
        registry.register("group-size-check", || Box::new(group_size::GroupSizeCheck));
        registry.register("can-close-account", || Box::new(can_close::CanCloseAccount));
        registry.register("can-close-asset", || Box::new(can_close::CanCloseAsset));
        registry.register("missing-fee-check", || Box::new(fee_check::MissingFeeCheck));
        registry.register("rekey-to", || Box::new(rekey_to::RekeyTo));
        registry.register("constant-gtxn", || Box::new(optimizations::ConstantGtxn));
        registry.register("self-access", || Box::new(optimizations::SelfAccess));
        registry.register("sender-access", || Box::new(optimizations::SenderAccess));
        registry
    }

    /// Adds a registration, replacing any previous one under the same
    /// identifier.
    pub fn register(&mut self, id: &'static str, constructor: DetectorConstructor) {
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.push((id, constructor));
    }

    /// The registered identifiers, in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Instantiates the selected detectors.
    ///
    /// With `include` present only the named detectors are constructed;
    /// `exclude` then removes names from whatever was selected.
    #[must_use]
    pub fn instantiate(
        &self,
        include: Option<&[String]>,
        exclude: &[String],
    ) -> Vec<Box<dyn Detector>> {
        self.entries
            .iter()
            .filter(|(id, _)| include.map_or(true, |names| names.iter().any(|n| n == id)))
            .filter(|(id, _)| !exclude.iter().any(|n| n == id))
            .map(|(_, constructor)| constructor())
            .collect()
    }
}

impl fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Runs the provided `detectors` over the annotated graph and collects their
/// findings.
///
/// Detectors that do not apply to the program's mode are skipped. A detector
/// that fails internally is logged and skipped; the others still run.
/// Findings are deduplicated by detector, final block, and path prefix.
#[must_use]
pub fn run_detectors(annotated: &AnnotatedCfg, detectors: &[Box<dyn Detector>]) -> Vec<Finding> {
    let mode = annotated.cfg().program().mode();
    let mut findings: Vec<Finding> = vec![];

    for detector in detectors {
        if !detector.applicable_to(mode) {
            continue;
        }
        match detector.detect(annotated) {
            Ok(detected) => findings.extend(detected),
            Err(error) => {
                warn!(detector = detector.id(), %error, "detector failed; skipping");
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    findings.retain(|finding| seen.insert(finding.dedup_key()));
    findings.sort_by(|a, b| b.severity().cmp(&a.severity()));
    findings
}

/// Enumerates loop-free paths according to the provided `strategy`.
///
/// A path may traverse each basic block at most once, which bounds the
/// enumeration on cyclic graphs. Unreachable blocks never appear on a path.
#[must_use]
pub fn paths_to_sinks(annotated: &AnnotatedCfg, strategy: Strategy) -> Vec<Vec<BlockId>> {
    let cfg = annotated.cfg();
    match strategy {
        Strategy::EntryToReturn => collect_paths(annotated, cfg.entry(), None, &|id| {
            cfg.block(id).is_leaf()
        }),
        Strategy::EntryToStateChangingOp => collect_paths(annotated, cfg.entry(), None, &|id| {
            cfg.instructions(id)
                .iter()
                .any(|i| is_state_changing(i.op()))
        }),
        Strategy::SubroutineInternal => {
            let mut paths = vec![];
            for subroutine in cfg.subroutines() {
                let owned = subroutine.blocks().to_vec();
                paths.extend(collect_paths(
                    annotated,
                    subroutine.entry(),
                    Some(&owned),
                    &|id| subroutine.retsub_blocks().contains(&id),
                ));
            }
            paths
        }
    }
}

/// Whether an opcode commits a state change.
fn is_state_changing(op: &Op) -> bool {
    matches!(
        op,
        Op::AppGlobalPut
            | Op::AppGlobalDel
            | Op::AppLocalPut
            | Op::AppLocalDel
            | Op::ItxnSubmit
            | Op::BoxCreate
            | Op::BoxPut
            | Op::BoxReplace
            | Op::BoxDel
    )
}

/// Depth-first path collection with loop-edge suppression.
fn collect_paths(
    annotated: &AnnotatedCfg,
    start: BlockId,
    restrict_to: Option<&[BlockId]>,
    is_sink: &dyn Fn(BlockId) -> bool,
) -> Vec<Vec<BlockId>> {
    let mut paths = vec![];
    let mut current = vec![];
    walk(annotated, start, restrict_to, is_sink, &mut current, &mut paths);
    paths
}

fn walk(
    annotated: &AnnotatedCfg,
    block: BlockId,
    restrict_to: Option<&[BlockId]>,
    is_sink: &dyn Fn(BlockId) -> bool,
    current: &mut Vec<BlockId>,
    paths: &mut Vec<Vec<BlockId>>,
) {
    if current.contains(&block) || annotated.is_unreachable(block) {
        return;
    }
    if let Some(allowed) = restrict_to {
        if !allowed.contains(&block) {
            return;
        }
    }

    current.push(block);
    if is_sink(block) {
        paths.push(current.clone());
    } else {
        for edge in annotated.cfg().block(block).successors() {
            walk(annotated, edge.to, restrict_to, is_sink, current, paths);
        }
    }
    current.pop();
}

/// Searches for execution paths on which `checked` never becomes true of a
/// block's out-state.
///
/// This is the shared skeleton of the missing-validation detectors that read
/// the per-field dataflow states. Rejecting blocks carry the ⊥ state, which
/// satisfies any check vacuously and prunes those paths.
#[must_use]
pub fn find_unchecked_paths(
    annotated: &AnnotatedCfg,
    checked: &dyn Fn(&FieldState) -> bool,
) -> Vec<Vec<BlockId>> {
    find_paths_lacking(annotated, &|id| checked(annotated.out_state(id)))
}

/// Searches for execution paths on which no block satisfies `checks`.
///
/// The traversal prunes as soon as a block satisfies the predicate
/// (everything beyond it is protected), suppresses loops, and reports the
/// full path whenever it reaches a halting block with the check still
/// unsatisfied. Unreachable blocks never appear on a path.
#[must_use]
pub fn find_paths_lacking(
    annotated: &AnnotatedCfg,
    checks: &dyn Fn(BlockId) -> bool,
) -> Vec<Vec<BlockId>> {
    let mut paths = vec![];
    let mut current = vec![];
    search_lacking(annotated, annotated.cfg().entry(), checks, &mut current, &mut paths);
    paths
}

fn search_lacking(
    annotated: &AnnotatedCfg,
    block: BlockId,
    checks: &dyn Fn(BlockId) -> bool,
    current: &mut Vec<BlockId>,
    paths: &mut Vec<Vec<BlockId>>,
) {
    if current.contains(&block) || annotated.is_unreachable(block) {
        return;
    }
    if checks(block) {
        return;
    }

    current.push(block);
    if annotated.cfg().block(block).is_leaf() {
        paths.push(current.clone());
    } else {
        for edge in annotated.cfg().block(block).successors() {
            search_lacking(annotated, edge.to, checks, current, paths);
        }
    }
    current.pop();
}

/// Builds the standard path finding for a missing-validation detector.
pub(crate) fn path_finding(
    detector: &dyn Detector,
    annotated: &AnnotatedCfg,
    path: Vec<BlockId>,
) -> Finding {
    let evidence = path
        .last()
        .map(|last| {
            let block = annotated.cfg().block(*last);
            vec![annotated.cfg().program().instructions()[block.last()].line()]
        })
        .unwrap_or_default();
    Finding::new(
        detector.id(),
        detector.severity(),
        detector.confidence(),
        detector.description(),
        path,
        evidence,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{analysis, cfg, parser, program::Source};

    fn annotate(text: &str) -> AnnotatedCfg {
        let program = parser::parse(&Source::new("test.teal", text)).unwrap();
        let graph = cfg::build(program).unwrap();
        analysis::analyze(graph, &analysis::Config::default(), None)
    }

    #[test]
    fn entry_to_return_enumerates_distinct_paths() {
        let annotated = annotate(
            "#pragma version 3\ntxn OnCompletion\nbnz alt\nint 1\nreturn\nalt:\nint 1\nreturn\n",
        );
        let paths = paths_to_sinks(&annotated, Strategy::EntryToReturn);
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path[0], annotated.cfg().entry());
        }
    }

    #[test]
    fn loops_are_traversed_at_most_once() {
        let annotated = annotate(
            "#pragma version 3\nloop:\ntxn Fee\nbnz loop\nint 1\nreturn\n",
        );
        let paths = paths_to_sinks(&annotated, Strategy::EntryToReturn);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn state_changing_strategy_stops_at_the_mutation() {
        let annotated = annotate(
            "#pragma version 3\nbyte \"k\"\nint 1\napp_global_put\nint 1\nreturn\n",
        );
        let paths = paths_to_sinks(&annotated, Strategy::EntryToStateChangingOp);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 1);
    }

    #[test]
    fn subroutine_internal_strategy_stays_inside_the_subroutine() {
        let annotated = annotate(
            "#pragma version 4\ncallsub sub\nint 1\nreturn\nsub:\nint 2\npop\nretsub\n",
        );
        let paths = paths_to_sinks(&annotated, Strategy::SubroutineInternal);
        assert_eq!(paths.len(), 1);
        let sub = &annotated.cfg().subroutines()[0];
        for block in &paths[0] {
            assert!(sub.blocks().contains(block));
        }
    }

    #[test]
    fn registry_filters_by_include_and_exclude() {
        let registry = DetectorRegistry::with_default_library();
        let all = registry.instantiate(None, &[]);
        assert_eq!(all.len(), registry.ids().len());

        let only = registry.instantiate(Some(&["rekey-to".to_string()]), &[]);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id(), "rekey-to");

        let without = registry.instantiate(None, &["rekey-to".to_string()]);
        assert!(without.iter().all(|d| d.id() != "rekey-to"));
    }

    #[test]
    fn findings_are_deduplicated_by_path() {
        let finding = |path: Vec<BlockId>| {
            Finding::new(
                "rekey-to",
                Severity::High,
                Confidence::High,
                "Rekeyable logic signature",
                path,
                vec![],
            )
        };
        let duplicated = vec![
            finding(vec![BlockId(0)]),
            finding(vec![BlockId(0)]),
        ];
        let mut seen = std::collections::HashSet::new();
        let kept: Vec<_> = duplicated
            .into_iter()
            .filter(|f| seen.insert(f.dedup_key()))
            .collect();
        assert_eq!(kept.len(), 1);
    }
}
