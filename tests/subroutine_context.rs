//! Cross-subroutine dataflow: refinements made inside a callee are in force
//! at the caller's return site, and recursion converges.

mod common;

use teal_flow_analyzer::{
    analysis::{FieldValue, TrackedField, ValueSet},
    cfg::BlockId,
};

#[test]
fn a_callee_sender_assert_reaches_the_return_site() {
    let analyzer = common::analyze_text(
        "app.teal",
        concat!(
            "#pragma version 4\n",
            "byte \"state\"\n",
            "app_global_get\n",
            "pop\n",
            "callsub auth\n",
            "int 1\n",
            "return\n",
            "auth:\n",
            "txn Sender\n",
            "byte \"admin\"\n",
            "==\n",
            "assert\n",
            "retsub\n",
        ),
    );

    let return_site = BlockId(1);
    assert_eq!(
        analyzer.annotated().in_state(return_site).get(TrackedField::Sender),
        &ValueSet::singleton(FieldValue::Bytes(b"admin".to_vec()))
    );
}

#[test]
fn sender_requiring_detectors_stay_quiet_after_the_callee_check() {
    let findings = common::findings_for(
        "app.teal",
        concat!(
            "#pragma version 4\n",
            "byte \"state\"\n",
            "app_global_get\n",
            "pop\n",
            "callsub auth\n",
            "int 1\n",
            "return\n",
            "auth:\n",
            "txn Sender\n",
            "byte \"admin\"\n",
            "==\n",
            "assert\n",
            "retsub\n",
        ),
    );
    let ids = common::detector_ids(&findings);
    assert!(!ids.contains(&"unprotected-updatable"));
    assert!(!ids.contains(&"unprotected-deletable"));
}

#[test]
fn mutually_recursive_group_size_asserts_converge() {
    let analyzer = common::analyze_text(
        "rec.teal",
        concat!(
            "#pragma version 4\n",
            "callsub even\n",
            "int 1\n",
            "return\n",
            "even:\n",
            "global GroupSize\n",
            "int 2\n",
            "==\n",
            "assert\n",
            "txn Fee\n",
            "bz even_done\n",
            "callsub odd\n",
            "even_done:\n",
            "retsub\n",
            "odd:\n",
            "global GroupSize\n",
            "int 2\n",
            "<=\n",
            "assert\n",
            "txn Fee\n",
            "bz odd_done\n",
            "callsub even\n",
            "odd_done:\n",
            "retsub\n",
        ),
    );

    // The engine terminated (we are here) and the state at the outer return
    // site is the meet of the two subroutines' refinements.
    let return_site = BlockId(1);
    assert_eq!(
        analyzer.annotated().in_state(return_site).get(TrackedField::GroupSize),
        &ValueSet::singleton(FieldValue::Uint(2))
    );
}
