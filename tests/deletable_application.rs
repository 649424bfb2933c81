//! The delete-path scenarios for stateful applications.

mod common;

use teal_flow_analyzer::cfg::BlockId;

const UNGUARDED_DELETE: &str = concat!(
    "#pragma version 4\n",
    "byte \"state\"\n",
    "app_global_get\n",
    "pop\n",
    "txn OnCompletion\n",
    "int DeleteApplication\n",
    "==\n",
    "bnz del\n",
    "int 0\n",
    "return\n",
    "del:\n",
    "int 1\n",
    "return\n",
);

#[test]
fn is_deletable_fires_along_the_taken_branch() {
    let findings = common::findings_for("app.teal", UNGUARDED_DELETE);
    let deletable: Vec<_> = findings
        .iter()
        .filter(|f| f.detector() == "is-deletable")
        .collect();

    assert_eq!(deletable.len(), 1);
    // The evidence path runs from the entry through the taken branch to the
    // approving block.
    assert_eq!(deletable[0].path(), &[BlockId(0), BlockId(2)]);
}

#[test]
fn unprotected_deletable_fires_without_a_sender_check() {
    let findings = common::findings_for("app.teal", UNGUARDED_DELETE);
    assert!(common::detector_ids(&findings).contains(&"unprotected-deletable"));
}

#[test]
fn a_sender_check_downgrades_unprotected_but_not_deletable() {
    let guarded = concat!(
        "#pragma version 4\n",
        "byte \"state\"\n",
        "app_global_get\n",
        "pop\n",
        "txn Sender\n",
        "byte 0x636f6e74726f6c6c6572\n",
        "==\n",
        "assert\n",
        "txn OnCompletion\n",
        "int DeleteApplication\n",
        "==\n",
        "bnz del\n",
        "int 0\n",
        "return\n",
        "del:\n",
        "int 1\n",
        "return\n",
    );
    let findings = common::findings_for("app.teal", guarded);
    let ids = common::detector_ids(&findings);

    assert!(ids.contains(&"is-deletable"));
    assert!(!ids.contains(&"unprotected-deletable"));
}
