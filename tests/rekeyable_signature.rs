//! The rekey scenario for logic signatures.

mod common;

#[test]
fn a_signature_without_a_rekey_check_is_reported() {
    let findings = common::findings_for(
        "sig.teal",
        "#pragma version 3\ntxn Amount\nint 1000000\n<=\nint 1\n&&\nreturn\n",
    );
    assert!(common::detector_ids(&findings).contains(&"rekey-to"));
}

#[test]
fn the_standard_rekey_guard_suppresses_the_finding() {
    let findings = common::findings_for(
        "sig.teal",
        concat!(
            "#pragma version 3\n",
            "txn RekeyTo\n",
            "global ZeroAddress\n",
            "==\n",
            "assert\n",
            "int 1\n",
            "return\n",
        ),
    );
    assert!(!common::detector_ids(&findings).contains(&"rekey-to"));
}

#[test]
fn a_guard_on_only_one_branch_still_fires() {
    // The second branch approves without ever looking at RekeyTo.
    let findings = common::findings_for(
        "sig.teal",
        concat!(
            "#pragma version 3\n",
            "txn Fee\n",
            "bnz other\n",
            "txn RekeyTo\n",
            "global ZeroAddress\n",
            "==\n",
            "assert\n",
            "int 1\n",
            "return\n",
            "other:\n",
            "int 1\n",
            "return\n",
        ),
    );
    let rekey: Vec<_> = findings
        .iter()
        .filter(|f| f.detector() == "rekey-to")
        .collect();
    assert_eq!(rekey.len(), 1);
}

#[test]
fn an_inspected_sibling_needs_its_own_rekey_guard() {
    // The signature guards its own RekeyTo but reaches into the index-0
    // transaction without ever checking that sibling's RekeyTo.
    let vulnerable = concat!(
        "#pragma version 3\n",
        "txn RekeyTo\n",
        "global ZeroAddress\n",
        "==\n",
        "assert\n",
        "gtxn 0 Receiver\n",
        "pop\n",
        "int 1\n",
        "return\n",
    );
    let findings = common::findings_for("sig.teal", vulnerable);
    let rekey: Vec<_> = findings
        .iter()
        .filter(|f| f.detector() == "rekey-to")
        .collect();
    assert_eq!(rekey.len(), 1);
    assert!(rekey[0].description().contains("index 0"));

    let guarded = concat!(
        "#pragma version 3\n",
        "txn RekeyTo\n",
        "global ZeroAddress\n",
        "==\n",
        "assert\n",
        "gtxn 0 RekeyTo\n",
        "global ZeroAddress\n",
        "==\n",
        "assert\n",
        "gtxn 0 Receiver\n",
        "pop\n",
        "int 1\n",
        "return\n",
    );
    let findings = common::findings_for("sig.teal", guarded);
    assert!(!common::detector_ids(&findings).contains(&"rekey-to"));
}
