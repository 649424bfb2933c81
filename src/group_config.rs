//! This module contains the loader for the optional group configuration: a
//! structured file declaring, for a set of contracts, the transaction-group
//! templates they are deployed in.
//!
//! The engine consumes the configuration purely as an initial-state
//! refinement: fields the surrounding group pins (the group's size, the
//! contract's position and transaction type) start the dataflow analysis
//! constrained instead of ⊤.

use std::{collections::BTreeSet, fs::File, io::Read, path::Path};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::analysis::{FieldState, FieldValue, TrackedField, ValueSet};

/// The artifact a configured contract file contains.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ArtifactKind {
    ApprovalProgram,
    ClearStateProgram,
    LogicSig,
}

/// The declared type of a transaction slot in a group template.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Pay,
    Appl,
    Axfer,
    Afrz,
    Keyreg,
    Acfg,
}

impl TxnType {
    /// The numeric `TypeEnum` value of the transaction type.
    #[must_use]
    pub fn type_enum(self) -> u64 {
        match self {
            TxnType::Pay => 1,
            TxnType::Keyreg => 2,
            TxnType::Acfg => 3,
            TxnType::Axfer => 4,
            TxnType::Afrz => 5,
            TxnType::Appl => 6,
        }
    }
}

/// A reference from a transaction slot to a configured contract, optionally
/// narrowed to one of its dispatch functions.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoleRef {
    /// The name of the configured contract.
    pub contract: String,

    /// The dispatch function within the contract, if the slot names one.
    #[serde(default)]
    pub function: Option<String>,
}

/// One transaction slot in a group template.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TransactionDecl {
    /// The template-unique identifier of the slot.
    pub txn_id: String,

    /// The declared transaction type.
    pub txn_type: TxnType,

    /// The application executed by this slot, if it is an application call.
    #[serde(default)]
    pub application: Option<RoleRef>,

    /// The logic signature authorising this slot, if any.
    #[serde(default)]
    pub logic_sig: Option<RoleRef>,

    /// The fixed position of the slot in the group, where declared.
    #[serde(default)]
    pub absolute_index: Option<u64>,
}

/// A named entry point of a contract, located by the ordered list of basic
/// block identifiers from the entry to the function's first distinctive
/// block.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DispatchEntry {
    /// The function name.
    pub name: String,

    /// Block identifiers from the entry block to the function's first
    /// distinctive block.
    pub dispatch_path: Vec<usize>,
}

/// A configured contract: where its source lives and what it is.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ContractDecl {
    /// The name the group templates refer to the contract by.
    pub name: String,

    /// The path of the contract's source file.
    pub path: String,

    /// The artifact the file contains.
    pub kind: ArtifactKind,

    /// The contract's language version.
    pub version: u8,

    /// The contract's dispatch entries.
    #[serde(default)]
    pub dispatch: Vec<DispatchEntry>,
}

/// A named group template: an ordered sequence of transaction slots.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupTemplate {
    /// The template name.
    pub name: String,

    /// The transaction slots, in group order.
    pub transactions: Vec<TransactionDecl>,
}

/// The parsed group configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GroupConfig {
    /// The configured contracts.
    #[serde(default)]
    pub contracts: Vec<ContractDecl>,

    /// The group templates.
    #[serde(default)]
    pub groups: Vec<GroupTemplate>,
}

impl GroupConfig {
    /// Parses a configuration from its JSON text.
    ///
    /// # Errors
    ///
    /// If the text is not valid JSON or does not match the schema.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).map_err(|e| anyhow!("Could not parse group config: {e}"))
    }

    /// Reads and parses a configuration from the file at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path.as_ref()).map_err(|_| anyhow!("File not available"))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|_| anyhow!("File could not be read"))?;
        Self::from_json(&contents)
    }

    /// Finds the configured contract with the provided `name`.
    #[must_use]
    pub fn contract(&self, name: &str) -> Option<&ContractDecl> {
        self.contracts.iter().find(|contract| contract.name == name)
    }

    /// Derives the dataflow entry state for the named contract from the
    /// first group template that references it.
    ///
    /// The group's length pins `GroupSize`; the referencing slot's declared
    /// type pins `TypeEnum`, and its absolute index, where declared, pins
    /// `GroupIndex`. Returns [`None`] when no template references the
    /// contract, in which case the engine starts from ⊤.
    #[must_use]
    pub fn initial_state(&self, contract_name: &str) -> Option<FieldState> {
        for template in &self.groups {
            let slot = template.transactions.iter().find(|txn| {
                let references = |role: &Option<RoleRef>| {
                    role.as_ref().is_some_and(|r| r.contract == contract_name)
                };
                references(&txn.application) || references(&txn.logic_sig)
            });
            let Some(slot) = slot else { continue };

            let mut state = FieldState::top();
            let size = template.transactions.len() as u64;
            state.set(
                TrackedField::GroupSize,
                ValueSet::singleton(FieldValue::Uint(size)),
            );
            state.set(
                TrackedField::TypeEnum,
                ValueSet::singleton(FieldValue::Uint(slot.txn_type.type_enum())),
            );
            if let Some(index) = slot.absolute_index {
                state.set(
                    TrackedField::GroupIndex,
                    ValueSet::singleton(FieldValue::Uint(index)),
                );
            } else {
                let positions: BTreeSet<FieldValue> =
                    (0..size).map(FieldValue::Uint).collect();
                state.set(
                    TrackedField::GroupIndex,
                    ValueSet::from_values(positions, size as usize),
                );
            }
            return Some(state);
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONFIG: &str = r#"{
        "contracts": [
            {
                "name": "vault",
                "path": "vault.teal",
                "kind": "ApprovalProgram",
                "version": 6,
                "dispatch": [
                    { "name": "deposit", "dispatch_path": [0, 3] }
                ]
            }
        ],
        "groups": [
            {
                "name": "deposit-group",
                "transactions": [
                    { "txn_id": "payment", "txn_type": "pay" },
                    {
                        "txn_id": "call",
                        "txn_type": "appl",
                        "application": { "contract": "vault", "function": "deposit" },
                        "absolute_index": 1
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_the_schema() {
        let config = GroupConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.contracts.len(), 1);
        assert_eq!(config.contract("vault").unwrap().kind, ArtifactKind::ApprovalProgram);
        assert_eq!(config.groups[0].transactions.len(), 2);
        assert_eq!(config.groups[0].transactions[0].txn_type, TxnType::Pay);
    }

    #[test]
    fn derives_the_entry_state() {
        let config = GroupConfig::from_json(CONFIG).unwrap();
        let state = config.initial_state("vault").unwrap();
        assert_eq!(
            state.get(TrackedField::GroupSize),
            &ValueSet::singleton(FieldValue::Uint(2))
        );
        assert_eq!(
            state.get(TrackedField::GroupIndex),
            &ValueSet::singleton(FieldValue::Uint(1))
        );
        assert_eq!(
            state.get(TrackedField::TypeEnum),
            &ValueSet::singleton(FieldValue::Uint(6))
        );
    }

    #[test]
    fn unreferenced_contracts_get_no_state() {
        let config = GroupConfig::from_json(CONFIG).unwrap();
        assert!(config.initial_state("unknown").is_none());
    }
}
