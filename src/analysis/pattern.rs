//! This module contains the peephole matcher that recognises the
//! compare-and-assert idioms inside a basic block.
//!
//! The matcher evaluates the block's instruction sequence over a small
//! abstract stack whose values are constants, tracked field reads, and
//! comparison results. Anything it does not recognise degrades to an unknown
//! value, which contributes no refinement: the engine widens rather than
//! guesses. In particular the `switch`/`match` selector is never interpreted.

use std::collections::BTreeSet;

use crate::{
    analysis::lattice::{FieldValue, TrackedField, ValueSet},
    constant::ZERO_ADDRESS_BYTES,
    instruction::{Instruction, Op},
};

/// The place a refinement applies to: the current transaction's field, or a
/// sibling transaction's field read through `gtxn i F`.
///
/// A `gtxn i F` refinement constrains the current transaction's own field
/// only on executions where the current transaction sits at group index `i`;
/// the transfer function resolves that against the in-state's `GroupIndex`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKey {
    /// The current transaction's field.
    Txn(TrackedField),

    /// A field of the group transaction at a literal index.
    Gtxn(u64, TrackedField),
}

/// A conjunction of per-key constraints.
pub type Constraints = Vec<(FieldKey, ValueSet)>;

/// The constraints implied by a condition value being non-zero or zero.
#[derive(Clone, Debug, Default)]
pub struct Condition {
    /// Constraints that hold when the condition is non-zero.
    pub when_true: Constraints,

    /// Constraints that hold when the condition is zero.
    pub when_false: Constraints,
}

/// The refinements a conditional branch imposes on its two outgoing edges.
#[derive(Clone, Debug, Default)]
pub struct BranchConstraints {
    /// Constraints in force along the branch-taken edge.
    pub taken: Constraints,

    /// Constraints in force along the branch-not-taken edge.
    pub not_taken: Constraints,
}

/// Everything the dataflow transfer function needs to know about a block.
#[derive(Clone, Debug, Default)]
pub struct BlockSummary {
    /// Constraints established inside the block (asserts, and returns whose
    /// value is a recognised comparison).
    pub refinements: Constraints,

    /// Whether the block unconditionally rejects: it ends in `err` or
    /// returns the constant zero.
    pub rejects: bool,

    /// The edge-splitting constraints of a trailing `bz`/`bnz`.
    pub branch: Option<BranchConstraints>,
}

/// One abstract stack slot.
#[derive(Clone, Debug)]
enum AbstractValue {
    Uint(u64),
    Bytes(Vec<u8>),
    Field(FieldKey),
    Cond(Condition),
    Unknown,
}

/// Summarises the effect of a block's instructions on the tracked fields.
#[must_use]
pub fn summarize(instructions: &[Instruction], cap: usize) -> BlockSummary {
    let mut summary = BlockSummary::default();
    let mut stack: Vec<AbstractValue> = vec![];
    let pop = |stack: &mut Vec<AbstractValue>| stack.pop().unwrap_or(AbstractValue::Unknown);

    for instruction in instructions {
        match instruction.op() {
            Op::Int { value } | Op::PushInt { value } => stack.push(AbstractValue::Uint(*value)),
            Op::Byte { data } | Op::PushBytes { data } => {
                stack.push(AbstractValue::Bytes(data.clone()));
            }
            Op::Txn { field } => stack.push(field_value(None, *field)),
            Op::Gtxn { group_index, field } => {
                stack.push(field_value(Some(*group_index), *field));
            }
            Op::Global { field } => {
                if let Some(tracked) = TrackedField::from_global_field(*field) {
                    stack.push(AbstractValue::Field(FieldKey::Txn(tracked)));
                } else if *field == crate::instruction::GlobalField::ZeroAddress {
                    stack.push(AbstractValue::Bytes(ZERO_ADDRESS_BYTES.to_vec()));
                } else {
                    stack.push(AbstractValue::Unknown);
                }
            }

            Op::Eq => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                stack.push(equality(&lhs, &rhs, cap, false));
            }
            Op::Neq => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                stack.push(equality(&lhs, &rhs, cap, true));
            }
            Op::Lt | Op::Gt | Op::Le | Op::Ge => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                stack.push(ordering(instruction.op(), &lhs, &rhs, cap));
            }

            Op::And => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                stack.push(conjunction(&lhs, &rhs));
            }
            Op::Or => {
                let rhs = pop(&mut stack);
                let lhs = pop(&mut stack);
                stack.push(disjunction(&lhs, &rhs));
            }
            Op::Not => {
                let value = pop(&mut stack);
                stack.push(negation(&value));
            }

            Op::Assert => {
                if let AbstractValue::Cond(condition) = pop(&mut stack) {
                    summary.refinements.extend(condition.when_true);
                }
            }
            Op::Return => match pop(&mut stack) {
                AbstractValue::Uint(0) => summary.rejects = true,
                AbstractValue::Cond(condition) => {
                    // Approval requires the returned comparison to be
                    // non-zero, so its true-side constraints hold on every
                    // approving execution through this block.
                    summary.refinements.extend(condition.when_true);
                }
                _ => {}
            },
            Op::Err => summary.rejects = true,

            Op::BranchNonZero { .. } => {
                if let AbstractValue::Cond(condition) = pop(&mut stack) {
                    summary.branch = Some(BranchConstraints {
                        taken:     condition.when_true,
                        not_taken: condition.when_false,
                    });
                }
            }
            Op::BranchZero { .. } => {
                if let AbstractValue::Cond(condition) = pop(&mut stack) {
                    summary.branch = Some(BranchConstraints {
                        taken:     condition.when_false,
                        not_taken: condition.when_true,
                    });
                }
            }

            Op::Dup => {
                let value = pop(&mut stack);
                stack.push(value.clone());
                stack.push(value);
            }
            Op::Swap => {
                let a = pop(&mut stack);
                let b = pop(&mut stack);
                stack.push(a);
                stack.push(b);
            }
            Op::Pop => {
                let _ = pop(&mut stack);
            }

            op => {
                // Generic stack effect: consume and produce unknowns.
                let signature = op.stack_signature();
                for _ in 0..signature.pops {
                    let _ = pop(&mut stack);
                }
                for _ in 0..signature.pushes {
                    stack.push(AbstractValue::Unknown);
                }
            }
        }
    }

    summary
}

/// Produces the stack value of a tracked field read, or unknown for fields
/// outside the tracked set.
fn field_value(
    group_index: Option<u64>,
    field: crate::instruction::TransactionField,
) -> AbstractValue {
    let Some(tracked) = TrackedField::from_transaction_field(field) else {
        return AbstractValue::Unknown;
    };
    let key = match group_index {
        Some(index) => FieldKey::Gtxn(index, tracked),
        None => FieldKey::Txn(tracked),
    };
    AbstractValue::Field(key)
}

/// The constant a stack slot holds, if it holds one.
fn constant(value: &AbstractValue) -> Option<FieldValue> {
    match value {
        AbstractValue::Uint(v) => Some(FieldValue::Uint(*v)),
        AbstractValue::Bytes(data) => Some(FieldValue::Bytes(data.clone())),
        _ => None,
    }
}

/// The complement of `{value}` for `field`, enumerated against the field's
/// finite universe where it has one and ⊤ otherwise.
fn complement(field: TrackedField, value: &FieldValue, cap: usize) -> ValueSet {
    let Some(universe) = field.universe() else {
        return ValueSet::Top;
    };
    let rest: BTreeSet<FieldValue> = universe
        .map(FieldValue::Uint)
        .filter(|candidate| candidate != value)
        .collect();
    ValueSet::from_values(rest, cap)
}

/// Builds the condition for `field == constant` (or its negation).
fn equality(lhs: &AbstractValue, rhs: &AbstractValue, cap: usize, negated: bool) -> AbstractValue {
    let (key, value) = match (lhs, rhs) {
        (AbstractValue::Field(key), other) | (other, AbstractValue::Field(key)) => {
            match constant(other) {
                Some(value) => (*key, value),
                None => return AbstractValue::Unknown,
            }
        }
        _ => return AbstractValue::Unknown,
    };

    let field = match key {
        FieldKey::Txn(field) | FieldKey::Gtxn(_, field) => field,
    };
    let equal = ValueSet::singleton(value.clone());
    let unequal = complement(field, &value, cap);

    let condition = if negated {
        Condition {
            when_true:  vec![(key, unequal)],
            when_false: vec![(key, equal)],
        }
    } else {
        Condition {
            when_true:  vec![(key, equal)],
            when_false: vec![(key, unequal)],
        }
    };
    AbstractValue::Cond(condition)
}

/// Builds the condition for an ordering comparison of a field against an
/// integer constant, enumerating the satisfying values where they stay
/// within the cap and widening to ⊤ otherwise.
fn ordering(op: &Op, lhs: &AbstractValue, rhs: &AbstractValue, cap: usize) -> AbstractValue {
    // Normalise to `field OP constant`, flipping the operator when the
    // constant is on the left.
    let (key, bound, flipped) = match (lhs, rhs) {
        (AbstractValue::Field(key), AbstractValue::Uint(bound)) => (*key, *bound, false),
        (AbstractValue::Uint(bound), AbstractValue::Field(key)) => (*key, *bound, true),
        _ => return AbstractValue::Unknown,
    };
    let field = match key {
        FieldKey::Txn(field) | FieldKey::Gtxn(_, field) => field,
    };

    let holds: fn(u64, u64) -> bool = match (op, flipped) {
        (Op::Lt, false) | (Op::Gt, true) => |v, b| v < b,
        (Op::Gt, false) | (Op::Lt, true) => |v, b| v > b,
        (Op::Le, false) | (Op::Ge, true) => |v, b| v <= b,
        (Op::Ge, false) | (Op::Le, true) => |v, b| v >= b,
        _ => return AbstractValue::Unknown,
    };

    // Enumerate against the field's universe when it has one, and against
    // the value range below the bound otherwise. A satisfying set that
    // cannot be enumerated within the cap stays ⊤.
    let candidates: Vec<u64> = match field.universe() {
        Some(universe) => universe.collect(),
        None => {
            let reach = bound.saturating_add(1);
            if reach > cap as u64 {
                vec![]
            } else {
                (0..=bound).collect()
            }
        }
    };
    if candidates.is_empty() {
        return AbstractValue::Unknown;
    }

    let satisfied: BTreeSet<FieldValue> = candidates
        .iter()
        .filter(|v| holds(**v, bound))
        .map(|v| FieldValue::Uint(*v))
        .collect();
    let refuted: BTreeSet<FieldValue> = candidates
        .iter()
        .filter(|v| !holds(**v, bound))
        .map(|v| FieldValue::Uint(*v))
        .collect();

    // Without a finite universe only the satisfying side is complete; the
    // refuted side is unbounded above.
    let when_false = if field.universe().is_some() {
        ValueSet::from_values(refuted, cap)
    } else {
        ValueSet::Top
    };

    AbstractValue::Cond(Condition {
        when_true:  vec![(key, ValueSet::from_values(satisfied, cap))],
        when_false: vec![(key, when_false)],
    })
}

/// Meets the constraints of two lists key-wise; keys present in only one
/// list pass through.
fn meet_constraints(a: &Constraints, b: &Constraints) -> Constraints {
    let mut merged = a.clone();
    merged.extend(b.iter().cloned());
    merged
}

/// Joins the constraints of two lists key-wise; a key missing from either
/// side is unconstrained there, so it drops out entirely.
fn join_constraints(a: &Constraints, b: &Constraints) -> Constraints {
    let mut joined = vec![];
    for (key, left) in a {
        for (other, right) in b {
            if key == other {
                // Either side may hold, so the union is all we know. The
                // join here never widens past ⊤, so the cap is irrelevant.
                joined.push((*key, left.join(right, usize::MAX)));
            }
        }
    }
    joined
}

/// `a && b`: both hold when true; at least one fails when false.
fn conjunction(lhs: &AbstractValue, rhs: &AbstractValue) -> AbstractValue {
    match (lhs, rhs) {
        (AbstractValue::Cond(a), AbstractValue::Cond(b)) => AbstractValue::Cond(Condition {
            when_true:  meet_constraints(&a.when_true, &b.when_true),
            when_false: join_constraints(&a.when_false, &b.when_false),
        }),
        // An unknown conjunct can be the failing one, so the false side
        // learns nothing; the known conjunct must still hold when true.
        (AbstractValue::Cond(known), _) | (_, AbstractValue::Cond(known)) => {
            AbstractValue::Cond(Condition {
                when_true:  known.when_true.clone(),
                when_false: vec![],
            })
        }
        _ => AbstractValue::Unknown,
    }
}

/// `a || b`: at least one holds when true; both fail when false.
fn disjunction(lhs: &AbstractValue, rhs: &AbstractValue) -> AbstractValue {
    match (lhs, rhs) {
        (AbstractValue::Cond(a), AbstractValue::Cond(b)) => AbstractValue::Cond(Condition {
            when_true:  join_constraints(&a.when_true, &b.when_true),
            when_false: meet_constraints(&a.when_false, &b.when_false),
        }),
        // An unknown disjunct can be the holding one, so the true side
        // learns nothing; the known disjunct must still fail when false.
        (AbstractValue::Cond(known), _) | (_, AbstractValue::Cond(known)) => {
            AbstractValue::Cond(Condition {
                when_true:  vec![],
                when_false: known.when_false.clone(),
            })
        }
        _ => AbstractValue::Unknown,
    }
}

fn negation(value: &AbstractValue) -> AbstractValue {
    match value {
        AbstractValue::Cond(condition) => AbstractValue::Cond(Condition {
            when_true:  condition.when_false.clone(),
            when_false: condition.when_true.clone(),
        }),
        _ => AbstractValue::Unknown,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parser, program::Source};

    fn summary_of(text: &str) -> BlockSummary {
        let program = parser::parse(&Source::new("test.teal", text)).unwrap();
        summarize(program.instructions(), 16)
    }

    fn uint_set(values: &[u64]) -> ValueSet {
        ValueSet::Values(values.iter().map(|v| FieldValue::Uint(*v)).collect())
    }

    #[test]
    fn recognises_compare_and_assert() {
        let summary = summary_of("#pragma version 3\nglobal GroupSize\nint 2\n==\nassert\n");
        assert_eq!(
            summary.refinements,
            vec![(FieldKey::Txn(TrackedField::GroupSize), uint_set(&[2]))]
        );
        assert!(!summary.rejects);
    }

    #[test]
    fn recognises_constant_zero_return() {
        let summary = summary_of("#pragma version 3\nint 0\nreturn\n");
        assert!(summary.rejects);

        let summary = summary_of("#pragma version 3\nint 1\nreturn\n");
        assert!(!summary.rejects);
    }

    #[test]
    fn branch_splits_refinements_across_edges() {
        let summary = summary_of(
            "#pragma version 3\ntxn OnCompletion\nint DeleteApplication\n==\nbnz del\nint 1\nreturn\ndel:\nint 0\nreturn\n",
        );
        let branch = summary.branch.expect("branch should be recognised");
        assert_eq!(
            branch.taken,
            vec![(FieldKey::Txn(TrackedField::OnCompletion), uint_set(&[5]))]
        );
        assert_eq!(
            branch.not_taken,
            vec![(
                FieldKey::Txn(TrackedField::OnCompletion),
                uint_set(&[0, 1, 2, 3, 4])
            )]
        );
    }

    #[test]
    fn zero_address_comparison_refines_address_fields() {
        let summary = summary_of(
            "#pragma version 3\ntxn RekeyTo\nglobal ZeroAddress\n==\nassert\n",
        );
        assert_eq!(summary.refinements.len(), 1);
        let (key, values) = &summary.refinements[0];
        assert_eq!(*key, FieldKey::Txn(TrackedField::RekeyTo));
        assert_eq!(
            *values,
            ValueSet::singleton(FieldValue::Bytes(ZERO_ADDRESS_BYTES.to_vec()))
        );
    }

    #[test]
    fn disjunction_unions_true_sides() {
        let summary = summary_of(
            "#pragma version 3\nglobal GroupSize\nint 2\n==\nglobal GroupSize\nint 4\n==\n||\nassert\n",
        );
        assert_eq!(
            summary.refinements,
            vec![(FieldKey::Txn(TrackedField::GroupSize), uint_set(&[2, 4]))]
        );
    }

    #[test]
    fn ordering_enumerates_small_intervals() {
        let summary = summary_of("#pragma version 3\ntxn GroupIndex\nint 2\n<\nassert\n");
        assert_eq!(
            summary.refinements,
            vec![(FieldKey::Txn(TrackedField::GroupIndex), uint_set(&[0, 1]))]
        );
    }

    #[test]
    fn large_fee_bounds_widen_to_top() {
        let summary = summary_of("#pragma version 3\ntxn Fee\nint 100000\n<=\nassert\n");
        assert!(summary.refinements.is_empty());
    }

    #[test]
    fn sibling_transaction_reads_use_group_keys() {
        let summary = summary_of("#pragma version 3\ngtxn 0 Sender\nbyte 0xff\n==\nassert\n");
        let (key, _) = &summary.refinements[0];
        assert_eq!(*key, FieldKey::Gtxn(0, TrackedField::Sender));
    }
}
