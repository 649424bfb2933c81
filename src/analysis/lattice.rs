//! This module contains the value lattice the dataflow engine computes over:
//! per tracked field, either ⊥ (unreachable), a finite enumerated set of
//! values, or ⊤ (unconstrained).

use std::{collections::BTreeSet, fmt, ops::RangeInclusive};

use crate::{
    constant::{
        GROUP_INDEX_UNIVERSE,
        GROUP_SIZE_UNIVERSE,
        ON_COMPLETION_UNIVERSE,
        TYPE_ENUM_UNIVERSE,
    },
    instruction::{GlobalField, TransactionField},
};

/// The closed set of transaction-context fields the engine tracks.
///
/// Any other field is reported as ⊤ and never materialised in the state.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TrackedField {
    GroupSize,
    GroupIndex,
    TypeEnum,
    Sender,
    Receiver,
    CloseRemainderTo,
    AssetCloseTo,
    RekeyTo,
    ApplicationId,
    OnCompletion,
    Fee,
}

impl TrackedField {
    /// The number of tracked fields.
    pub const COUNT: usize = 11;
    /// All tracked fields, in state-slot order.
    pub const ALL: [TrackedField; Self::COUNT] = [
        TrackedField::GroupSize,
        TrackedField::GroupIndex,
        TrackedField::TypeEnum,
        TrackedField::Sender,
        TrackedField::Receiver,
        TrackedField::CloseRemainderTo,
        TrackedField::AssetCloseTo,
        TrackedField::RekeyTo,
        TrackedField::ApplicationId,
        TrackedField::OnCompletion,
        TrackedField::Fee,
    ];

    /// The slot this field occupies in a [`FieldState`].
    #[must_use]
    pub fn slot(self) -> usize {
        use TrackedField::*;
        match self {
            GroupSize => 0,
            GroupIndex => 1,
            TypeEnum => 2,
            Sender => 3,
            Receiver => 4,
            CloseRemainderTo => 5,
            AssetCloseTo => 6,
            RekeyTo => 7,
            ApplicationId => 8,
            OnCompletion => 9,
            Fee => 10,
        }
    }

    /// The finite numeric universe of the field, where one exists.
    ///
    /// Complements (for `!=` and the refuted side of a branch) are only
    /// enumerable against a finite universe; fields without one widen to ⊤
    /// instead.
    #[must_use]
    pub fn universe(self) -> Option<RangeInclusive<u64>> {
        use TrackedField::*;
        match self {
            GroupSize => Some(GROUP_SIZE_UNIVERSE),
            GroupIndex => Some(GROUP_INDEX_UNIVERSE),
            TypeEnum => Some(TYPE_ENUM_UNIVERSE),
            OnCompletion => Some(ON_COMPLETION_UNIVERSE),
            _ => None,
        }
    }

    /// Maps a transaction field onto its tracked counterpart, if it has one.
    #[must_use]
    pub fn from_transaction_field(field: TransactionField) -> Option<Self> {
        let tracked = match field {
            TransactionField::GroupIndex => TrackedField::GroupIndex,
            TransactionField::TypeEnum => TrackedField::TypeEnum,
            TransactionField::Sender => TrackedField::Sender,
            TransactionField::Receiver => TrackedField::Receiver,
            TransactionField::CloseRemainderTo => TrackedField::CloseRemainderTo,
            TransactionField::AssetCloseTo => TrackedField::AssetCloseTo,
            TransactionField::RekeyTo => TrackedField::RekeyTo,
            TransactionField::ApplicationId => TrackedField::ApplicationId,
            TransactionField::OnCompletion => TrackedField::OnCompletion,
            TransactionField::Fee => TrackedField::Fee,
            _ => return None,
        };
        Some(tracked)
    }

    /// Maps a global field onto its tracked counterpart, if it has one.
    #[must_use]
    pub fn from_global_field(field: GlobalField) -> Option<Self> {
        match field {
            GlobalField::GroupSize => Some(TrackedField::GroupSize),
            _ => None,
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackedField::GroupSize => "GroupSize",
            TrackedField::GroupIndex => "GroupIndex",
            TrackedField::TypeEnum => "TypeEnum",
            TrackedField::Sender => "Sender",
            TrackedField::Receiver => "Receiver",
            TrackedField::CloseRemainderTo => "CloseRemainderTo",
            TrackedField::AssetCloseTo => "AssetCloseTo",
            TrackedField::RekeyTo => "RekeyTo",
            TrackedField::ApplicationId => "ApplicationID",
            TrackedField::OnCompletion => "OnCompletion",
            TrackedField::Fee => "Fee",
        };
        write!(f, "{name}")
    }
}

/// A single concrete value a tracked field can take.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldValue {
    /// An integer-valued field.
    Uint(u64),

    /// A byte-string valued field, addresses included.
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Uint(value) => write!(f, "{value}"),
            FieldValue::Bytes(data) => write!(f, "0x{}", hex::encode(data)),
        }
    }
}

/// The lattice of values a tracked field can take at a point: ⊥ < finite set
/// < ⊤.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValueSet {
    /// The point is unreachable under the current constraints.
    Bottom,

    /// The field takes one of finitely many values. The set is non-empty;
    /// an empty enumeration normalises to [`ValueSet::Bottom`].
    Values(BTreeSet<FieldValue>),

    /// Any value is possible.
    Top,
}

impl ValueSet {
    /// The set containing exactly `value`.
    #[must_use]
    pub fn singleton(value: FieldValue) -> Self {
        let mut values = BTreeSet::new();
        values.insert(value);
        ValueSet::Values(values)
    }

    /// Builds a set from `values`, normalising empty to ⊥ and capping at
    /// `cap` members (overflow widens to ⊤).
    #[must_use]
    pub fn from_values(values: BTreeSet<FieldValue>, cap: usize) -> Self {
        if values.is_empty() {
            ValueSet::Bottom
        } else if values.len() > cap {
            ValueSet::Top
        } else {
            ValueSet::Values(values)
        }
    }

    /// Whether the set is ⊤.
    #[must_use]
    pub fn is_top(&self) -> bool {
        matches!(self, ValueSet::Top)
    }

    /// Whether the set is ⊥.
    #[must_use]
    pub fn is_bottom(&self) -> bool {
        matches!(self, ValueSet::Bottom)
    }

    /// The single member of the set, if it has exactly one.
    #[must_use]
    pub fn as_singleton(&self) -> Option<&FieldValue> {
        match self {
            ValueSet::Values(values) if values.len() == 1 => values.iter().next(),
            _ => None,
        }
    }

    /// Whether `value` is a possible member: ⊤ admits everything, ⊥ nothing.
    #[must_use]
    pub fn may_contain(&self, value: &FieldValue) -> bool {
        match self {
            ValueSet::Bottom => false,
            ValueSet::Values(values) => values.contains(value),
            ValueSet::Top => true,
        }
    }

    /// The join (union) of two sets, capping enumeration at `cap`.
    #[must_use]
    pub fn join(&self, other: &ValueSet, cap: usize) -> ValueSet {
        match (self, other) {
            (ValueSet::Bottom, v) | (v, ValueSet::Bottom) => v.clone(),
            (ValueSet::Top, _) | (_, ValueSet::Top) => ValueSet::Top,
            (ValueSet::Values(a), ValueSet::Values(b)) => {
                let union: BTreeSet<FieldValue> = a.union(b).cloned().collect();
                ValueSet::from_values(union, cap)
            }
        }
    }

    /// The meet (intersection) of two sets. An empty intersection is ⊥.
    #[must_use]
    pub fn meet(&self, other: &ValueSet) -> ValueSet {
        match (self, other) {
            (ValueSet::Bottom, _) | (_, ValueSet::Bottom) => ValueSet::Bottom,
            (ValueSet::Top, v) | (v, ValueSet::Top) => v.clone(),
            (ValueSet::Values(a), ValueSet::Values(b)) => {
                let intersection: BTreeSet<FieldValue> = a.intersection(b).cloned().collect();
                if intersection.is_empty() {
                    ValueSet::Bottom
                } else {
                    ValueSet::Values(intersection)
                }
            }
        }
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSet::Bottom => write!(f, "⊥"),
            ValueSet::Top => write!(f, "⊤"),
            ValueSet::Values(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

/// The dataflow state at a point: one [`ValueSet`] per tracked field, held in
/// a dense array indexed by [`TrackedField::slot`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldState {
    sets: [ValueSet; TrackedField::COUNT],
}

impl FieldState {
    /// The state where every field is unconstrained.
    #[must_use]
    pub fn top() -> Self {
        Self {
            sets: std::array::from_fn(|_| ValueSet::Top),
        }
    }

    /// The state of an unreachable point.
    #[must_use]
    pub fn bottom() -> Self {
        Self {
            sets: std::array::from_fn(|_| ValueSet::Bottom),
        }
    }

    /// Whether every field is ⊥, i.e. the point is unreachable.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        self.sets.iter().all(ValueSet::is_bottom)
    }

    /// The set for `field`.
    #[must_use]
    pub fn get(&self, field: TrackedField) -> &ValueSet {
        &self.sets[field.slot()]
    }

    /// Replaces the set for `field`.
    pub fn set(&mut self, field: TrackedField, values: ValueSet) {
        self.sets[field.slot()] = values;
    }

    /// Meets the set for `field` with `constraint` in place.
    pub fn refine(&mut self, field: TrackedField, constraint: &ValueSet) {
        let refined = self.sets[field.slot()].meet(constraint);
        self.sets[field.slot()] = refined;
    }

    /// The field-wise join of two states, capping enumeration at `cap`.
    #[must_use]
    pub fn join(&self, other: &FieldState, cap: usize) -> FieldState {
        let sets =
            std::array::from_fn(|slot| self.sets[slot].join(&other.sets[slot], cap));
        FieldState { sets }
    }
}

impl Default for FieldState {
    fn default() -> Self {
        Self::top()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn uints(values: &[u64]) -> ValueSet {
        ValueSet::Values(values.iter().map(|v| FieldValue::Uint(*v)).collect())
    }

    #[test]
    fn join_is_union_with_cap() {
        let a = uints(&[1, 2]);
        let b = uints(&[3]);
        assert_eq!(a.join(&b, 16), uints(&[1, 2, 3]));
        assert_eq!(a.join(&b, 2), ValueSet::Top);
        assert_eq!(a.join(&ValueSet::Bottom, 16), a);
        assert_eq!(a.join(&ValueSet::Top, 16), ValueSet::Top);
    }

    #[test]
    fn meet_is_intersection_with_bottom_normalisation() {
        let a = uints(&[1, 2]);
        let b = uints(&[2, 3]);
        assert_eq!(a.meet(&b), uints(&[2]));
        assert_eq!(a.meet(&uints(&[9])), ValueSet::Bottom);
        assert_eq!(a.meet(&ValueSet::Top), a);
        assert_eq!(a.meet(&ValueSet::Bottom), ValueSet::Bottom);
    }

    #[test]
    fn lattice_order_holds_through_join() {
        // Adding a predecessor can only widen the joined state.
        let narrow = uints(&[4]);
        let wide = narrow.join(&uints(&[5]), 16);
        match (&narrow, &wide) {
            (ValueSet::Values(n), ValueSet::Values(w)) => {
                assert!(n.is_subset(w));
            }
            _ => panic!("expected enumerated sets"),
        }
    }

    #[test]
    fn state_refinement_meets_in_place() {
        let mut state = FieldState::top();
        state.refine(TrackedField::GroupSize, &uints(&[2, 4]));
        assert_eq!(state.get(TrackedField::GroupSize), &uints(&[2, 4]));
        state.refine(TrackedField::GroupSize, &uints(&[4]));
        assert_eq!(state.get(TrackedField::GroupSize), &uints(&[4]));
        assert_eq!(state.get(TrackedField::Fee), &ValueSet::Top);
    }
}
