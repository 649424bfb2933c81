//! This module contains constants that are needed throughout the codebase.

use std::ops::RangeInclusive;

/// The maximum number of transactions that can form an atomic group on the
/// ledger.
pub const MAX_GROUP_SIZE: u64 = 16;

/// The default cap on the size of an enumerated value set in the dataflow
/// lattice.
///
/// A set that would grow beyond this many members is widened to ⊤ instead of
/// being materialised.
pub const DEFAULT_VALUE_SET_CAP: usize = 16;

/// The highest program version the instruction catalogue covers.
pub const MAX_SUPPORTED_VERSION: u8 = 8;

/// The program version assumed when a program carries no `#pragma version`
/// directive.
pub const DEFAULT_PROGRAM_VERSION: u8 = 1;

/// The number of bytes in a decoded account address.
pub const ADDRESS_LENGTH: usize = 32;

/// The all-zero account address, used by contracts to assert that
/// address-valued transaction fields are unset.
pub const ZERO_ADDRESS_BYTES: [u8; ADDRESS_LENGTH] = [0; ADDRESS_LENGTH];

/// The number of bytes in a `method` pseudo-op selector.
pub const METHOD_SELECTOR_LENGTH: usize = 4;

/// The numeric universe of the `OnCompletion` transaction field.
pub const ON_COMPLETION_UNIVERSE: RangeInclusive<u64> = 0..=5;

/// The `OnCompletion` value of an `UpdateApplication` call.
pub const ON_COMPLETION_UPDATE_APPLICATION: u64 = 4;

/// The `OnCompletion` value of a `DeleteApplication` call.
pub const ON_COMPLETION_DELETE_APPLICATION: u64 = 5;

/// The numeric universe of the `TypeEnum` transaction field, with `unknown`
/// at zero.
pub const TYPE_ENUM_UNIVERSE: RangeInclusive<u64> = 0..=6;

/// The numeric universe of the `GroupSize` global field.
pub const GROUP_SIZE_UNIVERSE: RangeInclusive<u64> = 1..=MAX_GROUP_SIZE;

/// The numeric universe of the `GroupIndex` transaction field.
pub const GROUP_INDEX_UNIVERSE: RangeInclusive<u64> = 0..=MAX_GROUP_SIZE - 1;
