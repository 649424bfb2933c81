//! This module contains the catalogue of fields that can be read through the
//! `global` opcode.

use std::{fmt, str::FromStr};

use crate::error::parsing::ErrorKind;

/// A field of the global execution environment.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum GlobalField {
    MinTxnFee,
    MinBalance,
    MaxTxnLife,
    ZeroAddress,
    GroupSize,
    LogicSigVersion,
    Round,
    LatestTimestamp,
    CurrentApplicationId,
    CreatorAddress,
    CurrentApplicationAddress,
    GroupId,
    OpcodeBudget,
    CallerApplicationId,
    CallerApplicationAddress,
}

impl GlobalField {
    /// The program version this field is supported from.
    #[must_use]
    pub fn introduced_in(&self) -> u8 {
        use GlobalField::*;
        match self {
            MinTxnFee | MinBalance | MaxTxnLife | ZeroAddress | GroupSize => 1,
            LogicSigVersion | Round | LatestTimestamp | CurrentApplicationId => 2,
            CreatorAddress => 3,
            CurrentApplicationAddress | GroupId => 5,
            OpcodeBudget | CallerApplicationId | CallerApplicationAddress => 6,
        }
    }

    /// The canonical source-form name of the field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        use GlobalField::*;
        match self {
            MinTxnFee => "MinTxnFee",
            MinBalance => "MinBalance",
            MaxTxnLife => "MaxTxnLife",
            ZeroAddress => "ZeroAddress",
            GroupSize => "GroupSize",
            LogicSigVersion => "LogicSigVersion",
            Round => "Round",
            LatestTimestamp => "LatestTimestamp",
            CurrentApplicationId => "CurrentApplicationID",
            CreatorAddress => "CreatorAddress",
            CurrentApplicationAddress => "CurrentApplicationAddress",
            GroupId => "GroupID",
            OpcodeBudget => "OpcodeBudget",
            CallerApplicationId => "CallerApplicationID",
            CallerApplicationAddress => "CallerApplicationAddress",
        }
    }
}

impl fmt::Display for GlobalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GlobalField {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use GlobalField::*;
        let field = match s {
            "MinTxnFee" => MinTxnFee,
            "MinBalance" => MinBalance,
            "MaxTxnLife" => MaxTxnLife,
            "ZeroAddress" => ZeroAddress,
            "GroupSize" => GroupSize,
            "LogicSigVersion" => LogicSigVersion,
            "Round" => Round,
            "LatestTimestamp" => LatestTimestamp,
            "CurrentApplicationID" => CurrentApplicationId,
            "CreatorAddress" => CreatorAddress,
            "CurrentApplicationAddress" => CurrentApplicationAddress,
            "GroupID" => GroupId,
            "OpcodeBudget" => OpcodeBudget,
            "CallerApplicationID" => CallerApplicationId,
            "CallerApplicationAddress" => CallerApplicationAddress,
            _ => {
                return Err(ErrorKind::UnknownField {
                    kind: "global",
                    name: s.to_string(),
                })
            }
        };
        Ok(field)
    }
}
