//! This module contains the catalogue of transaction fields that can be read
//! through the `txn` family of opcodes.

use std::{fmt, str::FromStr};

use crate::error::parsing::ErrorKind;

/// A field of the transaction that invoked execution of the program.
///
/// Fields are stamped with the program version that introduced them so the
/// parser can reject a field that is newer than the program's declared
/// version.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TransactionField {
    Sender,
    Fee,
    FirstValid,
    FirstValidTime,
    LastValid,
    Note,
    Lease,
    Receiver,
    Amount,
    CloseRemainderTo,
    VotePk,
    SelectionPk,
    VoteFirst,
    VoteLast,
    VoteKeyDilution,
    Type,
    TypeEnum,
    XferAsset,
    AssetAmount,
    AssetSender,
    AssetReceiver,
    AssetCloseTo,
    GroupIndex,
    TxId,
    ApplicationId,
    OnCompletion,
    ApplicationArgs,
    NumAppArgs,
    Accounts,
    NumAccounts,
    ApprovalProgram,
    ClearStateProgram,
    RekeyTo,
    ConfigAsset,
    ConfigAssetTotal,
    ConfigAssetDecimals,
    ConfigAssetDefaultFrozen,
    ConfigAssetUnitName,
    ConfigAssetName,
    ConfigAssetUrl,
    ConfigAssetMetadataHash,
    ConfigAssetManager,
    ConfigAssetReserve,
    ConfigAssetFreeze,
    ConfigAssetClawback,
    FreezeAsset,
    FreezeAssetAccount,
    FreezeAssetFrozen,
    Assets,
    NumAssets,
    Applications,
    NumApplications,
    GlobalNumUint,
    GlobalNumByteSlice,
    LocalNumUint,
    LocalNumByteSlice,
    ExtraProgramPages,
    Nonparticipation,
    Logs,
    NumLogs,
    CreatedAssetId,
    CreatedApplicationId,
    LastLog,
    StateProofPk,
    ApprovalProgramPages,
    NumApprovalProgramPages,
    ClearStateProgramPages,
    NumClearStateProgramPages,
}

impl TransactionField {
    /// The program version this field is supported from.
    #[must_use]
    pub fn introduced_in(&self) -> u8 {
        use TransactionField::*;
        match self {
            Sender | Fee | FirstValid | FirstValidTime | LastValid | Note | Lease | Receiver
            | Amount | CloseRemainderTo | VotePk | SelectionPk | VoteFirst | VoteLast
            | VoteKeyDilution | Type | TypeEnum | XferAsset | AssetAmount | AssetSender
            | AssetReceiver | AssetCloseTo | GroupIndex | TxId => 1,
            ApplicationId | OnCompletion | ApplicationArgs | NumAppArgs | Accounts
            | NumAccounts | ApprovalProgram | ClearStateProgram | RekeyTo | ConfigAsset
            | ConfigAssetTotal | ConfigAssetDecimals | ConfigAssetDefaultFrozen
            | ConfigAssetUnitName | ConfigAssetName | ConfigAssetUrl | ConfigAssetMetadataHash
            | ConfigAssetManager | ConfigAssetReserve | ConfigAssetFreeze | ConfigAssetClawback
            | FreezeAsset | FreezeAssetAccount | FreezeAssetFrozen => 2,
            Assets | NumAssets | Applications | NumApplications | GlobalNumUint
            | GlobalNumByteSlice | LocalNumUint | LocalNumByteSlice => 3,
            ExtraProgramPages => 4,
            Nonparticipation | Logs | NumLogs | CreatedAssetId | CreatedApplicationId => 5,
            LastLog | StateProofPk => 6,
            ApprovalProgramPages | NumApprovalProgramPages | ClearStateProgramPages
            | NumClearStateProgramPages => 7,
        }
    }

    /// Whether the field is an array field, and hence must be read through
    /// the indexed `txna` family rather than plain `txn`.
    #[must_use]
    pub fn is_array(&self) -> bool {
        use TransactionField::*;
        matches!(
            self,
            ApplicationArgs
                | Accounts
                | Assets
                | Applications
                | Logs
                | ApprovalProgramPages
                | ClearStateProgramPages
        )
    }

    /// The canonical source-form name of the field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        use TransactionField::*;
        match self {
            Sender => "Sender",
            Fee => "Fee",
            FirstValid => "FirstValid",
            FirstValidTime => "FirstValidTime",
            LastValid => "LastValid",
            Note => "Note",
            Lease => "Lease",
            Receiver => "Receiver",
            Amount => "Amount",
            CloseRemainderTo => "CloseRemainderTo",
            VotePk => "VotePK",
            SelectionPk => "SelectionPK",
            VoteFirst => "VoteFirst",
            VoteLast => "VoteLast",
            VoteKeyDilution => "VoteKeyDilution",
            Type => "Type",
            TypeEnum => "TypeEnum",
            XferAsset => "XferAsset",
            AssetAmount => "AssetAmount",
            AssetSender => "AssetSender",
            AssetReceiver => "AssetReceiver",
            AssetCloseTo => "AssetCloseTo",
            GroupIndex => "GroupIndex",
            TxId => "TxID",
            ApplicationId => "ApplicationID",
            OnCompletion => "OnCompletion",
            ApplicationArgs => "ApplicationArgs",
            NumAppArgs => "NumAppArgs",
            Accounts => "Accounts",
            NumAccounts => "NumAccounts",
            ApprovalProgram => "ApprovalProgram",
            ClearStateProgram => "ClearStateProgram",
            RekeyTo => "RekeyTo",
            ConfigAsset => "ConfigAsset",
            ConfigAssetTotal => "ConfigAssetTotal",
            ConfigAssetDecimals => "ConfigAssetDecimals",
            ConfigAssetDefaultFrozen => "ConfigAssetDefaultFrozen",
            ConfigAssetUnitName => "ConfigAssetUnitName",
            ConfigAssetName => "ConfigAssetName",
            ConfigAssetUrl => "ConfigAssetURL",
            ConfigAssetMetadataHash => "ConfigAssetMetadataHash",
            ConfigAssetManager => "ConfigAssetManager",
            ConfigAssetReserve => "ConfigAssetReserve",
            ConfigAssetFreeze => "ConfigAssetFreeze",
            ConfigAssetClawback => "ConfigAssetClawback",
            FreezeAsset => "FreezeAsset",
            FreezeAssetAccount => "FreezeAssetAccount",
            FreezeAssetFrozen => "FreezeAssetFrozen",
            Assets => "Assets",
            NumAssets => "NumAssets",
            Applications => "Applications",
            NumApplications => "NumApplications",
            GlobalNumUint => "GlobalNumUint",
            GlobalNumByteSlice => "GlobalNumByteSlice",
            LocalNumUint => "LocalNumUint",
            LocalNumByteSlice => "LocalNumByteSlice",
            ExtraProgramPages => "ExtraProgramPages",
            Nonparticipation => "Nonparticipation",
            Logs => "Logs",
            NumLogs => "NumLogs",
            CreatedAssetId => "CreatedAssetID",
            CreatedApplicationId => "CreatedApplicationID",
            LastLog => "LastLog",
            StateProofPk => "StateProofPK",
            ApprovalProgramPages => "ApprovalProgramPages",
            NumApprovalProgramPages => "NumApprovalProgramPages",
            ClearStateProgramPages => "ClearStateProgramPages",
            NumClearStateProgramPages => "NumClearStateProgramPages",
        }
    }
}

impl fmt::Display for TransactionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TransactionField {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use TransactionField::*;
        let field = match s {
            "Sender" => Sender,
            "Fee" => Fee,
            "FirstValid" => FirstValid,
            "FirstValidTime" => FirstValidTime,
            "LastValid" => LastValid,
            "Note" => Note,
            "Lease" => Lease,
            "Receiver" => Receiver,
            "Amount" => Amount,
            "CloseRemainderTo" => CloseRemainderTo,
            "VotePK" => VotePk,
            "SelectionPK" => SelectionPk,
            "VoteFirst" => VoteFirst,
            "VoteLast" => VoteLast,
            "VoteKeyDilution" => VoteKeyDilution,
            "Type" => Type,
            "TypeEnum" => TypeEnum,
            "XferAsset" => XferAsset,
            "AssetAmount" => AssetAmount,
            "AssetSender" => AssetSender,
            "AssetReceiver" => AssetReceiver,
            "AssetCloseTo" => AssetCloseTo,
            "GroupIndex" => GroupIndex,
            "TxID" => TxId,
            "ApplicationID" => ApplicationId,
            "OnCompletion" => OnCompletion,
            "ApplicationArgs" => ApplicationArgs,
            "NumAppArgs" => NumAppArgs,
            "Accounts" => Accounts,
            "NumAccounts" => NumAccounts,
            "ApprovalProgram" => ApprovalProgram,
            "ClearStateProgram" => ClearStateProgram,
            "RekeyTo" => RekeyTo,
            "ConfigAsset" => ConfigAsset,
            "ConfigAssetTotal" => ConfigAssetTotal,
            "ConfigAssetDecimals" => ConfigAssetDecimals,
            "ConfigAssetDefaultFrozen" => ConfigAssetDefaultFrozen,
            "ConfigAssetUnitName" => ConfigAssetUnitName,
            "ConfigAssetName" => ConfigAssetName,
            "ConfigAssetURL" => ConfigAssetUrl,
            "ConfigAssetMetadataHash" => ConfigAssetMetadataHash,
            "ConfigAssetManager" => ConfigAssetManager,
            "ConfigAssetReserve" => ConfigAssetReserve,
            "ConfigAssetFreeze" => ConfigAssetFreeze,
            "ConfigAssetClawback" => ConfigAssetClawback,
            "FreezeAsset" => FreezeAsset,
            "FreezeAssetAccount" => FreezeAssetAccount,
            "FreezeAssetFrozen" => FreezeAssetFrozen,
            "Assets" => Assets,
            "NumAssets" => NumAssets,
            "Applications" => Applications,
            "NumApplications" => NumApplications,
            "GlobalNumUint" => GlobalNumUint,
            "GlobalNumByteSlice" => GlobalNumByteSlice,
            "LocalNumUint" => LocalNumUint,
            "LocalNumByteSlice" => LocalNumByteSlice,
            "ExtraProgramPages" => ExtraProgramPages,
            "Nonparticipation" => Nonparticipation,
            "Logs" => Logs,
            "NumLogs" => NumLogs,
            "CreatedAssetID" => CreatedAssetId,
            "CreatedApplicationID" => CreatedApplicationId,
            "LastLog" => LastLog,
            "StateProofPK" => StateProofPk,
            "ApprovalProgramPages" => ApprovalProgramPages,
            "NumApprovalProgramPages" => NumApprovalProgramPages,
            "ClearStateProgramPages" => ClearStateProgramPages,
            "NumClearStateProgramPages" => NumClearStateProgramPages,
            _ => {
                return Err(ErrorKind::UnknownField {
                    kind: "transaction",
                    name: s.to_string(),
                })
            }
        };
        Ok(field)
    }
}
