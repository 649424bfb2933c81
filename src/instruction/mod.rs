//! This module contains the [`Op`] catalogue, with one variant per supported
//! mnemonic of the target language, and the [`Instruction`] record that pairs
//! an opcode with its source position.
//!
//! Each opcode knows the program version that introduced it, its stack
//! signature, and the classification flags (terminator, branch, subroutine
//! call and return) that the CFG builder keys on. Immediates are carried
//! already parsed to their semantic type.

pub mod global_field;
pub mod transaction_field;

use std::fmt;

pub use global_field::GlobalField;
pub use transaction_field::TransactionField;

/// The execution mode a program, opcode, or detector applies to.
///
/// Some opcodes are only valid in one of the two modes, which is what the
/// mode detection pass keys on. Programs are always tagged `Stateful` or
/// `Stateless`, never `Any`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ExecutionMode {
    /// An application with access to global and local state.
    Stateful,

    /// A logic signature authorising a single transaction.
    Stateless,

    /// Valid in both modes.
    Any,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExecutionMode::Stateful => "stateful",
            ExecutionMode::Stateless => "stateless",
            ExecutionMode::Any => "any",
        };
        write!(f, "{text}")
    }
}

/// The number of stack slots an opcode consumes and produces.
///
/// Where an opcode's arity depends on its immediates (`popn`, `dupn`, the
/// constant-block pushes, `match`), the signature is computed from the
/// immediates carried by the variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StackSignature {
    /// Slots popped from the stack.
    pub pops: usize,

    /// Slots pushed onto the stack.
    pub pushes: usize,
}

impl StackSignature {
    /// Creates a signature from the provided arities.
    #[must_use]
    pub fn new(pops: usize, pushes: usize) -> Self {
        Self { pops, pushes }
    }
}

/// An instruction in a program: an opcode paired with the one-based source
/// line it was parsed from.
///
/// Instructions are immutable after parsing. Source lines are unique across a
/// program, which makes them usable as evidence anchors in findings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    line: u32,
    op:   Op,
}

impl Instruction {
    /// Creates a new instruction for `op` at the one-based source `line`.
    #[must_use]
    pub fn new(line: u32, op: Op) -> Self {
        Self { line, op }
    }

    /// The one-based source line the instruction was parsed from.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The opcode, with its parsed immediates.
    #[must_use]
    pub fn op(&self) -> &Op {
        &self.op
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)
    }
}

/// The closed catalogue of opcodes, one variant per supported mnemonic.
///
/// Pseudo-ops that expand to a single instruction (`addr`, `method`) are
/// normalised to their underlying byte push during parsing and do not appear
/// here.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs)] // The variants mirror the language reference directly.
pub enum Op {
    // Control flow
    Err,
    Assert,
    Return,
    Retsub,
    Callsub { target: String },
    Branch { target: String },
    BranchZero { target: String },
    BranchNonZero { target: String },
    Switch { targets: Vec<String> },
    Match { targets: Vec<String> },

    // Constants
    Int { value: u64 },
    PushInt { value: u64 },
    PushInts { values: Vec<u64> },
    IntcBlock { values: Vec<u64> },
    Intc { index: u64 },
    Byte { data: Vec<u8> },
    PushBytes { data: Vec<u8> },
    PushBytess { values: Vec<Vec<u8>> },
    BytecBlock { values: Vec<Vec<u8>> },
    Bytec { index: u64 },

    // Logic-signature arguments
    Arg { index: u64 },
    Args,

    // Transaction and environment access
    Txn { field: TransactionField },
    Txna { field: TransactionField, index: u64 },
    Txnas { field: TransactionField },
    Gtxn { group_index: u64, field: TransactionField },
    Gtxna { group_index: u64, field: TransactionField, index: u64 },
    Gtxnas { group_index: u64, field: TransactionField },
    Gtxns { field: TransactionField },
    Gtxnsa { field: TransactionField, index: u64 },
    Gtxnsas { field: TransactionField },
    Itxn { field: TransactionField },
    Itxna { field: TransactionField, index: u64 },
    Itxnas { field: TransactionField },
    Gitxn { group_index: u64, field: TransactionField },
    Gitxna { group_index: u64, field: TransactionField, index: u64 },
    Gitxnas { group_index: u64, field: TransactionField },
    ItxnBegin,
    ItxnNext,
    ItxnField { field: TransactionField },
    ItxnSubmit,
    Global { field: GlobalField },

    // Scratch space and group scratch access
    Load { slot: u64 },
    Loads,
    Store { slot: u64 },
    Stores,
    Gload { group_index: u64, slot: u64 },
    Gloads { slot: u64 },
    Gloadss,
    Gaid { group_index: u64 },
    Gaids,

    // Integer arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Sqrt,
    Shl,
    Shr,
    Mulw,
    Addw,
    Divw,
    DivModW,
    Expw,
    Bitlen,

    // Comparison
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,

    // Boolean and bitwise logic
    And,
    Or,
    Not,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,

    // Wide byte-array math
    BAdd,
    BSub,
    BMul,
    BDiv,
    BMod,
    BEq,
    BNeq,
    BLt,
    BGt,
    BLe,
    BGe,
    BBitAnd,
    BBitOr,
    BBitXor,
    BBitNot,
    BZero,
    BSqrt,

    // Byte-array manipulation
    Btoi,
    Itob,
    Concat,
    Len,
    Substring { start: u64, end: u64 },
    Substring3,
    Extract { start: u64, length: u64 },
    Extract3,
    ExtractUint16,
    ExtractUint32,
    ExtractUint64,
    GetBit,
    SetBit,
    GetByte,
    SetByte,
    Replace2 { start: u64 },
    Replace3,

    // Cryptographic primitives
    Sha256,
    #[allow(non_camel_case_types)] // Mirrors the mnemonic.
    Sha512_256,
    Keccak256,
    #[allow(non_camel_case_types)] // Mirrors the mnemonic.
    Sha3_256,
    Ed25519Verify,
    Ed25519VerifyBare,
    EcdsaVerify { curve: String },
    EcdsaPkDecompress { curve: String },
    EcdsaPkRecover { curve: String },
    VrfVerify { standard: String },

    // Stack manipulation
    Pop,
    Popn { count: u64 },
    Dup,
    Dup2,
    Dupn { count: u64 },
    Dig { depth: u64 },
    Bury { depth: u64 },
    Cover { depth: u64 },
    Uncover { depth: u64 },
    Swap,
    Select,

    // Subroutine frames
    Proto { args: u64, returns: u64 },
    FrameDig { index: i64 },
    FrameBury { index: i64 },

    // Application state
    AppGlobalGet,
    AppGlobalGetEx,
    AppGlobalPut,
    AppGlobalDel,
    AppLocalGet,
    AppLocalGetEx,
    AppLocalPut,
    AppLocalDel,
    AppOptedIn,
    Balance,
    MinBalance,
    AssetHoldingGet { field: String },
    AssetParamsGet { field: String },
    AppParamsGet { field: String },
    AcctParamsGet { field: String },

    // Boxes
    BoxCreate,
    BoxExtract,
    BoxReplace,
    BoxDel,
    BoxLen,
    BoxGet,
    BoxPut,

    // Miscellaneous
    Log,
    Base64Decode { encoding: String },
    JsonRef { kind: String },
    Block { field: String },
}

impl Op {
    /// The program version this opcode is supported from.
    ///
    /// Where the opcode carries a named field, the effective version is the
    /// maximum of the opcode's own stamp and the field's stamp.
    #[must_use]
    pub fn introduced_in(&self) -> u8 {
        use Op::*;
        let base = match self {
            Err | Sha256 | Keccak256 | Sha512_256 | Ed25519Verify | Add | Sub | Mul | Div
            | Mod | Lt | Gt | Le | Ge | And | Or | Eq | Neq | Not | Len | Itob | Btoi | Mulw
            | BitAnd | BitOr | BitXor | BitNot | IntcBlock { .. } | Intc { .. }
            | BytecBlock { .. } | Bytec { .. } | Arg { .. } | Txn { .. } | Global { .. }
            | Gtxn { .. } | Load { .. } | Store { .. } | BranchNonZero { .. } | Pop | Dup
            | Int { .. } | Byte { .. } => 1,
            Addw | Txna { .. } | Gtxna { .. } | BranchZero { .. } | Branch { .. } | Return
            | Substring { .. } | Substring3 | Concat | Dup2 | Balance | AppOptedIn
            | AppLocalGet | AppLocalGetEx | AppGlobalGet | AppGlobalGetEx | AppLocalPut
            | AppGlobalPut | AppLocalDel | AppGlobalDel | AssetHoldingGet { .. }
            | AssetParamsGet { .. } => 2,
            Assert | Dig { .. } | Swap | Select | MinBalance | PushBytes { .. }
            | PushInt { .. } | Gtxns { .. } | Gtxnsa { .. } | GetBit | SetBit | GetByte
            | SetByte => 3,
            BAdd | BSub | BMul | BDiv | BMod | BEq | BNeq | BLt | BGt | BLe | BGe | BBitAnd
            | BBitOr | BBitXor | BBitNot | BZero | DivModW | Exp | Expw | Shl | Shr | Sqrt
            | Bitlen | Gload { .. } | Gloads { .. } | Gaid { .. } | Gaids
            | Callsub { .. } | Retsub => 4,
            Extract { .. } | Extract3 | ExtractUint16 | ExtractUint32 | ExtractUint64
            | AppParamsGet { .. } | Log | ItxnBegin | ItxnField { .. } | ItxnSubmit
            | Itxn { .. } | Itxna { .. } | Txnas { .. } | Gtxnas { .. } | Gtxnsas { .. }
            | Args | EcdsaVerify { .. } | EcdsaPkDecompress { .. } | EcdsaPkRecover { .. }
            | Loads | Stores | Cover { .. } | Uncover { .. } => 5,
            ItxnNext | Gitxn { .. } | Gitxna { .. } | Gitxnas { .. } | Itxnas { .. }
            | Gloadss | AcctParamsGet { .. } | BSqrt | Divw => 6,
            Base64Decode { .. } | JsonRef { .. } | Ed25519VerifyBare | Sha3_256
            | VrfVerify { .. } | Replace2 { .. } | Replace3 | Block { .. } => 7,
            Switch { .. } | Match { .. } | Bury { .. } | Popn { .. } | Dupn { .. }
            | PushBytess { .. } | PushInts { .. } | Proto { .. } | FrameDig { .. }
            | FrameBury { .. } | BoxCreate | BoxExtract | BoxReplace | BoxDel | BoxLen
            | BoxGet | BoxPut => 8,
        };
        base.max(self.field_version())
    }

    /// The version stamp of the named field carried by the opcode, if any.
    fn field_version(&self) -> u8 {
        use Op::*;
        match self {
            Txn { field }
            | Txna { field, .. }
            | Txnas { field }
            | Gtxn { field, .. }
            | Gtxna { field, .. }
            | Gtxnas { field, .. }
            | Gtxns { field }
            | Gtxnsa { field, .. }
            | Gtxnsas { field } => field.introduced_in(),
            Global { field } => field.introduced_in(),
            _ => 1,
        }
    }

    /// The number of stack slots the opcode pops and pushes.
    #[must_use]
    #[allow(clippy::too_many_lines)] // One arm per arity class reads best.
    pub fn stack_signature(&self) -> StackSignature {
        use Op::*;
        let (pops, pushes) = match self {
            Err | Retsub | Callsub { .. } | Branch { .. } | ItxnBegin | ItxnNext
            | ItxnSubmit | Proto { .. } | IntcBlock { .. } | BytecBlock { .. } => (0, 0),
            Assert | Pop | Store { .. } | BranchZero { .. } | BranchNonZero { .. } | Return
            | Log | FrameBury { .. } | Bury { .. } | ItxnField { .. } | Switch { .. } => (1, 0),
            Stores | AppGlobalPut | BoxPut => (2, 0),
            AppLocalPut => (3, 0),
            AppGlobalDel => (1, 0),
            AppLocalDel => (2, 0),
            Popn { count } => (*count as usize, 0),
            Match { targets } => (targets.len() + 1, 0),

            Int { .. } | PushInt { .. } | Byte { .. } | PushBytes { .. } | Intc { .. }
            | Bytec { .. } | Arg { .. } | Txn { .. } | Txna { .. } | Gtxn { .. }
            | Gtxna { .. } | Itxn { .. } | Itxna { .. } | Gitxn { .. } | Gitxna { .. }
            | Global { .. } | Load { .. } | Gload { .. } | Gaid { .. } | Dig { .. }
            | FrameDig { .. } => (0, 1),
            PushInts { values } => (0, values.len()),
            PushBytess { values } => (0, values.len()),

            Loads | Gloads { .. } | Gaids | Txnas { .. } | Gtxnas { .. } | Itxnas { .. }
            | Gitxnas { .. } | Gtxns { .. } | Gtxnsa { .. } | Not | BitNot | Len | Itob
            | Btoi | Sqrt | Bitlen | BBitNot | BZero | BSqrt | Sha256 | Sha512_256
            | Keccak256 | Sha3_256 | Substring { .. } | Extract { .. } | Balance
            | MinBalance | AppGlobalGet | Base64Decode { .. } | Block { .. } => (1, 1),

            Add | Sub | Mul | Div | Mod | Exp | Shl | Shr | Eq | Neq | Lt | Gt | Le | Ge
            | And | Or | BitAnd | BitOr | BitXor | Concat | BAdd | BSub | BMul | BDiv
            | BMod | BEq | BNeq | BLt | BGt | BLe | BGe | BBitAnd | BBitOr | BBitXor
            | Gloadss | Gtxnsas { .. } | ExtractUint16 | ExtractUint32 | ExtractUint64
            | GetBit | GetByte | Replace2 { .. } | AppLocalGet | AppOptedIn
            | JsonRef { .. } => (2, 1),

            Select | Substring3 | Extract3 | SetBit | SetByte | Replace3 | Ed25519Verify
            | Ed25519VerifyBare | Divw => (3, 1),
            EcdsaVerify { .. } => (5, 1),

            Mulw | Addw | Expw => (2, 2),
            DivModW => (4, 4),
            EcdsaPkDecompress { .. } => (1, 2),
            EcdsaPkRecover { .. } => (4, 2),
            VrfVerify { .. } => (3, 2),

            Dup => (1, 2),
            Dup2 => (2, 4),
            Dupn { count } => (1, 1 + *count as usize),
            Swap => (2, 2),
            Cover { .. } | Uncover { .. } => (0, 0),

            AppGlobalGetEx | AssetHoldingGet { .. } | BoxLen | BoxGet => (1, 2),
            AppLocalGetEx => (3, 2),
            AssetParamsGet { .. } | AppParamsGet { .. } | AcctParamsGet { .. } => (1, 2),
            BoxCreate => (2, 1),
            BoxExtract => (3, 1),
            BoxReplace => (3, 0),
            BoxDel => (1, 1),
            Args => (1, 1),
        };
        StackSignature::new(pops, pushes)
    }

    /// The execution mode the opcode is exclusive to, or
    /// [`ExecutionMode::Any`] when it is valid in both.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        use Op::*;
        match self {
            Arg { .. } | Args => ExecutionMode::Stateless,
            AppGlobalGet | AppGlobalGetEx | AppGlobalPut | AppGlobalDel | AppLocalGet
            | AppLocalGetEx | AppLocalPut | AppLocalDel | AppOptedIn | Balance | MinBalance
            | AssetHoldingGet { .. } | AssetParamsGet { .. } | AppParamsGet { .. }
            | AcctParamsGet { .. } | Log | ItxnBegin | ItxnNext | ItxnField { .. }
            | ItxnSubmit | Itxn { .. } | Itxna { .. } | Itxnas { .. } | Gitxn { .. }
            | Gitxna { .. } | Gitxnas { .. } | Gload { .. } | Gloads { .. } | Gloadss
            | Gaid { .. } | Gaids | BoxCreate | BoxExtract | BoxReplace | BoxDel | BoxLen
            | BoxGet | BoxPut | Block { .. } => ExecutionMode::Stateful,
            _ => ExecutionMode::Any,
        }
    }

    /// Whether the opcode unconditionally ends a straight-line run: nothing
    /// ever falls through to the next instruction.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Op::Return | Op::Err | Op::Retsub | Op::Branch { .. }
        )
    }

    /// Whether the opcode transfers control non-sequentially.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Op::Branch { .. }
                | Op::BranchZero { .. }
                | Op::BranchNonZero { .. }
                | Op::Callsub { .. }
                | Op::Retsub
                | Op::Switch { .. }
                | Op::Match { .. }
        )
    }

    /// Whether the opcode is a subroutine call.
    #[must_use]
    pub fn is_callsub(&self) -> bool {
        matches!(self, Op::Callsub { .. })
    }

    /// Whether the opcode is a subroutine return.
    #[must_use]
    pub fn is_retsub(&self) -> bool {
        matches!(self, Op::Retsub)
    }

    /// Whether the opcode is the failing halt.
    #[must_use]
    pub fn is_err(&self) -> bool {
        matches!(self, Op::Err)
    }

    /// Whether the opcode is the explicit `return`.
    #[must_use]
    pub fn is_return(&self) -> bool {
        matches!(self, Op::Return)
    }

    /// The label targets the opcode can jump to, in source order.
    #[must_use]
    pub fn branch_targets(&self) -> Vec<&str> {
        use Op::*;
        match self {
            Branch { target }
            | BranchZero { target }
            | BranchNonZero { target }
            | Callsub { target } => vec![target.as_str()],
            Switch { targets } | Match { targets } => {
                targets.iter().map(String::as_str).collect()
            }
            _ => vec![],
        }
    }

    /// The canonical mnemonic for the opcode.
    #[must_use]
    #[allow(clippy::too_many_lines)] // A single lookup table, one arm each.
    pub fn mnemonic(&self) -> &'static str {
        use Op::*;
        match self {
            Err => "err",
            Assert => "assert",
            Return => "return",
            Retsub => "retsub",
            Callsub { .. } => "callsub",
            Branch { .. } => "b",
            BranchZero { .. } => "bz",
            BranchNonZero { .. } => "bnz",
            Switch { .. } => "switch",
            Match { .. } => "match",
            Int { .. } => "int",
            PushInt { .. } => "pushint",
            PushInts { .. } => "pushints",
            IntcBlock { .. } => "intcblock",
            Intc { .. } => "intc",
            Byte { .. } => "byte",
            PushBytes { .. } => "pushbytes",
            PushBytess { .. } => "pushbytess",
            BytecBlock { .. } => "bytecblock",
            Bytec { .. } => "bytec",
            Arg { .. } => "arg",
            Args => "args",
            Txn { .. } => "txn",
            Txna { .. } => "txna",
            Txnas { .. } => "txnas",
            Gtxn { .. } => "gtxn",
            Gtxna { .. } => "gtxna",
            Gtxnas { .. } => "gtxnas",
            Gtxns { .. } => "gtxns",
            Gtxnsa { .. } => "gtxnsa",
            Gtxnsas { .. } => "gtxnsas",
            Itxn { .. } => "itxn",
            Itxna { .. } => "itxna",
            Itxnas { .. } => "itxnas",
            Gitxn { .. } => "gitxn",
            Gitxna { .. } => "gitxna",
            Gitxnas { .. } => "gitxnas",
            ItxnBegin => "itxn_begin",
            ItxnNext => "itxn_next",
            ItxnField { .. } => "itxn_field",
            ItxnSubmit => "itxn_submit",
            Global { .. } => "global",
            Load { .. } => "load",
            Loads => "loads",
            Store { .. } => "store",
            Stores => "stores",
            Gload { .. } => "gload",
            Gloads { .. } => "gloads",
            Gloadss => "gloadss",
            Gaid { .. } => "gaid",
            Gaids => "gaids",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Exp => "exp",
            Sqrt => "sqrt",
            Shl => "shl",
            Shr => "shr",
            Mulw => "mulw",
            Addw => "addw",
            Divw => "divw",
            DivModW => "divmodw",
            Expw => "expw",
            Bitlen => "bitlen",
            Eq => "==",
            Neq => "!=",
            Lt => "<",
            Gt => ">",
            Le => "<=",
            Ge => ">=",
            And => "&&",
            Or => "||",
            Not => "!",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            BitNot => "~",
            BAdd => "b+",
            BSub => "b-",
            BMul => "b*",
            BDiv => "b/",
            BMod => "b%",
            BEq => "b==",
            BNeq => "b!=",
            BLt => "b<",
            BGt => "b>",
            BLe => "b<=",
            BGe => "b>=",
            BBitAnd => "b&",
            BBitOr => "b|",
            BBitXor => "b^",
            BBitNot => "b~",
            BZero => "bzero",
            BSqrt => "bsqrt",
            Btoi => "btoi",
            Itob => "itob",
            Concat => "concat",
            Len => "len",
            Substring { .. } => "substring",
            Substring3 => "substring3",
            Extract { .. } => "extract",
            Extract3 => "extract3",
            ExtractUint16 => "extract_uint16",
            ExtractUint32 => "extract_uint32",
            ExtractUint64 => "extract_uint64",
            GetBit => "getbit",
            SetBit => "setbit",
            GetByte => "getbyte",
            SetByte => "setbyte",
            Replace2 { .. } => "replace2",
            Replace3 => "replace3",
            Sha256 => "sha256",
            Sha512_256 => "sha512_256",
            Keccak256 => "keccak256",
            Sha3_256 => "sha3_256",
            Ed25519Verify => "ed25519verify",
            Ed25519VerifyBare => "ed25519verify_bare",
            EcdsaVerify { .. } => "ecdsa_verify",
            EcdsaPkDecompress { .. } => "ecdsa_pk_decompress",
            EcdsaPkRecover { .. } => "ecdsa_pk_recover",
            VrfVerify { .. } => "vrf_verify",
            Pop => "pop",
            Popn { .. } => "popn",
            Dup => "dup",
            Dup2 => "dup2",
            Dupn { .. } => "dupn",
            Dig { .. } => "dig",
            Bury { .. } => "bury",
            Cover { .. } => "cover",
            Uncover { .. } => "uncover",
            Swap => "swap",
            Select => "select",
            Proto { .. } => "proto",
            FrameDig { .. } => "frame_dig",
            FrameBury { .. } => "frame_bury",
            AppGlobalGet => "app_global_get",
            AppGlobalGetEx => "app_global_get_ex",
            AppGlobalPut => "app_global_put",
            AppGlobalDel => "app_global_del",
            AppLocalGet => "app_local_get",
            AppLocalGetEx => "app_local_get_ex",
            AppLocalPut => "app_local_put",
            AppLocalDel => "app_local_del",
            AppOptedIn => "app_opted_in",
            Balance => "balance",
            MinBalance => "min_balance",
            AssetHoldingGet { .. } => "asset_holding_get",
            AssetParamsGet { .. } => "asset_params_get",
            AppParamsGet { .. } => "app_params_get",
            AcctParamsGet { .. } => "acct_params_get",
            BoxCreate => "box_create",
            BoxExtract => "box_extract",
            BoxReplace => "box_replace",
            BoxDel => "box_del",
            BoxLen => "box_len",
            BoxGet => "box_get",
            BoxPut => "box_put",
            Log => "log",
            Base64Decode { .. } => "base64_decode",
            JsonRef { .. } => "json_ref",
            Block { .. } => "block",
        }
    }
}

/// Renders the canonical source form of the opcode, immediates included.
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Op::*;
        let m = self.mnemonic();
        match self {
            Callsub { target } | Branch { target } | BranchZero { target }
            | BranchNonZero { target } => write!(f, "{m} {target}"),
            Switch { targets } | Match { targets } => {
                write!(f, "{m} {}", targets.join(" "))
            }
            Int { value } | PushInt { value } => write!(f, "{m} {value}"),
            PushInts { values } | IntcBlock { values } => {
                let rendered: Vec<String> = values.iter().map(u64::to_string).collect();
                write!(f, "{m} {}", rendered.join(" "))
            }
            Intc { index } | Bytec { index } | Arg { index } => write!(f, "{m} {index}"),
            Byte { data } | PushBytes { data } => write!(f, "{m} 0x{}", hex::encode(data)),
            PushBytess { values } | BytecBlock { values } => {
                let rendered: Vec<String> =
                    values.iter().map(|v| format!("0x{}", hex::encode(v))).collect();
                write!(f, "{m} {}", rendered.join(" "))
            }
            Txn { field } | Txnas { field } | Gtxns { field } | Gtxnsas { field }
            | Itxn { field } | Itxnas { field } | ItxnField { field } => {
                write!(f, "{m} {field}")
            }
            Txna { field, index } | Gtxnsa { field, index } | Itxna { field, index } => {
                write!(f, "{m} {field} {index}")
            }
            Gtxn { group_index, field }
            | Gtxnas { group_index, field }
            | Gitxn { group_index, field }
            | Gitxnas { group_index, field } => write!(f, "{m} {group_index} {field}"),
            Gtxna {
                group_index,
                field,
                index,
            }
            | Gitxna {
                group_index,
                field,
                index,
            } => write!(f, "{m} {group_index} {field} {index}"),
            Global { field } => write!(f, "{m} {field}"),
            Load { slot } | Store { slot } | Gloads { slot } => write!(f, "{m} {slot}"),
            Gload { group_index, slot } => write!(f, "{m} {group_index} {slot}"),
            Gaid { group_index } => write!(f, "{m} {group_index}"),
            Substring { start, end } => write!(f, "{m} {start} {end}"),
            Extract { start, length } => write!(f, "{m} {start} {length}"),
            Replace2 { start } => write!(f, "{m} {start}"),
            EcdsaVerify { curve } | EcdsaPkDecompress { curve } | EcdsaPkRecover { curve } => {
                write!(f, "{m} {curve}")
            }
            VrfVerify { standard } => write!(f, "{m} {standard}"),
            Popn { count } | Dupn { count } => write!(f, "{m} {count}"),
            Dig { depth } | Bury { depth } | Cover { depth } | Uncover { depth } => {
                write!(f, "{m} {depth}")
            }
            Proto { args, returns } => write!(f, "{m} {args} {returns}"),
            FrameDig { index } | FrameBury { index } => write!(f, "{m} {index}"),
            AssetHoldingGet { field }
            | AssetParamsGet { field }
            | AppParamsGet { field }
            | AcctParamsGet { field }
            | Block { field } => write!(f, "{m} {field}"),
            Base64Decode { encoding } => write!(f, "{m} {encoding}"),
            JsonRef { kind } => write!(f, "{m} {kind}"),
            _ => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn terminators_are_classified() {
        assert!(Op::Return.is_terminator());
        assert!(Op::Err.is_terminator());
        assert!(Op::Retsub.is_terminator());
        assert!(Op::Branch {
            target: "done".into()
        }
        .is_terminator());
        assert!(!Op::BranchNonZero {
            target: "done".into()
        }
        .is_terminator());
        assert!(!Op::Callsub {
            target: "sub".into()
        }
        .is_terminator());
    }

    #[test]
    fn variable_arity_signatures_follow_immediates() {
        let popn = Op::Popn { count: 3 };
        assert_eq!(popn.stack_signature(), StackSignature::new(3, 0));

        let pushes = Op::PushInts {
            values: vec![1, 2, 3, 4],
        };
        assert_eq!(pushes.stack_signature(), StackSignature::new(0, 4));

        let matcher = Op::Match {
            targets: vec!["a".into(), "b".into()],
        };
        assert_eq!(matcher.stack_signature(), StackSignature::new(3, 0));
    }

    #[test]
    fn field_version_dominates_opcode_version() {
        let op = Op::Txn {
            field: TransactionField::OnCompletion,
        };
        assert_eq!(op.introduced_in(), 2);

        let op = Op::Txn {
            field: TransactionField::Sender,
        };
        assert_eq!(op.introduced_in(), 1);
    }

    #[test]
    fn canonical_display_includes_immediates() {
        let op = Op::Gtxn {
            group_index: 1,
            field: TransactionField::Amount,
        };
        assert_eq!(op.to_string(), "gtxn 1 Amount");

        let op = Op::Byte {
            data: vec![0xde, 0xad],
        };
        assert_eq!(op.to_string(), "byte 0xdead");
    }

    #[test]
    fn mode_exclusive_opcodes() {
        assert_eq!(Op::AppGlobalGet.mode(), ExecutionMode::Stateful);
        assert_eq!(Op::Arg { index: 0 }.mode(), ExecutionMode::Stateless);
        assert_eq!(Op::Add.mode(), ExecutionMode::Any);
    }
}
