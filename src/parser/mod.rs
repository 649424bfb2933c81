//! This module contains the line-oriented parser that turns program source
//! text into a [`Program`]: a typed instruction stream plus a label table.
//!
//! # Implementation Note
//!
//! While it might make sense in the future to build a more robust parser
//! based on parser combinators from a library like
//! [`nom`](https://docs.rs/nom), for now a direct line scan keeps the error
//! reporting simple: every failure carries the one-based source line it
//! occurred on.

pub mod literal;

use bimap::BiMap;
use tracing::{debug, warn};

use crate::{
    constant::DEFAULT_PROGRAM_VERSION,
    error::parsing::{ErrorKind, Result},
    instruction::{ExecutionMode, Instruction, Op, TransactionField},
    program::{Program, Source},
};

/// Parses the provided `source` into a [`Program`].
///
/// Parsing is a single pass over the source lines. Label references are
/// collected as they are seen and validated against the label table once the
/// whole source has been scanned, so a forward reference to a label defined
/// later is fine but a reference to a label that is never defined is fatal.
///
/// # Errors
///
/// On the first malformed line: an unknown mnemonic, an immediate arity
/// mismatch, a malformed literal, a duplicate label, an opcode newer than the
/// program's declared version, or a misplaced `#pragma`. References to
/// undefined labels are reported after the scan completes.
pub fn parse(source: &Source) -> Result<Program> {
    let mut instructions: Vec<Instruction> = vec![];
    let mut labels: BiMap<String, usize> = BiMap::new();
    let mut version = DEFAULT_PROGRAM_VERSION;
    let mut seen_code = false;

    for (offset, raw_line) in source.text().lines().enumerate() {
        // Lines are one-based everywhere the user sees them.
        let line = u32::try_from(offset + 1).unwrap_or(u32::MAX);
        let tokens = tokenize(raw_line).map_err(|kind| kind.at(line))?;
        if tokens.is_empty() {
            continue;
        }

        if tokens[0] == "#pragma" {
            if seen_code {
                return Err(ErrorKind::MisplacedPragma.at(line));
            }
            version = parse_pragma(&tokens).map_err(|kind| kind.at(line))?;
            seen_code = true;
            continue;
        }

        if let Some(label) = tokens[0].strip_suffix(':') {
            if tokens.len() != 1 || label.is_empty() {
                return Err(ErrorKind::MalformedLabel(raw_line.trim().to_string()).at(line));
            }
            if labels.contains_left(label) {
                return Err(ErrorKind::DuplicateLabel(label.to_string()).at(line));
            }
            labels.insert(label.to_string(), instructions.len());
            seen_code = true;
            continue;
        }

        let op = parse_op(&tokens).map_err(|kind| kind.at(line))?;
        if op.introduced_in() > version {
            return Err(ErrorKind::OpcodeFromLaterVersion {
                mnemonic:   tokens[0].clone(),
                introduced: op.introduced_in(),
                program:    version,
            }
            .at(line));
        }
        instructions.push(Instruction::new(line, op));
        seen_code = true;
    }

    if instructions.is_empty() {
        return Err(ErrorKind::EmptyProgram.at(1));
    }

    // A label at the very end of the source names the index one past the last
    // instruction; there is nothing for a branch to land on there.
    for instruction in &instructions {
        for target in instruction.op().branch_targets() {
            let resolves = labels
                .get_by_left(target)
                .is_some_and(|index| *index < instructions.len());
            if !resolves {
                return Err(ErrorKind::UndefinedLabel(target.to_string()).at(instruction.line()));
            }
        }
    }

    let mode = detect_mode(&instructions);
    debug!(
        program = source.name(),
        version,
        %mode,
        instructions = instructions.len(),
        "parsed program"
    );

    Ok(Program::new(source.name(), instructions, labels, version, mode))
}

/// Classifies a program as stateful or stateless from the opcodes it uses.
///
/// Opcodes that are exclusive to one mode decide the classification. If both
/// families appear the program is treated as stateful and a warning is
/// recorded; if neither appears it defaults to stateless.
#[must_use]
pub fn detect_mode(instructions: &[Instruction]) -> ExecutionMode {
    let mut saw_stateful = false;
    let mut saw_stateless = false;
    for instruction in instructions {
        match instruction.op().mode() {
            ExecutionMode::Stateful => saw_stateful = true,
            ExecutionMode::Stateless => saw_stateless = true,
            ExecutionMode::Any => {}
        }
    }

    match (saw_stateful, saw_stateless) {
        (true, true) => {
            warn!("program mixes stateful-only and stateless-only opcodes; treating as stateful");
            ExecutionMode::Stateful
        }
        (true, false) => ExecutionMode::Stateful,
        _ => ExecutionMode::Stateless,
    }
}

/// Splits a source line into tokens: double-quoted string literals, comments
/// (which are dropped), and runs of non-space characters.
fn tokenize(line: &str) -> std::result::Result<Vec<String>, ErrorKind> {
    let mut tokens = vec![];
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        if chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
            break;
        }
        if chars[i] == '"' {
            let start = i;
            i += 1;
            loop {
                match chars.get(i) {
                    Some('"') if chars[i - 1] != '\\' => {
                        i += 1;
                        break;
                    }
                    Some(_) => i += 1,
                    None => return Err(ErrorKind::UnterminatedString),
                }
            }
            tokens.push(chars[start..i].iter().collect());
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            // A comment can start flush against a token.
            if i > start && chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
                break;
            }
            i += 1;
        }
        tokens.push(chars[start..i].iter().collect());
        if i < chars.len() && chars[i] == '/' && chars.get(i + 1) == Some(&'/') {
            break;
        }
    }

    Ok(tokens)
}

/// Parses the `#pragma version N` directive.
fn parse_pragma(tokens: &[String]) -> std::result::Result<u8, ErrorKind> {
    if tokens.len() != 3 || tokens[1] != "version" {
        return Err(ErrorKind::UnknownPragma(tokens[1..].join(" ")));
    }
    let version = literal::parse_uint(&tokens[2])?;
    u8::try_from(version).map_err(|_| ErrorKind::InvalidIntegerLiteral(tokens[2].clone()))
}

/// Checks that exactly `expected` immediate tokens follow the mnemonic, and
/// returns them.
fn immediates<'t>(
    tokens: &'t [String],
    expected: usize,
) -> std::result::Result<&'t [String], ErrorKind> {
    let rest = &tokens[1..];
    if rest.len() != expected {
        return Err(ErrorKind::ImmediateArityMismatch {
            mnemonic: tokens[0].clone(),
            expected,
            actual: rest.len(),
        });
    }
    Ok(rest)
}

/// Parses exactly one byte literal from the immediate tokens.
fn single_byte_literal(tokens: &[String]) -> std::result::Result<Vec<u8>, ErrorKind> {
    let literals = literal::parse_byte_tokens(&tokens[1..])?;
    if literals.len() != 1 {
        return Err(ErrorKind::ImmediateArityMismatch {
            mnemonic: tokens[0].clone(),
            expected: 1,
            actual:   literals.len(),
        });
    }
    Ok(literals.into_iter().next().unwrap_or_default())
}

fn txn_field(token: &str) -> std::result::Result<TransactionField, ErrorKind> {
    token.parse::<TransactionField>()
}

/// Parses a tokenized line into an opcode with typed immediates.
#[allow(clippy::too_many_lines)] // A single dispatch table, one arm each.
fn parse_op(tokens: &[String]) -> std::result::Result<Op, ErrorKind> {
    let mnemonic = tokens[0].as_str();

    let op = match mnemonic {
        "err" => Op::Err,
        "assert" => Op::Assert,
        "return" => Op::Return,
        "retsub" => Op::Retsub,
        "callsub" => Op::Callsub {
            target: immediates(tokens, 1)?[0].clone(),
        },
        "b" => Op::Branch {
            target: immediates(tokens, 1)?[0].clone(),
        },
        "bz" => Op::BranchZero {
            target: immediates(tokens, 1)?[0].clone(),
        },
        "bnz" => Op::BranchNonZero {
            target: immediates(tokens, 1)?[0].clone(),
        },
        "switch" => Op::Switch {
            targets: tokens[1..].to_vec(),
        },
        "match" => Op::Match {
            targets: tokens[1..].to_vec(),
        },

        "int" => Op::Int {
            value: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "pushint" => Op::PushInt {
            value: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "pushints" => Op::PushInts {
            values: parse_uint_list(&tokens[1..])?,
        },
        "intcblock" => Op::IntcBlock {
            values: parse_uint_list(&tokens[1..])?,
        },
        "intc" => Op::Intc {
            index: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "intc_0" => Op::Intc { index: 0 },
        "intc_1" => Op::Intc { index: 1 },
        "intc_2" => Op::Intc { index: 2 },
        "intc_3" => Op::Intc { index: 3 },
        "byte" => Op::Byte {
            data: single_byte_literal(tokens)?,
        },
        "pushbytes" => Op::PushBytes {
            data: single_byte_literal(tokens)?,
        },
        "pushbytess" => Op::PushBytess {
            values: literal::parse_byte_tokens(&tokens[1..])?,
        },
        "bytecblock" => Op::BytecBlock {
            values: literal::parse_byte_tokens(&tokens[1..])?,
        },
        "bytec" => Op::Bytec {
            index: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "bytec_0" => Op::Bytec { index: 0 },
        "bytec_1" => Op::Bytec { index: 1 },
        "bytec_2" => Op::Bytec { index: 2 },
        "bytec_3" => Op::Bytec { index: 3 },

        // Pseudo-ops that normalise to a plain byte push.
        "addr" => Op::Byte {
            data: literal::decode_address(&immediates(tokens, 1)?[0])?,
        },
        "method" => Op::PushBytes {
            data: literal::method_selector(&single_byte_literal(tokens)?),
        },

        "arg" => Op::Arg {
            index: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "arg_0" => Op::Arg { index: 0 },
        "arg_1" => Op::Arg { index: 1 },
        "arg_2" => Op::Arg { index: 2 },
        "arg_3" => Op::Arg { index: 3 },
        "args" => Op::Args,

        "txn" => Op::Txn {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "txna" => {
            let args = immediates(tokens, 2)?;
            Op::Txna {
                field: txn_field(&args[0])?,
                index: literal::parse_uint(&args[1])?,
            }
        }
        "txnas" => Op::Txnas {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "gtxn" => {
            let args = immediates(tokens, 2)?;
            Op::Gtxn {
                group_index: literal::parse_uint(&args[0])?,
                field:       txn_field(&args[1])?,
            }
        }
        "gtxna" => {
            let args = immediates(tokens, 3)?;
            Op::Gtxna {
                group_index: literal::parse_uint(&args[0])?,
                field:       txn_field(&args[1])?,
                index:       literal::parse_uint(&args[2])?,
            }
        }
        "gtxnas" => {
            let args = immediates(tokens, 2)?;
            Op::Gtxnas {
                group_index: literal::parse_uint(&args[0])?,
                field:       txn_field(&args[1])?,
            }
        }
        "gtxns" => Op::Gtxns {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "gtxnsa" => {
            let args = immediates(tokens, 2)?;
            Op::Gtxnsa {
                field: txn_field(&args[0])?,
                index: literal::parse_uint(&args[1])?,
            }
        }
        "gtxnsas" => Op::Gtxnsas {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "itxn" => Op::Itxn {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "itxna" => {
            let args = immediates(tokens, 2)?;
            Op::Itxna {
                field: txn_field(&args[0])?,
                index: literal::parse_uint(&args[1])?,
            }
        }
        "itxnas" => Op::Itxnas {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "gitxn" => {
            let args = immediates(tokens, 2)?;
            Op::Gitxn {
                group_index: literal::parse_uint(&args[0])?,
                field:       txn_field(&args[1])?,
            }
        }
        "gitxna" => {
            let args = immediates(tokens, 3)?;
            Op::Gitxna {
                group_index: literal::parse_uint(&args[0])?,
                field:       txn_field(&args[1])?,
                index:       literal::parse_uint(&args[2])?,
            }
        }
        "gitxnas" => {
            let args = immediates(tokens, 2)?;
            Op::Gitxnas {
                group_index: literal::parse_uint(&args[0])?,
                field:       txn_field(&args[1])?,
            }
        }
        "itxn_begin" => Op::ItxnBegin,
        "itxn_next" => Op::ItxnNext,
        "itxn_field" => Op::ItxnField {
            field: txn_field(&immediates(tokens, 1)?[0])?,
        },
        "itxn_submit" => Op::ItxnSubmit,
        "global" => Op::Global {
            field: immediates(tokens, 1)?[0].parse()?,
        },

        "load" => Op::Load {
            slot: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "loads" => Op::Loads,
        "store" => Op::Store {
            slot: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "stores" => Op::Stores,
        "gload" => {
            let args = immediates(tokens, 2)?;
            Op::Gload {
                group_index: literal::parse_uint(&args[0])?,
                slot:        literal::parse_uint(&args[1])?,
            }
        }
        "gloads" => Op::Gloads {
            slot: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "gloadss" => Op::Gloadss,
        "gaid" => Op::Gaid {
            group_index: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "gaids" => Op::Gaids,

        "+" => Op::Add,
        "-" => Op::Sub,
        "*" => Op::Mul,
        "/" => Op::Div,
        "%" => Op::Mod,
        "exp" => Op::Exp,
        "sqrt" => Op::Sqrt,
        "shl" => Op::Shl,
        "shr" => Op::Shr,
        "mulw" => Op::Mulw,
        "addw" => Op::Addw,
        "divw" => Op::Divw,
        "divmodw" => Op::DivModW,
        "expw" => Op::Expw,
        "bitlen" => Op::Bitlen,
        "==" => Op::Eq,
        "!=" => Op::Neq,
        "<" => Op::Lt,
        ">" => Op::Gt,
        "<=" => Op::Le,
        ">=" => Op::Ge,
        "&&" => Op::And,
        "||" => Op::Or,
        "!" => Op::Not,
        "&" => Op::BitAnd,
        "|" => Op::BitOr,
        "^" => Op::BitXor,
        "~" => Op::BitNot,

        "b+" => Op::BAdd,
        "b-" => Op::BSub,
        "b*" => Op::BMul,
        "b/" => Op::BDiv,
        "b%" => Op::BMod,
        "b==" => Op::BEq,
        "b!=" => Op::BNeq,
        "b<" => Op::BLt,
        "b>" => Op::BGt,
        "b<=" => Op::BLe,
        "b>=" => Op::BGe,
        "b&" => Op::BBitAnd,
        "b|" => Op::BBitOr,
        "b^" => Op::BBitXor,
        "b~" => Op::BBitNot,
        "bzero" => Op::BZero,
        "bsqrt" => Op::BSqrt,

        "btoi" => Op::Btoi,
        "itob" => Op::Itob,
        "concat" => Op::Concat,
        "len" => Op::Len,
        "substring" => {
            let args = immediates(tokens, 2)?;
            Op::Substring {
                start: literal::parse_uint(&args[0])?,
                end:   literal::parse_uint(&args[1])?,
            }
        }
        "substring3" => Op::Substring3,
        "extract" => {
            let args = immediates(tokens, 2)?;
            Op::Extract {
                start:  literal::parse_uint(&args[0])?,
                length: literal::parse_uint(&args[1])?,
            }
        }
        "extract3" => Op::Extract3,
        "extract_uint16" => Op::ExtractUint16,
        "extract_uint32" => Op::ExtractUint32,
        "extract_uint64" => Op::ExtractUint64,
        "getbit" => Op::GetBit,
        "setbit" => Op::SetBit,
        "getbyte" => Op::GetByte,
        "setbyte" => Op::SetByte,
        "replace2" => Op::Replace2 {
            start: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "replace3" => Op::Replace3,

        "sha256" => Op::Sha256,
        "sha512_256" => Op::Sha512_256,
        "keccak256" => Op::Keccak256,
        "sha3_256" => Op::Sha3_256,
        "ed25519verify" => Op::Ed25519Verify,
        "ed25519verify_bare" => Op::Ed25519VerifyBare,
        "ecdsa_verify" => Op::EcdsaVerify {
            curve: immediates(tokens, 1)?[0].clone(),
        },
        "ecdsa_pk_decompress" => Op::EcdsaPkDecompress {
            curve: immediates(tokens, 1)?[0].clone(),
        },
        "ecdsa_pk_recover" => Op::EcdsaPkRecover {
            curve: immediates(tokens, 1)?[0].clone(),
        },
        "vrf_verify" => Op::VrfVerify {
            standard: immediates(tokens, 1)?[0].clone(),
        },

        "pop" => Op::Pop,
        "popn" => Op::Popn {
            count: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "dup" => Op::Dup,
        "dup2" => Op::Dup2,
        "dupn" => Op::Dupn {
            count: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "dig" => Op::Dig {
            depth: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "bury" => Op::Bury {
            depth: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "cover" => Op::Cover {
            depth: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "uncover" => Op::Uncover {
            depth: literal::parse_uint(&immediates(tokens, 1)?[0])?,
        },
        "swap" => Op::Swap,
        "select" => Op::Select,

        "proto" => {
            let args = immediates(tokens, 2)?;
            Op::Proto {
                args:    literal::parse_uint(&args[0])?,
                returns: literal::parse_uint(&args[1])?,
            }
        }
        "frame_dig" => Op::FrameDig {
            index: parse_frame_index(&immediates(tokens, 1)?[0])?,
        },
        "frame_bury" => Op::FrameBury {
            index: parse_frame_index(&immediates(tokens, 1)?[0])?,
        },

        "app_global_get" => Op::AppGlobalGet,
        "app_global_get_ex" => Op::AppGlobalGetEx,
        "app_global_put" => Op::AppGlobalPut,
        "app_global_del" => Op::AppGlobalDel,
        "app_local_get" => Op::AppLocalGet,
        "app_local_get_ex" => Op::AppLocalGetEx,
        "app_local_put" => Op::AppLocalPut,
        "app_local_del" => Op::AppLocalDel,
        "app_opted_in" => Op::AppOptedIn,
        "balance" => Op::Balance,
        "min_balance" => Op::MinBalance,
        "asset_holding_get" => Op::AssetHoldingGet {
            field: immediates(tokens, 1)?[0].clone(),
        },
        "asset_params_get" => Op::AssetParamsGet {
            field: immediates(tokens, 1)?[0].clone(),
        },
        "app_params_get" => Op::AppParamsGet {
            field: immediates(tokens, 1)?[0].clone(),
        },
        "acct_params_get" => Op::AcctParamsGet {
            field: immediates(tokens, 1)?[0].clone(),
        },

        "box_create" => Op::BoxCreate,
        "box_extract" => Op::BoxExtract,
        "box_replace" => Op::BoxReplace,
        "box_del" => Op::BoxDel,
        "box_len" => Op::BoxLen,
        "box_get" => Op::BoxGet,
        "box_put" => Op::BoxPut,

        "log" => Op::Log,
        "base64_decode" => Op::Base64Decode {
            encoding: immediates(tokens, 1)?[0].clone(),
        },
        "json_ref" => Op::JsonRef {
            kind: immediates(tokens, 1)?[0].clone(),
        },
        "block" => Op::Block {
            field: immediates(tokens, 1)?[0].clone(),
        },

        _ => return Err(ErrorKind::UnknownMnemonic(mnemonic.to_string())),
    };

    Ok(op)
}

fn parse_uint_list(tokens: &[String]) -> std::result::Result<Vec<u64>, ErrorKind> {
    tokens.iter().map(|t| literal::parse_uint(t)).collect()
}

/// Frame slots are addressed relative to the frame pointer and may be
/// negative.
fn parse_frame_index(token: &str) -> std::result::Result<i64, ErrorKind> {
    if let Some(body) = token.strip_prefix('-') {
        let magnitude = literal::parse_uint(body)?;
        let magnitude =
            i64::try_from(magnitude).map_err(|_| ErrorKind::InvalidIntegerLiteral(token.into()))?;
        return Ok(-magnitude);
    }
    let value = literal::parse_uint(token)?;
    i64::try_from(value).map_err(|_| ErrorKind::InvalidIntegerLiteral(token.into()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instruction::GlobalField;

    fn parse_text(text: &str) -> Result<Program> {
        parse(&Source::new("test.teal", text))
    }

    #[test]
    fn parses_a_minimal_program() {
        let program = parse_text("#pragma version 6\nint 1\nreturn\n").unwrap();
        assert_eq!(program.version(), 6);
        assert_eq!(program.instructions().len(), 2);
        assert_eq!(program.mode(), ExecutionMode::Stateless);
        assert_eq!(program.instructions()[0].op(), &Op::Int { value: 1 });
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        let program = parse_text(
            "// leading comment\n#pragma version 3\n\nint 1 // trailing comment\nreturn//flush comment\n",
        )
        .unwrap();
        assert_eq!(program.instructions().len(), 2);
        assert_eq!(program.instructions()[1].op(), &Op::Return);
        assert_eq!(program.version(), 3);
    }

    #[test]
    fn resolves_labels_to_instruction_indices() {
        let program = parse_text("#pragma version 3\nbnz done\nint 0\ndone:\nint 1\nreturn\n")
            .unwrap();
        assert_eq!(program.label_target("done"), Some(2));
        assert_eq!(program.label_at(2), Some("done"));
    }

    #[test]
    fn rejects_unknown_mnemonics() {
        let err = parse_text("#pragma version 3\nfrobnicate\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ErrorKind::UnknownMnemonic(_)));
    }

    #[test]
    fn rejects_opcodes_newer_than_the_pragma() {
        let err = parse_text("#pragma version 3\ncallsub sub\nsub:\nretsub\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::OpcodeFromLaterVersion { .. }));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = parse_text("here:\nint 1\nhere:\nreturn\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateLabel(_)));
    }

    #[test]
    fn rejects_undefined_labels_at_end_of_parse() {
        let err = parse_text("#pragma version 3\nb nowhere\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ErrorKind::UndefinedLabel(_)));
    }

    #[test]
    fn detects_stateful_mode() {
        let program = parse_text(
            "#pragma version 3\nbyte \"key\"\napp_global_get\npop\nint 1\nreturn\n",
        )
        .unwrap();
        assert_eq!(program.mode(), ExecutionMode::Stateful);
    }

    #[test]
    fn named_constants_resolve_to_numbers() {
        let program = parse_text("#pragma version 3\nint DeleteApplication\nreturn\n").unwrap();
        assert_eq!(program.instructions()[0].op(), &Op::Int { value: 5 });
    }

    #[test]
    fn parses_global_fields() {
        let program = parse_text("global GroupSize\npop\nint 1\n").unwrap();
        assert_eq!(
            program.instructions()[0].op(),
            &Op::Global {
                field: GlobalField::GroupSize
            }
        );
    }

    #[test]
    fn canonical_round_trip_is_equivalent() {
        let text = "#pragma version 6\ntxn OnCompletion\nint DeleteApplication\n==\nbnz del\nint 1\nreturn\ndel:\nint 0\nreturn\n";
        let first = parse_text(text).unwrap();
        let second = parse_text(&first.canonical_text()).unwrap();
        let first_ops: Vec<_> = first.instructions().iter().map(Instruction::op).collect();
        let second_ops: Vec<_> = second.instructions().iter().map(Instruction::op).collect();
        assert_eq!(first_ops, second_ops);
        assert_eq!(first.version(), second.version());
    }
}
