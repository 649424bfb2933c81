//! This module contains the parsers for the literal immediate forms: integers
//! in their three radixes, named integer constants, and the byte-literal
//! encodings.

use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
    Engine,
};
use data_encoding::{BASE32, BASE32_NOPAD};
use sha2::{Digest, Sha512_256};

use crate::{
    constant::{ADDRESS_LENGTH, METHOD_SELECTOR_LENGTH},
    error::parsing::ErrorKind,
};

/// Parses an integer immediate.
///
/// Integers may be written in decimal, hexadecimal with a `0x` prefix, octal
/// with a leading `0`, or as one of the recognised named constants (the
/// transaction-type names and the on-completion action names).
///
/// # Errors
///
/// If `text` is not a valid integer in any of the accepted forms.
pub fn parse_uint(text: &str) -> Result<u64, ErrorKind> {
    if let Some(value) = named_constant(text) {
        return Ok(value);
    }

    let parsed = if let Some(hex_digits) = text.strip_prefix("0x") {
        u64::from_str_radix(hex_digits, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        u64::from_str_radix(text, 8)
    } else {
        text.parse::<u64>()
    };

    parsed.map_err(|_| ErrorKind::InvalidIntegerLiteral(text.to_string()))
}

/// Resolves a named integer constant to its numeric value.
///
/// The names cover the transaction-type enum (`pay`, `keyreg`, `acfg`,
/// `axfer`, `afrz`, `appl`) and the on-completion actions (`NoOp` through
/// `DeleteApplication`).
#[must_use]
pub fn named_constant(name: &str) -> Option<u64> {
    let value = match name {
        "unknown" => 0,
        "pay" => 1,
        "keyreg" => 2,
        "acfg" => 3,
        "axfer" => 4,
        "afrz" => 5,
        "appl" => 6,
        "NoOp" => 0,
        "OptIn" => 1,
        "CloseOut" => 2,
        "ClearState" => 3,
        "UpdateApplication" => 4,
        "DeleteApplication" => 5,
        _ => return None,
    };
    Some(value)
}

/// Parses a run of byte-literal tokens, returning the decoded literals.
///
/// The accepted forms are `base64 X` / `b64 X` / `base64(X)` / `b64(X)`, the
/// `base32` / `b32` equivalents, `0x`-prefixed hexadecimal, and double-quoted
/// strings with the standard escapes. Two-token forms consume two tokens.
///
/// # Errors
///
/// If any token does not decode under the encoding its prefix names.
pub fn parse_byte_tokens(tokens: &[String]) -> Result<Vec<Vec<u8>>, ErrorKind> {
    let mut literals = vec![];
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let literal = match token {
            "base64" | "b64" => {
                let data = tokens
                    .get(i + 1)
                    .ok_or_else(|| ErrorKind::InvalidByteLiteral(token.to_string()))?;
                i += 2;
                decode_base64(data)?
            }
            "base32" | "b32" => {
                let data = tokens
                    .get(i + 1)
                    .ok_or_else(|| ErrorKind::InvalidByteLiteral(token.to_string()))?;
                i += 2;
                decode_base32(data)?
            }
            _ => {
                i += 1;
                parse_single_byte_token(token)?
            }
        };
        literals.push(literal);
    }
    Ok(literals)
}

/// Parses one self-contained byte-literal token.
fn parse_single_byte_token(token: &str) -> Result<Vec<u8>, ErrorKind> {
    if let Some(data) = parenthesised(token, "base64(").or_else(|| parenthesised(token, "b64(")) {
        return decode_base64(data);
    }
    if let Some(data) = parenthesised(token, "base32(").or_else(|| parenthesised(token, "b32(")) {
        return decode_base32(data);
    }
    if let Some(hex_digits) = token.strip_prefix("0x") {
        return hex::decode(hex_digits).map_err(|_| ErrorKind::InvalidByteLiteral(token.to_string()));
    }
    if token.starts_with('"') && token.ends_with('"') && token.len() >= 2 {
        return decode_string_escapes(&token[1..token.len() - 1]);
    }
    Err(ErrorKind::InvalidByteLiteral(token.to_string()))
}

/// Strips the `prefix` and the trailing `)` from a `prefix(data)` token.
fn parenthesised<'t>(token: &'t str, prefix: &str) -> Option<&'t str> {
    token.strip_prefix(prefix).and_then(|rest| rest.strip_suffix(')'))
}

fn decode_base64(data: &str) -> Result<Vec<u8>, ErrorKind> {
    STANDARD
        .decode(data)
        .or_else(|_| STANDARD_NO_PAD.decode(data))
        .map_err(|_| ErrorKind::InvalidByteLiteral(data.to_string()))
}

fn decode_base32(data: &str) -> Result<Vec<u8>, ErrorKind> {
    BASE32
        .decode(data.as_bytes())
        .or_else(|_| BASE32_NOPAD.decode(data.as_bytes()))
        .map_err(|_| ErrorKind::InvalidByteLiteral(data.to_string()))
}

/// Decodes the escape sequences in a double-quoted string literal's body.
fn decode_string_escapes(body: &str) -> Result<Vec<u8>, ErrorKind> {
    let mut bytes = vec![];
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buffer = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buffer).as_bytes());
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| ErrorKind::InvalidByteLiteral(body.to_string()))?;
        match escaped {
            'n' => bytes.push(b'\n'),
            'r' => bytes.push(b'\r'),
            't' => bytes.push(b'\t'),
            '\\' => bytes.push(b'\\'),
            '"' => bytes.push(b'"'),
            'x' => {
                let hi = chars.next();
                let lo = chars.next();
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(ErrorKind::InvalidByteLiteral(body.to_string()));
                };
                let pair = format!("{hi}{lo}");
                let value = u8::from_str_radix(&pair, 16)
                    .map_err(|_| ErrorKind::InvalidByteLiteral(body.to_string()))?;
                bytes.push(value);
            }
            _ => return Err(ErrorKind::InvalidByteLiteral(body.to_string())),
        }
    }
    Ok(bytes)
}

/// Decodes an account address literal into its public-key bytes.
///
/// Addresses are base32 encoded and carry a four-byte checksum suffix which
/// is not part of the key.
///
/// # Errors
///
/// If the literal does not decode as base32 or is shorter than a public key.
pub fn decode_address(text: &str) -> Result<Vec<u8>, ErrorKind> {
    let decoded = decode_base32(text)?;
    if decoded.len() < ADDRESS_LENGTH {
        return Err(ErrorKind::InvalidByteLiteral(text.to_string()));
    }
    Ok(decoded[..ADDRESS_LENGTH].to_vec())
}

/// Computes the selector pushed by the `method` pseudo-op: the first four
/// bytes of the SHA-512/256 digest of the method signature.
#[must_use]
pub fn method_selector(signature: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512_256::new();
    hasher.update(signature);
    hasher.finalize()[..METHOD_SELECTOR_LENGTH].to_vec()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_integer_radixes() {
        assert_eq!(parse_uint("42").unwrap(), 42);
        assert_eq!(parse_uint("0x2a").unwrap(), 42);
        assert_eq!(parse_uint("052").unwrap(), 42);
    }

    #[test]
    fn parses_named_constants() {
        assert_eq!(parse_uint("pay").unwrap(), 1);
        assert_eq!(parse_uint("DeleteApplication").unwrap(), 5);
        assert!(parse_uint("NotAConstant").is_err());
    }

    #[test]
    fn parses_byte_literal_forms() {
        let prefix_form = parse_byte_tokens(&["base64".into(), "AA==".into()]).unwrap();
        assert_eq!(prefix_form, vec![vec![0u8]]);

        let paren_form = parse_byte_tokens(&["b64(AA==)".into()]).unwrap();
        assert_eq!(paren_form, vec![vec![0u8]]);

        let hex_form = parse_byte_tokens(&["0xdeadbeef".into()]).unwrap();
        assert_eq!(hex_form, vec![vec![0xde, 0xad, 0xbe, 0xef]]);

        let quoted = parse_byte_tokens(&["\"hi\\n\"".into()]).unwrap();
        assert_eq!(quoted, vec![b"hi\n".to_vec()]);
    }

    #[test]
    fn rejects_malformed_byte_literals() {
        assert!(parse_byte_tokens(&["base64".into()]).is_err());
        assert!(parse_byte_tokens(&["0xzz".into()]).is_err());
        assert!(parse_byte_tokens(&["plain".into()]).is_err());
    }
}
