//! Solidity ABI codec
//!
//! Covers the subset of the contract ABI the governance client needs:
//! addresses, unsigned integers, booleans, `bytesN`, `bytes`, `string`
//! and dynamic arrays of any of those (including `string[]` / `bytes[]`).
//! Decoding is strict: out-of-range offsets, dirty padding in addresses
//! and non-0/1 booleans are rejected instead of being coerced.

use crate::address::Address;
use crate::U256;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

const WORD: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum AbiError {
    #[error("Data too short: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid {kind} value: {reason}")]
    InvalidData { kind: &'static str, reason: String },

    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Wrong number of values: expected {expected}, got {actual}")]
    Arity { expected: usize, actual: usize },
}

/// Static description of a value's ABI type, used to drive decoding
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    Address,
    Uint(usize),
    Bool,
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<ParamType>),
}

impl ParamType {
    pub fn array(inner: ParamType) -> Self {
        ParamType::Array(Box::new(inner))
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::Bytes | ParamType::String | ParamType::Array(_))
    }
}

/// A decoded (or to-be-encoded) ABI value
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Address(Address),
    Uint(U256),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Token>),
}

impl Token {
    pub fn uint(value: impl Into<U256>) -> Self {
        Token::Uint(value.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Uint(_) => "uint",
            Token::Bool(_) => "bool",
            Token::FixedBytes(_) => "bytesN",
            Token::Bytes(_) => "bytes",
            Token::String(_) => "string",
            Token::Array(_) => "array",
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, Token::Bytes(_) | Token::String(_) | Token::Array(_))
    }

    pub fn into_address(self) -> Result<Address, AbiError> {
        match self {
            Token::Address(a) => Ok(a),
            other => Err(unexpected("address", &other)),
        }
    }

    pub fn into_uint(self) -> Result<U256, AbiError> {
        match self {
            Token::Uint(v) => Ok(v),
            other => Err(unexpected("uint", &other)),
        }
    }

    pub fn into_u64(self) -> Result<u64, AbiError> {
        let value = self.into_uint()?;
        value.to_u64().ok_or_else(|| AbiError::InvalidData {
            kind: "uint64",
            reason: format!("{} does not fit in 64 bits", value),
        })
    }

    pub fn into_bool(self) -> Result<bool, AbiError> {
        match self {
            Token::Bool(b) => Ok(b),
            other => Err(unexpected("bool", &other)),
        }
    }

    pub fn into_fixed_bytes(self) -> Result<Vec<u8>, AbiError> {
        match self {
            Token::FixedBytes(b) => Ok(b),
            other => Err(unexpected("bytesN", &other)),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, AbiError> {
        match self {
            Token::Bytes(b) => Ok(b),
            other => Err(unexpected("bytes", &other)),
        }
    }

    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            Token::String(s) => Ok(s),
            other => Err(unexpected("string", &other)),
        }
    }

    pub fn into_array(self) -> Result<Vec<Token>, AbiError> {
        match self {
            Token::Array(items) => Ok(items),
            other => Err(unexpected("array", &other)),
        }
    }
}

fn unexpected(expected: &'static str, found: &Token) -> AbiError {
    AbiError::UnexpectedToken {
        expected,
        found: found.kind(),
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a parameter list (the bytes that follow a function selector)
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_tail(token));
        } else {
            head.extend_from_slice(&encode_static(token));
        }
    }

    head.extend(tail);
    head
}

/// Selector followed by the encoded arguments
pub fn encode_call(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend(encode(tokens));
    data
}

fn encode_static(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Address(a) => word[12..].copy_from_slice(a.as_bytes()),
        Token::Uint(v) => {
            // Values wider than 256 bits keep their low-order 32 bytes
            let bytes = v.to_bytes_be();
            let bytes = &bytes[bytes.len().saturating_sub(WORD)..];
            word[WORD - bytes.len()..].copy_from_slice(bytes);
        }
        Token::Bool(b) => word[WORD - 1] = *b as u8,
        Token::FixedBytes(b) => {
            let len = b.len().min(WORD);
            word[..len].copy_from_slice(&b[..len]);
        }
        Token::Bytes(_) | Token::String(_) | Token::Array(_) => {
            unreachable!("dynamic tokens are encoded in the tail")
        }
    }
    word
}

fn encode_tail(token: &Token) -> Vec<u8> {
    match token {
        Token::Bytes(b) => encode_packed_bytes(b),
        Token::String(s) => encode_packed_bytes(s.as_bytes()),
        Token::Array(items) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode(items));
            out
        }
        other => encode_static(other).to_vec(),
    }
}

fn encode_packed_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode `data` as a parameter list of the given types
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| decode_param(ty, data, i * WORD))
        .collect()
}

fn decode_param(ty: &ParamType, data: &[u8], head: usize) -> Result<Token, AbiError> {
    if !ty.is_dynamic() {
        return decode_static(ty, read_word(data, head)?);
    }

    let offset = read_usize(data, head)?;
    match ty {
        ParamType::Bytes => read_packed_bytes(data, offset).map(Token::Bytes),
        ParamType::String => {
            let bytes = read_packed_bytes(data, offset)?;
            String::from_utf8(bytes)
                .map(Token::String)
                .map_err(|e| AbiError::InvalidData {
                    kind: "string",
                    reason: e.to_string(),
                })
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, offset)?;
            let body = data.get(offset + WORD..).ok_or(AbiError::OutOfBounds {
                offset: offset + WORD,
                needed: 0,
                available: data.len(),
            })?;
            // Every element occupies at least one head word
            if len > body.len() / WORD {
                return Err(AbiError::OutOfBounds {
                    offset: offset + WORD,
                    needed: len.saturating_mul(WORD),
                    available: body.len(),
                });
            }
            let items = (0..len)
                .map(|i| decode_param(inner, body, i * WORD))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Token::Array(items))
        }
        _ => unreachable!("static types handled above"),
    }
}

fn decode_static(ty: &ParamType, word: &[u8]) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::InvalidData {
                    kind: "address",
                    reason: "non-zero padding".to_string(),
                });
            }
            // Infallible: the slice is exactly 20 bytes
            let mut out = [0u8; 20];
            out.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address(out)))
        }
        ParamType::Uint(bits) => {
            let value = U256::from_bytes_be(word);
            if *bits < 256 && value.bits() > *bits as u64 {
                return Err(AbiError::InvalidData {
                    kind: "uint",
                    reason: format!("{} exceeds uint{}", value, bits),
                });
            }
            Ok(Token::Uint(value))
        }
        ParamType::Bool => match U256::from_bytes_be(word) {
            v if v.is_zero() => Ok(Token::Bool(false)),
            v if v == U256::from(1u8) => Ok(Token::Bool(true)),
            v => Err(AbiError::InvalidData {
                kind: "bool",
                reason: format!("{} is not 0 or 1", v),
            }),
        },
        ParamType::FixedBytes(len) => {
            let len = (*len).min(WORD);
            Ok(Token::FixedBytes(word[..len].to_vec()))
        }
        ParamType::Bytes | ParamType::String | ParamType::Array(_) => {
            unreachable!("dynamic types are decoded through their offset")
        }
    }
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(WORD)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            needed: WORD,
            available: data.len(),
        })
}

fn read_usize(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let word = read_word(data, offset)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidData {
            kind: "offset",
            reason: format!("0x{} is too large", hex::encode(word)),
        });
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(be)).map_err(|e| AbiError::InvalidData {
        kind: "offset",
        reason: e.to_string(),
    })
}

fn read_packed_bytes(data: &[u8], offset: usize) -> Result<Vec<u8>, AbiError> {
    let len = read_usize(data, offset)?;
    let start = offset + WORD;
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .map(|b| b.to_vec())
        .ok_or(AbiError::OutOfBounds {
            offset: start,
            needed: len,
            available: data.len(),
        })
}
