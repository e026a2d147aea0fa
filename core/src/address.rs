//! Account addresses and 32-byte hashes
//!
//! Both are fixed-size byte arrays rendered as `0x`-prefixed lowercase hex,
//! which is also how they travel over JSON-RPC.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], AddressError> {
    let stripped = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    let bytes = hex::decode(stripped).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(AddressError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

macro_rules! fixed_bytes {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
                if bytes.len() != $len {
                    return Err(AddressError::InvalidLength {
                        expected: $len,
                        actual: bytes.len(),
                    });
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(Address, 20);
fixed_bytes!(TxHash, 32);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Shorten for display, e.g. `0x1234...abcd`
    ///
    /// Keeps `start` leading and `end` trailing characters and pads the
    /// middle with dots up to `max_len`. Strings already within `max_len`
    /// are returned unchanged.
    pub fn truncate(&self, start: usize, end: usize, max_len: usize) -> String {
        truncate_middle(&self.to_hex(), start, end, max_len)
    }
}

/// Truncate the middle of `text` to at most `max_len` characters
pub fn truncate_middle(text: &str, start: usize, end: usize, max_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len || start + end > chars.len() {
        return text.to_string();
    }

    let mut head: String = chars[..start].iter().collect();
    let tail: String = chars[chars.len() - end..].iter().collect();
    while head.chars().count() + tail.chars().count() < max_len {
        head.push('.');
    }
    head + &tail
}
