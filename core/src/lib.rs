//! LavishLair Core Library
//!
//! Chain primitives shared by the governance client:
//! - 20-byte account addresses and 32-byte hashes
//! - Keccak-256 hashing, function selectors and event topics
//! - Solidity ABI encoding/decoding for the governor and token calls
//! - Decimal <-> minor-unit amount conversion

pub mod abi;
pub mod address;
pub mod hash;
pub mod units;

// Re-export main types
pub use abi::{AbiError, ParamType, Token};
pub use address::{Address, AddressError, TxHash};
pub use hash::{event_topic, keccak256, selector};
pub use units::{format_units, parse_units, UnitError, ETHER_DECIMALS};

/// Alias used for every uint256 quantity (ids, values, tallies, amounts)
pub type U256 = num_bigint::BigUint;
