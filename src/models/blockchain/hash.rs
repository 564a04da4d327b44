//! 256-bit hash type used for block and transaction identifiers.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Length in bytes of a [`Uint256`]
pub const UINT256_SIZE: usize = 32;

/// Errors produced when parsing a [`Uint256`] from text
#[derive(Debug, Error, PartialEq)]
pub enum HashParseError {
	#[error("invalid hex: {0}")]
	InvalidHex(#[from] hex::FromHexError),

	#[error("invalid hash length: expected {UINT256_SIZE} bytes, got {0}")]
	InvalidLength(usize),
}

/// A 32-byte hash as returned by the node (block hashes, transaction hashes, roots)
///
/// The text form is the lowercase hex string exactly as the node prints it, so a value
/// read from one response can be passed back verbatim in a later request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Uint256([u8; UINT256_SIZE]);

impl Uint256 {
	/// The all-zero hash
	pub const EMPTY: Uint256 = Uint256([0u8; UINT256_SIZE]);

	pub const fn from_bytes(bytes: [u8; UINT256_SIZE]) -> Self {
		Self(bytes)
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self, HashParseError> {
		let array: [u8; UINT256_SIZE] = bytes
			.try_into()
			.map_err(|_| HashParseError::InvalidLength(bytes.len()))?;
		Ok(Self(array))
	}

	pub fn as_bytes(&self) -> &[u8; UINT256_SIZE] {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		*self == Self::EMPTY
	}

	pub fn to_hex_string(&self) -> String {
		hex::encode(self.0)
	}
}

impl FromStr for Uint256 {
	type Err = HashParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		let trimmed = trimmed
			.strip_prefix("0x")
			.or_else(|| trimmed.strip_prefix("0X"))
			.unwrap_or(trimmed);
		let bytes = hex::decode(trimmed)?;
		Self::from_slice(&bytes)
	}
}

impl fmt::Display for Uint256 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex_string())
	}
}

impl fmt::Debug for Uint256 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Uint256({})", self.to_hex_string())
	}
}

impl Serialize for Uint256 {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_hex_string())
	}
}

impl<'de> Deserialize<'de> for Uint256 {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Uint256::from_str(&s).map_err(de::Error::custom)
	}
}
