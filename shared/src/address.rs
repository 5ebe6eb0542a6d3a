use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const ADDRESS_LENGTH: usize = 32;

/// Errors that can occur while parsing an account address from its text form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The text was not valid base58
    #[error("Address '{text}' is not valid base58")]
    InvalidEncoding { text: String },

    /// The decoded bytes had the wrong length
    #[error("Address decoded to {actual} bytes, expected 32")]
    InvalidLength { actual: usize },
}

/// A ledger account address. Canonical text form is base58.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; ADDRESS_LENGTH] {
        self.0
    }

    /// The all-zero address, which the ledger uses to mean "unset".
    pub fn is_unset(&self) -> bool {
        self.0 == [0; ADDRESS_LENGTH]
    }

    /// Some(self) unless this is the unset address.
    pub fn non_default(self) -> Option<Self> {
        if self.is_unset() {
            None
        } else {
            Some(self)
        }
    }

    /// First 8 characters of the canonical form, for logs.
    pub fn short(&self) -> String {
        let mut text = self.to_string();
        text.truncate(8);
        text
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(text)
            .into_vec()
            .map_err(|_| AddressError::InvalidEncoding {
                text: text.to_string(),
            })?;
        let array: [u8; ADDRESS_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::from_str(&text).map_err(serde::de::Error::custom)
    }
}
