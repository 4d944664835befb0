//! Slot keys and board numbering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of slots on a board.
pub const SLOT_COUNT: usize = 100;

/// A slot on the board, `00` through `99`.
///
/// Always displayed as a zero-padded two-digit key; parsing accepts exactly
/// two ASCII digits, so `"5"` and `"005"` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(u8);

impl SlotKey {
    /// Create a slot key from its numeric value.
    ///
    /// Returns `None` when `number` is outside `0..=99`.
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if (number as usize) < SLOT_COUNT {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Numeric value of the slot.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Position of the slot in numbering order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Error returned when a string is not a valid slot key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a slot number between 00 and 99")]
pub struct ParseSlotKeyError(pub String);

impl FromStr for SlotKey {
    type Err = ParseSlotKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] => {
                Ok(Self((tens - b'0') * 10 + (ones - b'0')))
            }
            _ => Err(ParseSlotKeyError(s.to_string())),
        }
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// All slot keys in ascending order.
pub fn all_slots() -> impl DoubleEndedIterator<Item = SlotKey> + ExactSizeIterator {
    #[allow(clippy::cast_possible_truncation)]
    (0..SLOT_COUNT).map(|n| SlotKey(n as u8))
}

/// The board numbering: `["00", "01", ..., "99"]`.
///
/// Board initialization, grid iteration and export rows all walk this order.
#[must_use]
pub fn slot_keys() -> Vec<String> {
    all_slots().map(|slot| slot.to_string()).collect()
}
