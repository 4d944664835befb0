//! Board, reservation and the claim decision shared by every backend.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use super::slot::{SLOT_COUNT, SlotKey, all_slots};
use crate::error::{AppError, Result};

/// A claimed slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Name of the participant holding the slot.
    #[serde(rename = "name")]
    pub participant_name: String,

    /// When the slot was claimed.
    #[serde(rename = "time")]
    pub reserved_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a reservation.
    #[must_use]
    pub fn new(participant_name: ParticipantName, reserved_at: DateTime<Utc>) -> Self {
        Self {
            participant_name: participant_name.into_inner(),
            reserved_at,
        }
    }
}

/// A validated participant name: trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantName(String);

impl ParticipantName {
    /// Validate raw user input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` when the input is empty or whitespace only.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput(
                "participant name cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the name.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Decide whether a claim may proceed.
///
/// Both store backends read the slot's current state inside their atomic step
/// and call this; a free slot yields the reservation to write, a reserved one
/// yields `AlreadyReserved` naming the holder.
///
/// # Errors
///
/// Returns `AppError::AlreadyReserved` when `existing` is `Some`.
pub fn decide_claim(
    slot: SlotKey,
    existing: Option<&Reservation>,
    name: ParticipantName,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    if let Some(holder) = existing {
        return Err(AppError::AlreadyReserved {
            slot,
            name: holder.participant_name.clone(),
        });
    }
    Ok(Reservation::new(name, now))
}

/// The full 100-slot state.
///
/// Every slot is always present; a free slot holds `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    slots: Vec<Option<Reservation>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// A board with every slot free.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: vec![None; SLOT_COUNT],
        }
    }

    /// Build a board from reserved entries; unlisted slots are free.
    pub fn from_reservations<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (SlotKey, Reservation)>,
    {
        let mut board = Self::empty();
        for (slot, reservation) in entries {
            board.set(slot, Some(reservation));
        }
        board
    }

    /// Reservation held on a slot, if any.
    #[must_use]
    pub fn get(&self, slot: SlotKey) -> Option<&Reservation> {
        self.slots[slot.index()].as_ref()
    }

    /// Replace a slot's state.
    pub fn set(&mut self, slot: SlotKey, reservation: Option<Reservation>) {
        self.slots[slot.index()] = reservation;
    }

    /// Whether the slot is free.
    #[must_use]
    pub fn is_free(&self, slot: SlotKey) -> bool {
        self.get(slot).is_none()
    }

    /// Iterate every slot in numbering order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, Option<&Reservation>)> {
        all_slots().zip(self.slots.iter().map(Option::as_ref))
    }

    /// Number of free slots.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Number of reserved slots.
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        SLOT_COUNT - self.free_count()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SLOT_COUNT))?;
        for (slot, reservation) in self.iter() {
            map.serialize_entry(&slot, &reservation)?;
        }
        map.end()
    }
}

/// Reads leniently, one entry at a time: missing keys are free, unknown keys
/// are ignored, a reservation with a blank name counts as free and a malformed
/// entry is skipped without affecting the others.
impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = HashMap::<String, Value>::deserialize(deserializer)?;
        let entries = raw.into_iter().filter_map(|(key, value)| {
            let slot = key.parse::<SlotKey>().ok()?;
            if value.is_null() {
                return None;
            }
            let reservation = match serde_json::from_value::<Reservation>(value) {
                Ok(reservation) => reservation,
                Err(e) => {
                    warn!(slot = %key, error = %e, "Skipping unreadable reservation");
                    return None;
                }
            };
            if reservation.participant_name.trim().is_empty() {
                return None;
            }
            Some((slot, reservation))
        });
        Ok(Self::from_reservations(entries))
    }
}
