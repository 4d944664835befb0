//! Data Transfer Objects for API requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Board, Reservation, SlotKey};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// Create a success response with a custom message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Board snapshot with summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct BoardResponse {
    /// Active storage backend.
    pub backend: &'static str,

    /// Number of free slots.
    pub free: usize,

    /// Number of reserved slots.
    pub reserved: usize,

    /// Every slot, `null` when free.
    pub slots: Board,
}

impl BoardResponse {
    /// Summarize a board.
    #[must_use]
    pub fn new(backend: &'static str, board: Board) -> Self {
        Self {
            backend,
            free: board.free_count(),
            reserved: board.reserved_count(),
            slots: board,
        }
    }
}

/// State of a single slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResponse {
    /// Slot number, zero padded.
    pub number: SlotKey,

    /// Whether the slot can still be claimed.
    pub free: bool,

    /// Holder of the slot.
    pub name: Option<String>,

    /// When the slot was claimed.
    pub time: Option<DateTime<Utc>>,
}

impl SlotResponse {
    /// Describe a slot.
    #[must_use]
    pub fn new(number: SlotKey, reservation: Option<&Reservation>) -> Self {
        Self {
            number,
            free: reservation.is_none(),
            name: reservation.map(|r| r.participant_name.clone()),
            time: reservation.map(|r| r.reserved_at),
        }
    }
}

/// Request to claim a slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    /// Participant name; trimmed before use.
    #[serde(default)]
    pub name: String,
}

/// A successful claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    /// Claimed slot.
    pub number: SlotKey,

    /// Participant name as stored.
    pub name: String,

    /// Claim time.
    pub time: DateTime<Utc>,
}

impl ClaimResponse {
    /// Build the response for a stored reservation.
    #[must_use]
    pub fn new(number: SlotKey, reservation: Reservation) -> Self {
        Self {
            number,
            name: reservation.participant_name,
            time: reservation.reserved_at,
        }
    }
}

/// Request to reset the board.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequest {
    /// Must be `true`; resetting is irreversible.
    #[serde(default)]
    pub confirm: bool,
}

/// Outcome of a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReport {
    /// Number of reservations removed.
    pub cleared: usize,
}
