//! Domain models for the raffle board.
//!
//! Slots and their numbering, reservations, the board, and API contracts.

pub mod board;
pub mod dto;
pub mod slot;

pub use board::{Board, ParticipantName, Reservation, decide_claim};
pub use dto::{
    ApiResponse, BoardResponse, ClaimRequest, ClaimResponse, ResetReport, ResetRequest,
    SlotResponse,
};
pub use slot::{ParseSlotKeyError, SLOT_COUNT, SlotKey, all_slots, slot_keys};
