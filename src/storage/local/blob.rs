//! The local board blob: one JSON object keyed `"00"`..`"99"`, each value
//! `null` or `{"name": ..., "time": <ISO-8601>}`.

use crate::domain::Board;
use crate::error::StorageResult;

/// Serialize a board into the blob format.
///
/// # Errors
///
/// Returns a serialization error if the board cannot be encoded.
pub fn encode(board: &Board) -> StorageResult<String> {
    Ok(serde_json::to_string(board)?)
}

/// Parse a blob back into a board.
///
/// Missing keys read as free slots and unknown keys are ignored.
///
/// # Errors
///
/// Returns a serialization error if the blob is not valid JSON of the expected shape.
pub fn decode(raw: &str) -> StorageResult<Board> {
    Ok(serde_json::from_str(raw)?)
}
