//! Board handlers: snapshot, live events, slot lookup and claims.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::api::state::AppState;
use crate::domain::{
    ApiResponse, BoardResponse, ClaimRequest, ClaimResponse, SlotKey, SlotResponse,
};
use crate::error::{AppError, Result};

/// Parse the `{number}` path segment.
fn parse_slot(raw: &str) -> Result<SlotKey> {
    raw.parse::<SlotKey>()
        .map_err(|e| AppError::InvalidSlot(e.to_string()))
}

/// Current board with free and reserved counts.
pub async fn get_board(State(state): State<AppState>) -> Result<Json<ApiResponse<BoardResponse>>> {
    let board = state.board_service.board().await?;
    let backend = state.board_service.backend_name();

    Ok(Json(ApiResponse::success(BoardResponse::new(backend, board))))
}

/// Server-sent `board` events: the current board first, then every change.
///
/// The subscription lives as long as the client connection; dropping the
/// stream unsubscribes.
pub async fn board_events(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let subscription = state.board_service.subscribe().await?;
    let backend = state.board_service.backend_name();

    let events = subscription.into_stream().map(move |board| {
        Event::default()
            .event("board")
            .json_data(BoardResponse::new(backend, board))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// State of one slot.
pub async fn get_slot(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<ApiResponse<SlotResponse>>> {
    let slot = parse_slot(&number)?;
    let board = state.board_service.board().await?;

    Ok(Json(ApiResponse::success(SlotResponse::new(
        slot,
        board.get(slot),
    ))))
}

/// Claim a slot if it is still free.
pub async fn claim(
    State(state): State<AppState>,
    Path(number): Path<String>,
    payload: std::result::Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ClaimResponse>>> {
    let slot = parse_slot(&number)?;
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let reservation = state.board_service.claim(slot, &request.name).await?;

    Ok(Json(ApiResponse::with_message(
        ClaimResponse::new(slot, reservation),
        format!("Number {slot} reserved"),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot() {
        assert_eq!(parse_slot("07").unwrap().number(), 7);
        assert!(matches!(parse_slot("7"), Err(AppError::InvalidSlot(_))));
        assert!(matches!(parse_slot("100"), Err(AppError::InvalidSlot(_))));
        assert!(matches!(parse_slot("ab"), Err(AppError::InvalidSlot(_))));
    }
}
