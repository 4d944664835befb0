//! Live board subscriptions.

use futures::Stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::Board;

/// A live view of the board.
///
/// Backed by a `watch` channel: readers always see the latest snapshot and
/// intermediate snapshots may be skipped. When the view is fed by a background
/// task (remote change feeds), the task is aborted as soon as the subscription
/// is dropped.
pub struct BoardSubscription {
    receiver: watch::Receiver<Board>,
    feeder: Option<JoinHandle<()>>,
}

impl BoardSubscription {
    /// Subscription over a channel owned by the store itself.
    #[must_use]
    pub const fn new(receiver: watch::Receiver<Board>) -> Self {
        Self {
            receiver,
            feeder: None,
        }
    }

    /// Subscription whose channel is fed by `feeder`.
    #[must_use]
    pub const fn with_feeder(receiver: watch::Receiver<Board>, feeder: JoinHandle<()>) -> Self {
        Self {
            receiver,
            feeder: Some(feeder),
        }
    }

    /// The latest snapshot.
    #[must_use]
    pub fn current(&self) -> Board {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the source is gone, for example when a remote
    /// change feed disconnects.
    pub async fn next(&mut self) -> Option<Board> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Stop receiving updates.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Whether the background feeder (if any) is still running.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.feeder.as_ref().is_none_or(|task| !task.is_finished())
    }

    /// Turn the subscription into a stream: the current snapshot first, then
    /// every update.
    pub fn into_stream(self) -> impl Stream<Item = Board> + Send + 'static {
        let initial = self.current();
        futures::stream::unfold(
            (Some(initial), self),
            |(pending, mut subscription)| async move {
                if let Some(board) = pending {
                    return Some((board, (None, subscription)));
                }
                let board = subscription.next().await?;
                Some((board, (None, subscription)))
            },
        )
    }
}

impl Drop for BoardSubscription {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::domain::{ParticipantName, Reservation, SlotKey};

    fn reserved_board(n: u8) -> Board {
        let reservation = Reservation::new(ParticipantName::parse("Ana").unwrap(), chrono::Utc::now());
        Board::from_reservations([(SlotKey::new(n).unwrap(), reservation)])
    }

    #[tokio::test]
    async fn test_current_then_updates() {
        let (tx, rx) = watch::channel(Board::empty());
        let mut subscription = BoardSubscription::new(rx);
        assert_eq!(subscription.current().free_count(), 100);

        tx.send_replace(reserved_board(5));
        let next = subscription.next().await.unwrap();
        assert_eq!(next.reserved_count(), 1);

        drop(tx);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_yields_initial_snapshot_first() {
        let (tx, rx) = watch::channel(Board::empty());
        let mut stream = Box::pin(BoardSubscription::new(rx).into_stream());

        let first = stream.next().await.unwrap();
        assert_eq!(first.reserved_count(), 0);

        tx.send_replace(reserved_board(9));
        let second = stream.next().await.unwrap();
        assert!(!second.is_free(SlotKey::new(9).unwrap()));
    }

    #[tokio::test]
    async fn test_drop_aborts_feeder() {
        let (tx, rx) = watch::channel(Board::empty());
        let feeder = tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });
        let abort = feeder.abort_handle();

        let subscription = BoardSubscription::with_feeder(rx, feeder);
        assert!(subscription.is_live());
        subscription.unsubscribe();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(abort.is_finished());
    }
}
