//! Per-room fan-out of countdown values

use tokio::sync::broadcast;
use tracing::trace;

/// Values buffered per subscriber before it starts lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Publish/subscribe channel scoped to one room.
///
/// Publishing is fire-and-forget: a room without subscribers, or a
/// subscriber that has already gone away, is not an error for the caller.
#[derive(Debug)]
pub struct RoomChannel {
    room_id: String,
    sender: broadcast::Sender<u32>,
}

impl RoomChannel {
    pub fn new(room_id: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            room_id: room_id.into(),
            sender,
        }
    }

    /// Deliver `remaining` to every current subscriber.
    ///
    /// Returns the number of subscribers it was queued for.
    pub fn publish(&self, remaining: u32) -> usize {
        match self.sender.send(remaining) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No subscribers for room {}, dropped update {}", self.room_id, remaining);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<u32> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
