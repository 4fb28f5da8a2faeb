//! Driven port for ride change event fan-out.

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::events::RideEvent;

/// Bounded per-subscriber buffer. A subscriber that falls this far behind
/// observes a lag and must resynchronise by refetching.
pub const EVENT_BUFFER: usize = 256;

/// Publish side of the ride change feed.
///
/// Publishing never blocks and never fails: subscribers that cannot keep
/// up lose old events and recover through a resync, and an absent audience
/// is not an error.
#[cfg_attr(test, mockall::automock)]
pub trait RideEvents: Send + Sync {
    /// Emit an event to every live subscriber.
    fn publish(&self, event: RideEvent);

    /// Open a new subscription starting at the current head.
    fn subscribe(&self) -> broadcast::Receiver<RideEvent>;
}

/// [`RideEvents`] backed by a Tokio broadcast channel.
#[derive(Debug)]
pub struct BroadcastRideEvents {
    sender: broadcast::Sender<RideEvent>,
}

impl BroadcastRideEvents {
    /// Create a feed with the default buffer size.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }
}

impl Default for BroadcastRideEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl RideEvents for BroadcastRideEvents {
    fn publish(&self, event: RideEvent) {
        // send only errs when no receiver exists, which is fine.
        if self.sender.send(event).is_err() {
            debug!(ride_id = %event.ride_id, "ride event dropped: no subscribers");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<RideEvent> {
        self.sender.subscribe()
    }
}
