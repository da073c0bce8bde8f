//! Broadcast hub for leave change events.

use tokio::sync::broadcast;

use kawani_core::leave::{ChangeNotifier, LeaveChangeEvent, NotifyError};

/// Fans leave change events out to every connected subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<LeaveChangeEvent>,
}

impl BroadcastNotifier {
    /// Creates a hub buffering up to `capacity` events per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LeaveChangeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify(&self, event: LeaveChangeEvent) -> Result<(), NotifyError> {
        // Nobody listening is not a failure.
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| NotifyError::Closed)
    }
}
