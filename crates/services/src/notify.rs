//! Decoupled delivery of newly-earned badges.
//!
//! A save can be triggered from a context the UI is no longer synchronously
//! watching, so badge announcements go through an injected notifier rather
//! than only the save's return value.

use quiz_core::model::Badge;
use tokio::sync::broadcast;

/// Receives the newly-earned badges of one save, after the transaction
/// committed. Implementations must not block.
pub trait BadgeNotifier: Send + Sync {
    fn badges_earned(&self, badges: &[Badge]);
}

/// Notifier that drops every announcement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl BadgeNotifier for NullNotifier {
    fn badges_earned(&self, _badges: &[Badge]) {}
}

/// Fan-out notifier over a tokio broadcast channel; subscribers that lag or
/// disappear never block the save path.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Vec<Badge>>,
}

impl BroadcastNotifier {
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, broadcast::Receiver<Vec<Badge>>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (Self { sender }, receiver)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Badge>> {
        self.sender.subscribe()
    }
}

impl BadgeNotifier for BroadcastNotifier {
    fn badges_earned(&self, badges: &[Badge]) {
        // A send error just means no subscriber is listening right now.
        let _ = self.sender.send(badges.to_vec());
    }
}
