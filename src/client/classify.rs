use crate::models::{Notification, NotificationKind};

/// Notifications split by which app bar badge counts them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifiedNotifications {
    /// Direct messages, counted on the chat badge.
    pub message: Vec<Notification>,
    /// Everything else, counted on the notifications badge.
    pub regular: Vec<Notification>,
}

impl ClassifiedNotifications {
    pub fn message_count(&self) -> usize {
        self.message.len()
    }

    pub fn regular_count(&self) -> usize {
        self.regular.len()
    }
}

/// Partitions every notification into exactly one bucket, keeping the server's order.
pub fn classify_notifications(notifications: Vec<Notification>) -> ClassifiedNotifications {
    let (message, regular): (Vec<_>, Vec<_>) = notifications
        .into_iter()
        .partition(|notification| notification.kind == NotificationKind::Message);

    ClassifiedNotifications { message, regular }
}
