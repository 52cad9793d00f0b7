use std::time::Duration;

use serde::Serialize;

use crate::model::event::ChangeEvent;

/// Icon class for a notification, chosen by the event that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A new preference appeared.
    NewProperty,
    /// A stale stored format was removed.
    FormatRemoved,
}

/// One transient, user-visible message. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Render the notification for a single change event.
pub fn notification_for(event: &ChangeEvent, duration: Duration) -> Notification {
    let (kind, message) = match event {
        ChangeEvent::FieldAdded { path, value } => (
            NoticeKind::NewProperty,
            format!(
                "Added new property to user object {}: {}",
                path,
                value.display_short()
            ),
        ),
        ChangeEvent::FormatMigrated { path, found } if path.is_root() => (
            NoticeKind::FormatRemoved,
            format!("Removed old preference tree {} format.", found),
        ),
        ChangeEvent::FormatMigrated { path, found } => (
            NoticeKind::FormatRemoved,
            format!("Removed old {} {} format.", path, found),
        ),
    };
    Notification {
        kind,
        message,
        duration,
    }
}

/// Exactly one notification per event, in event order.
pub fn notifications(events: &[ChangeEvent], duration: Duration) -> Vec<Notification> {
    events
        .iter()
        .map(|event| notification_for(event, duration))
        .collect()
}
