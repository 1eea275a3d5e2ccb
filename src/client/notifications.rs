#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: "Success".to_string(),
            description: description.to_string(),
        }
    }

    pub fn error(description: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: "Error".to_string(),
            description: description.to_string(),
        }
    }
}

/// Where user-facing notices go. The presentation layer plugs its toast
/// widget in here.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notices to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                log::info!("{}: {}", notification.message, notification.description)
            }
            NotificationKind::Error => {
                log::warn!("{}: {}", notification.message, notification.description)
            }
        }
    }
}
