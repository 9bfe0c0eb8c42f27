//! Local notification capability.
//!
//! Used for exactly one thing: telling the user an analysis settled while the
//! app was not on screen. Delivery is immediate and best-effort; the shell
//! owns permission prompts and may drop the request entirely.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload attached to the notification so a tap can route back to the right
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub chat_id: i64,
    pub chat_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum NotificationOperation {
    Post(LocalNotification),
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationError {
    #[error("notification permission denied")]
    PermissionDenied,

    #[error("notifications unavailable on this platform")]
    Unavailable,

    #[error("failed to post notification: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationOutput {
    Posted,
}

pub type NotificationResult = Result<NotificationOutput, NotificationError>;

impl Operation for NotificationOperation {
    type Output = NotificationResult;
}

pub struct Notification<Ev> {
    context: CapabilityContext<NotificationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Notification<Ev> {
    type Operation = NotificationOperation;
    type MappedSelf<MappedEv> = Notification<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Notification::new(self.context.map_event(f))
    }
}

impl<Ev> Notification<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<NotificationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn post<F>(&self, notification: LocalNotification, make_event: F)
    where
        F: FnOnce(NotificationResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(NotificationOperation::Post(notification))
                .await;
            context.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_wire_format() {
        let operation = NotificationOperation::Post(LocalNotification {
            title: "Analysis ready".into(),
            body: "Your analysis of \"Family\" is ready.".into(),
            data: NotificationData {
                chat_id: 42,
                chat_title: "Family".into(),
            },
        });
        let json = serde_json::to_value(&operation).expect("serializes");
        assert_eq!(json["data"]["data"]["chatId"], 42);
        assert_eq!(json["data"]["data"]["chatTitle"], "Family");
    }

    #[test]
    fn test_operation_round_trip() {
        let operation = NotificationOperation::Post(LocalNotification {
            title: "t".into(),
            body: "b".into(),
            data: NotificationData {
                chat_id: 1,
                chat_title: "c".into(),
            },
        });
        let json = serde_json::to_string(&operation).expect("serializes");
        let back: NotificationOperation = serde_json::from_str(&json).expect("parses");
        assert_eq!(back, operation);
    }
}
