//! Capability declarations. Everything the core asks of the outside world
//! goes through one of these; the shell resolves each operation and feeds
//! the result back in as an event.

pub mod haptics;
pub mod http;
pub mod kv;
pub mod notification;

pub use haptics::{HapticKind, Haptics, HapticsOperation};
pub use http::{Http, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult};
pub use kv::{Kv, KvError, KvOperation, KvOutput, KvResult};
pub use notification::{
    LocalNotification, Notification, NotificationData, NotificationError, NotificationOperation,
    NotificationOutput, NotificationResult,
};

use crux_core::render::Render;

use crate::{App, Event};

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: Kv<Event>,
    pub notification: Notification<Event>,
    pub haptics: Haptics<Event>,
}
