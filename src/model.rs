//! Application model: the single mutable value owned by `App::update`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::Chat;
use crate::code_entry::CodeEntry;
use crate::jobs::Drawer;
use crate::session::Session;

/// OS-reported visibility, fed in by the shell's lifecycle adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppVisibility {
    #[default]
    Active,
    Inactive,
    Background,
}

impl AppVisibility {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Holds the 2FA password without ever letting it reach logs: `Debug` is
/// redacted and the value is only read out at the point of submission.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Transient sign-in flow state. Everything here is cleared by `Back` and
/// `Logout`; durable auth state lives in [`Session`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthFlow {
    pub country_code: String,
    pub phone_input: String,
    /// Full number a send-code request is in flight for; promoted into the
    /// session once the server confirms.
    pub pending_phone: Option<String>,
    pub code: CodeEntry,
    /// Visual error highlight on the code boxes.
    pub code_error: bool,
    /// True while a sign-in request is outstanding. Guards the auto-submit
    /// on code completion against firing twice.
    pub submitting: bool,
    pub password: Secret,
    /// Status or error line under the active input.
    pub status: Option<String>,
}

#[derive(Debug, Default)]
pub struct Model {
    pub session: Session,
    pub auth: AuthFlow,
    pub visibility: AppVisibility,
    /// True only immediately after a background to foreground transition.
    pub returned_to_foreground: bool,
    pub chats: Vec<Chat>,
    pub chats_loading: bool,
    /// Per-chat result of `analyze/possible`.
    pub analyzable: BTreeMap<i64, bool>,
    pub drawers: BTreeMap<i64, Drawer>,
    pub toast: Option<Toast>,
    pub intro_seen: bool,
}

impl Model {
    pub fn show_toast(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast {
            kind,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn chat_title(&self, chat_id: i64) -> Option<&str> {
        self.chats
            .iter()
            .find(|chat| chat.id == chat_id)
            .map(|chat| chat.title.as_str())
    }

    pub fn drawer_mut(&mut self, chat_id: i64) -> &mut Drawer {
        self.drawers.entry(chat_id).or_default()
    }

    /// Local teardown shared by explicit logout and forced session expiry.
    pub fn clear_signed_in_state(&mut self) {
        self.auth = AuthFlow::default();
        self.chats.clear();
        self.chats_loading = false;
        self.analyzable.clear();
        self.drawers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret([REDACTED])");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_clear_signed_in_state() {
        let mut model = Model::default();
        model.auth.status = Some("error".into());
        model.chats.push(Chat {
            id: 1,
            title: "t".into(),
            kind: "private".into(),
            avatar_url: None,
        });
        model.analyzable.insert(1, true);
        model.drawer_mut(1);
        model.clear_signed_in_state();
        assert_eq!(model.auth, AuthFlow::default());
        assert!(model.chats.is_empty());
        assert!(model.analyzable.is_empty());
        assert!(model.drawers.is_empty());
    }

    #[test]
    fn test_chat_title_lookup() {
        let mut model = Model::default();
        model.chats.push(Chat {
            id: 42,
            title: "Family".into(),
            kind: "group".into(),
            avatar_url: None,
        });
        assert_eq!(model.chat_title(42), Some("Family"));
        assert_eq!(model.chat_title(7), None);
    }
}
