//! Every input the core reacts to: user intents from the UI, lifecycle
//! signals from the shell, and completions of capability requests.
//!
//! Capability results are boxed to keep the enum small; `update` matches on
//! the dereferenced value.

use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult, NotificationResult};
use crate::model::{AppVisibility, Secret};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // --- Startup and lifecycle ---
    AppStarted,
    VisibilityChanged { visibility: AppVisibility },
    AuthStatusReceived(Box<HttpResult>),
    IntroFlagLoaded(Box<KvResult>),
    IntroFlagStored(Box<KvResult>),
    IntroCompleted,
    /// Marker read triggered by a return to foreground. Logged, never acted on.
    PendingMarkerInspected(Box<KvResult>),

    // --- Sign-in flow ---
    CountrySelected { code: String },
    SubmitPhone { raw: String },
    SendCodeReceived(Box<HttpResult>),
    CodeDigitEntered { index: usize, digit: char },
    CodePasted { index: usize, text: String },
    CodeBackspaced { index: usize },
    ResendCode,
    SignInReceived(Box<HttpResult>),
    SubmitPassword { password: Secret },
    PasswordReceived(Box<HttpResult>),
    Back,
    Logout,
    LogoutReceived(Box<HttpResult>),

    // --- Chats and analysis ---
    LoadChats,
    ChatsReceived(Box<HttpResult>),
    ChatOpened { chat_id: i64 },
    AnalyzePossibleReceived { chat_id: i64, result: Box<HttpResult> },
    AnalysisKindSelected { chat_id: i64, kind: String },
    AnalysisOptionsChosen {
        chat_id: i64,
        tone: Option<String>,
        language: Option<String>,
    },
    StartAnalysis { chat_id: i64 },
    AnalysisMarkerWritten { chat_id: i64, result: Box<KvResult> },
    AnalysisSettled { chat_id: i64, result: Box<HttpResult> },
    MarkerCleared(Box<KvResult>),
    NotificationPosted(Box<NotificationResult>),
    DrawerDismissed { chat_id: i64 },

    ToastDismissed,
}
