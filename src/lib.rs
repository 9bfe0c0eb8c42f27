#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod capabilities;
pub mod code_entry;
pub mod event;
pub mod jobs;
pub mod model;
pub mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{
    HapticKind, HttpRequest, HttpResult, KvOutput, LocalNotification, NotificationData,
};
use crate::model::{AuthFlow, ToastKind};
use crate::session::SessionEvent;

pub use api::{AnalysisOutcome, Block, Chat};
pub use capabilities::{Capabilities, Effect};
pub use code_entry::{CodeEntry, CODE_LENGTH};
pub use event::Event;
pub use jobs::{Drawer, DrawerStep, PendingMarker};
pub use model::{AppVisibility, Model, Secret, Toast};
pub use session::{AuthStep, Session};

pub const PHONE_MIN_DIGITS: usize = 7;
pub const PHONE_MAX_DIGITS: usize = 16;

/// Single durable slot for the in-flight analysis marker. Last write wins;
/// if concurrent analyses are ever allowed this key must become per-chat.
pub const PENDING_ANALYSIS_KEY: &str = "pending_analysis";
pub const INTRO_SEEN_KEY: &str = "intro_seen";

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const PHONE_LENGTH_MESSAGE: &str = "Enter a valid phone number (7 to 16 digits).";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "Enter your two-step verification password.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";
pub const ANALYSIS_READY_TITLE: &str = "Analysis ready";
pub const ANALYSIS_FAILED_TITLE: &str = "Analysis failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Rejected locally before any request was made.
    Validation,
    /// The request never produced a usable response. Always surfaced as the
    /// generic message; detail goes to logs only.
    Transport,
    /// The server refused the operation with a known error code.
    Domain,
    /// The stored session is no longer valid; forces a logout.
    SessionExpired,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    /// User-facing copy, safe to render as-is.
    pub message: String,
    /// Canonical backend code when the failure is a known domain error.
    pub code: Option<String>,
    /// Diagnostic detail, never shown to the user.
    pub internal: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            code: None,
            internal: None,
        }
    }

    #[must_use]
    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: GENERIC_ERROR_MESSAGE.into(),
            code: None,
            internal: Some(detail.into()),
        }
    }

    #[must_use]
    pub fn domain(code: &str, message: &str) -> Self {
        Self {
            kind: ErrorKind::Domain,
            message: message.into(),
            code: Some(code.into()),
            internal: None,
        }
    }

    #[must_use]
    pub fn session_expired() -> Self {
        Self {
            kind: ErrorKind::SessionExpired,
            message: SESSION_EXPIRED_MESSAGE.into(),
            code: None,
            internal: None,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn current_time_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Loading,
    Phone,
    Code,
    Password,
    Chats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatListItem {
    pub id: i64,
    pub title: String,
    pub kind: String,
    pub avatar_url: Option<String>,
    pub can_analyze: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerView {
    pub chat_id: i64,
    pub step: DrawerStep,
    pub kind: Option<String>,
    pub outcome: Option<AnalysisOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub screen: Screen,
    pub country_code: String,
    pub phone_input: String,
    pub code_digits: Vec<Option<u8>>,
    pub code_focus: Option<usize>,
    pub code_error: bool,
    pub submitting: bool,
    pub status: Option<String>,
    pub chats: Vec<ChatListItem>,
    pub chats_loading: bool,
    pub drawers: Vec<DrawerView>,
    pub toast: Option<Toast>,
    pub intro_seen: bool,
}

#[derive(Default)]
pub struct App;

impl App {
    fn post_json<T, F>(
        caps: &Capabilities,
        path: impl Into<String>,
        body: &T,
        make_event: F,
    ) -> bool
    where
        T: Serialize,
        F: FnOnce(HttpResult) -> Event + Send + 'static,
    {
        match HttpRequest::post(path).json(body) {
            Ok(request) => {
                caps.http.send(request, make_event);
                true
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to encode request body");
                false
            }
        }
    }

    fn request_chats(model: &mut Model, caps: &Capabilities) {
        model.chats_loading = true;
        caps.http.send(HttpRequest::get(api::CHATS), |result| {
            Event::ChatsReceived(Box::new(result))
        });
    }

    /// Auto-submit on code completion. The `submitting` flag makes this fire
    /// at most once per outstanding request; it resets when the request
    /// settles or the user navigates away.
    fn maybe_submit_code(model: &mut Model, caps: &Capabilities) {
        if model.auth.submitting {
            return;
        }
        let Some(code) = model.auth.code.value() else {
            return;
        };
        model.auth.submitting = true;
        let request = api::SignInRequest {
            phone: model.session.phone.clone(),
            code,
        };
        if !Self::post_json(caps, api::SIGN_IN, &request, |result| {
            Event::SignInReceived(Box::new(result))
        }) {
            model.auth.submitting = false;
            model.auth.status = Some(GENERIC_ERROR_MESSAGE.into());
        }
    }

    fn complete_authorization(model: &mut Model, caps: &Capabilities) {
        tracing::info!("authorization complete");
        model.session = session::reduce(&model.session, &SessionEvent::Authorized);
        let country_code = std::mem::take(&mut model.auth.country_code);
        model.auth = AuthFlow {
            country_code,
            ..AuthFlow::default()
        };
        caps.haptics.pulse(HapticKind::Success);
        Self::request_chats(model, caps);
    }

    fn reject_code(model: &mut Model, caps: &Capabilities, error: &AppError) {
        tracing::debug!(code = ?error.code, "sign-in rejected");
        model.auth.code_error = true;
        model.auth.status = Some(error.message.clone());
        caps.haptics.pulse(HapticKind::Error);
    }

    fn reject_password(model: &mut Model, caps: &Capabilities, error: &AppError) {
        tracing::debug!(code = ?error.code, "password rejected");
        model.auth.status = Some(error.message.clone());
        caps.haptics.pulse(HapticKind::Error);
    }

    fn expire_session(model: &mut Model) {
        tracing::warn!("session no longer valid; forcing logout");
        model.session = session::reduce(&model.session, &SessionEvent::LoggedOut);
        model.clear_signed_in_state();
        model.show_toast(ToastKind::Failure, SESSION_EXPIRED_MESSAGE);
    }

    /// Issue the analyze request for a drawer that is already `Running`.
    /// Reached from the marker-write completion, so the durable marker is on
    /// disk before the request leaves the core.
    fn send_analyze(chat_id: i64, model: &mut Model, caps: &Capabilities) {
        let Some(drawer) = model.drawers.get(&chat_id) else {
            return;
        };
        if drawer.step != DrawerStep::Running {
            tracing::debug!(chat_id, "drawer reset before analysis request was issued");
            return;
        }
        let Some(kind) = drawer.kind.clone() else {
            return;
        };
        let request = api::AnalyzeRequest {
            kind,
            tone: drawer.tone.clone(),
            language: drawer.language.clone(),
        };
        match HttpRequest::post(api::analyze_path(chat_id)).json(&request) {
            Ok(req) => caps.http.send(req, move |result| Event::AnalysisSettled {
                chat_id,
                result: Box::new(result),
            }),
            Err(error) => {
                tracing::error!(error = %error, "failed to encode analyze request");
                caps.kv.delete(PENDING_ANALYSIS_KEY, |result| {
                    Event::MarkerCleared(Box::new(result))
                });
                let drawer = model.drawer_mut(chat_id);
                drawer.step = DrawerStep::OptionSelection;
                model.show_toast(ToastKind::Failure, GENERIC_ERROR_MESSAGE);
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
        match event {
            // --- Startup and lifecycle ---
            Event::AppStarted => {
                caps.http.send(HttpRequest::get(api::AUTH_STATUS), |result| {
                    Event::AuthStatusReceived(Box::new(result))
                });
                caps.kv.get(INTRO_SEEN_KEY, |result| {
                    Event::IntroFlagLoaded(Box::new(result))
                });
                caps.render.render();
            }

            Event::AuthStatusReceived(result) => {
                let authorized = match api::into_app_result(*result) {
                    Ok(response) => response
                        .json::<api::AuthStatusResponse>()
                        .map(|status| status.authorized)
                        .unwrap_or(false),
                    Err(error) => {
                        tracing::warn!(error = %error, "auth status check failed");
                        false
                    }
                };
                model.session =
                    session::reduce(&model.session, &SessionEvent::StatusChecked { authorized });
                if model.session.authorized {
                    Self::request_chats(model, caps);
                }
                caps.render.render();
            }

            Event::VisibilityChanged { visibility } => {
                let was_background = model.visibility == AppVisibility::Background;
                model.returned_to_foreground =
                    was_background && visibility == AppVisibility::Active;
                model.visibility = visibility;
                if model.returned_to_foreground {
                    // A marker here means a previous run died mid-analysis.
                    // There is no status endpoint to poll, so it is only read
                    // and logged.
                    caps.kv.get(PENDING_ANALYSIS_KEY, |result| {
                        Event::PendingMarkerInspected(Box::new(result))
                    });
                }
                caps.render.render();
            }

            Event::PendingMarkerInspected(result) => match *result {
                Ok(KvOutput::Value(Some(bytes))) => {
                    match serde_json::from_slice::<PendingMarker>(&bytes) {
                        Ok(marker) => tracing::info!(
                            chat_id = marker.chat_id,
                            kind = %marker.kind,
                            "analysis marker found on return to foreground"
                        ),
                        Err(error) => {
                            tracing::warn!(error = %error, "unreadable analysis marker");
                        }
                    }
                }
                Ok(_) => {}
                Err(error) => tracing::warn!(error = %error, "marker inspection failed"),
            },

            Event::IntroFlagLoaded(result) => {
                match *result {
                    Ok(KvOutput::Value(value)) => model.intro_seen = value.is_some(),
                    Ok(_) => {}
                    Err(error) => tracing::warn!(error = %error, "intro flag read failed"),
                }
                caps.render.render();
            }

            Event::IntroCompleted => {
                model.intro_seen = true;
                caps.kv.set(INTRO_SEEN_KEY, b"1".to_vec(), |result| {
                    Event::IntroFlagStored(Box::new(result))
                });
                caps.render.render();
            }

            Event::IntroFlagStored(result) => {
                if let Err(error) = *result {
                    tracing::warn!(error = %error, "intro flag write failed");
                }
            }

            // --- Sign-in flow ---
            Event::CountrySelected { code } => {
                model.auth.country_code = code;
                caps.render.render();
            }

            Event::SubmitPhone { raw } => {
                if model.session.authorized {
                    return;
                }
                model.auth.phone_input.clone_from(&raw);
                let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
                if digits.len() < PHONE_MIN_DIGITS || digits.len() > PHONE_MAX_DIGITS {
                    tracing::debug!(digits = digits.len(), "phone rejected locally");
                    model.auth.status = Some(AppError::validation(PHONE_LENGTH_MESSAGE).message);
                    caps.render.render();
                    return;
                }
                let phone = format!("{}{}", model.auth.country_code, digits);
                model.auth.status = None;
                model.auth.pending_phone = Some(phone.clone());
                let request = api::SendCodeRequest { phone };
                if !Self::post_json(caps, api::SEND_CODE, &request, |result| {
                    Event::SendCodeReceived(Box::new(result))
                }) {
                    model.auth.pending_phone = None;
                    model.auth.status = Some(GENERIC_ERROR_MESSAGE.into());
                }
                caps.render.render();
            }

            Event::ResendCode => {
                if model.session.step != AuthStep::Code || model.session.phone.is_empty() {
                    return;
                }
                let phone = model.session.phone.clone();
                model.auth.pending_phone = Some(phone.clone());
                if !Self::post_json(caps, api::SEND_CODE, &api::SendCodeRequest { phone }, |result| {
                    Event::SendCodeReceived(Box::new(result))
                }) {
                    model.auth.status = Some(GENERIC_ERROR_MESSAGE.into());
                }
                caps.render.render();
            }

            Event::SendCodeReceived(result) => {
                match api::into_app_result(*result) {
                    Ok(response) => {
                        let entering = model.session.step == AuthStep::Phone;
                        if let Some(phone) = model.auth.pending_phone.take() {
                            model.session =
                                session::reduce(&model.session, &SessionEvent::CodeSent { phone });
                        }
                        if entering {
                            model.auth.code.clear();
                            model.auth.code_error = false;
                            model.auth.submitting = false;
                        }
                        model.auth.status = response
                            .json::<api::SendCodeResponse>()
                            .ok()
                            .and_then(|parsed| parsed.message);
                        tracing::debug!("verification code sent");
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "send code failed");
                        model.auth.status = Some(error.message);
                    }
                }
                caps.render.render();
            }

            Event::CodeDigitEntered { index, digit } => {
                if model.session.step != AuthStep::Code {
                    return;
                }
                model.auth.code_error = false;
                model.auth.code.insert(index, digit);
                Self::maybe_submit_code(model, caps);
                caps.render.render();
            }

            Event::CodePasted { index, text } => {
                if model.session.step != AuthStep::Code {
                    return;
                }
                model.auth.code_error = false;
                model.auth.code.paste(index, &text);
                Self::maybe_submit_code(model, caps);
                caps.render.render();
            }

            Event::CodeBackspaced { index } => {
                if model.session.step != AuthStep::Code {
                    return;
                }
                model.auth.code_error = false;
                model.auth.code.backspace(index);
                caps.render.render();
            }

            Event::SignInReceived(result) => {
                if model.session.step != AuthStep::Code {
                    tracing::debug!("sign-in response after leaving code entry; dropped");
                    return;
                }
                model.auth.submitting = false;
                match api::into_app_result(*result) {
                    Ok(response) => {
                        let parsed = response.json::<api::SignInResponse>().unwrap_or_default();
                        if parsed.need_password {
                            // needPassword wins over success
                            model.session =
                                session::reduce(&model.session, &SessionEvent::PasswordRequired);
                            model.auth.code_error = false;
                            model.auth.status = None;
                        } else if parsed.success {
                            Self::complete_authorization(model, caps);
                        } else {
                            let error = api::error_from_code_field(parsed.error.as_deref());
                            Self::reject_code(model, caps, &error);
                        }
                    }
                    Err(error) => Self::reject_code(model, caps, &error),
                }
                caps.render.render();
            }

            Event::SubmitPassword { password } => {
                if model.session.step != AuthStep::Password {
                    return;
                }
                model.auth.password = password;
                let trimmed = model.auth.password.expose().trim().to_owned();
                if trimmed.is_empty() {
                    model.auth.status = Some(AppError::validation(PASSWORD_REQUIRED_MESSAGE).message);
                    caps.render.render();
                    return;
                }
                model.auth.status = None;
                let request = api::PasswordRequest { password: trimmed };
                if !Self::post_json(caps, api::PASSWORD, &request, |result| {
                    Event::PasswordReceived(Box::new(result))
                }) {
                    model.auth.status = Some(GENERIC_ERROR_MESSAGE.into());
                }
                caps.render.render();
            }

            Event::PasswordReceived(result) => {
                if model.session.step != AuthStep::Password {
                    tracing::debug!("password response after leaving password entry; dropped");
                    return;
                }
                match api::into_app_result(*result) {
                    Ok(response) => {
                        let parsed = response.json::<api::PasswordResponse>().unwrap_or_default();
                        if parsed.success {
                            Self::complete_authorization(model, caps);
                        } else {
                            let error = api::error_from_code_field(parsed.error.as_deref());
                            Self::reject_password(model, caps, &error);
                        }
                    }
                    Err(error) => Self::reject_password(model, caps, &error),
                }
                caps.render.render();
            }

            Event::Back => {
                if model.session.authorized || model.session.step == AuthStep::Phone {
                    return;
                }
                model.session = session::reduce(&model.session, &SessionEvent::SteppedBack);
                let country_code = std::mem::take(&mut model.auth.country_code);
                let phone_input = std::mem::take(&mut model.auth.phone_input);
                model.auth = AuthFlow {
                    country_code,
                    phone_input,
                    ..AuthFlow::default()
                };
                caps.render.render();
            }

            Event::Logout => {
                caps.http.send(HttpRequest::post(api::LOGOUT), |result| {
                    Event::LogoutReceived(Box::new(result))
                });
                // local state resets regardless of what the server says
                model.session = session::reduce(&model.session, &SessionEvent::LoggedOut);
                model.clear_signed_in_state();
                caps.render.render();
            }

            Event::LogoutReceived(result) => match api::into_app_result(*result) {
                Ok(_) => tracing::debug!("server-side logout confirmed"),
                Err(error) => tracing::warn!(error = %error, "server-side logout failed"),
            },

            // --- Chats and analysis ---
            Event::LoadChats => {
                if model.session.authorized && !model.chats_loading {
                    Self::request_chats(model, caps);
                }
                caps.render.render();
            }

            Event::ChatsReceived(result) => {
                model.chats_loading = false;
                let parsed = api::into_app_result(*result).and_then(|response| {
                    response
                        .json::<Vec<Chat>>()
                        .map_err(|error| AppError::transport(error.to_string()))
                });
                match parsed {
                    Ok(chats) => {
                        tracing::debug!(count = chats.len(), "chat list loaded");
                        model.chats = chats;
                    }
                    Err(error) if model.session.authorized && api::is_auth_failure(&error) => {
                        Self::expire_session(model);
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "chat list load failed");
                        model.show_toast(ToastKind::Failure, error.message);
                    }
                }
                caps.render.render();
            }

            Event::ChatOpened { chat_id } => {
                model.drawers.entry(chat_id).or_default();
                caps.http.send(
                    HttpRequest::get(api::analyze_possible_path(chat_id)),
                    move |result| Event::AnalyzePossibleReceived {
                        chat_id,
                        result: Box::new(result),
                    },
                );
                caps.render.render();
            }

            Event::AnalyzePossibleReceived { chat_id, result } => {
                let parsed = api::into_app_result(*result).and_then(|response| {
                    response
                        .json::<api::AnalyzePossibleResponse>()
                        .map_err(|error| AppError::transport(error.to_string()))
                });
                match parsed {
                    Ok(response) => {
                        model.analyzable.insert(chat_id, response.possible());
                    }
                    Err(error) if model.session.authorized && api::is_auth_failure(&error) => {
                        Self::expire_session(model);
                    }
                    Err(error) => {
                        tracing::warn!(chat_id, error = %error, "analyze availability check failed");
                        model.analyzable.insert(chat_id, false);
                    }
                }
                caps.render.render();
            }

            Event::AnalysisKindSelected { chat_id, kind } => {
                let drawer = model.drawer_mut(chat_id);
                if drawer.can_start() {
                    drawer.kind = Some(kind);
                    drawer.step = DrawerStep::OptionSelection;
                } else {
                    tracing::debug!(chat_id, "type selection ignored while a job is pending");
                }
                caps.render.render();
            }

            Event::AnalysisOptionsChosen {
                chat_id,
                tone,
                language,
            } => {
                let drawer = model.drawer_mut(chat_id);
                if drawer.step == DrawerStep::OptionSelection {
                    drawer.tone = tone;
                    drawer.language = language;
                }
                caps.render.render();
            }

            Event::StartAnalysis { chat_id } => {
                let Some(title) = model.chat_title(chat_id).map(str::to_owned) else {
                    tracing::warn!(chat_id, "analysis start for unknown chat");
                    return;
                };
                let drawer = model.drawer_mut(chat_id);
                if !drawer.can_start() {
                    tracing::warn!(chat_id, "ignoring analysis start while one is pending");
                    return;
                }
                let Some(kind) = drawer.kind.clone() else {
                    tracing::warn!(chat_id, "analysis start without a selected type");
                    return;
                };
                drawer.step = DrawerStep::Running;
                drawer.outcome = None;
                drawer.error = None;
                let marker = PendingMarker {
                    chat_id,
                    chat_title: title,
                    kind,
                    timestamp: current_time_ms(),
                };
                match serde_json::to_vec(&marker) {
                    Ok(bytes) => {
                        // marker goes to disk before the request is issued;
                        // the POST fires from the write completion
                        caps.kv.set(PENDING_ANALYSIS_KEY, bytes, move |result| {
                            Event::AnalysisMarkerWritten {
                                chat_id,
                                result: Box::new(result),
                            }
                        });
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "failed to encode analysis marker");
                        Self::send_analyze(chat_id, model, caps);
                    }
                }
                caps.render.render();
            }

            Event::AnalysisMarkerWritten { chat_id, result } => {
                if let Err(error) = *result {
                    // the marker is advisory, so a failed write does not
                    // block the analysis itself
                    tracing::warn!(error = %error, "analysis marker write failed");
                }
                Self::send_analyze(chat_id, model, caps);
                caps.render.render();
            }

            Event::AnalysisSettled { chat_id, result } => {
                // marker goes away first, success or failure
                caps.kv.delete(PENDING_ANALYSIS_KEY, |result| {
                    Event::MarkerCleared(Box::new(result))
                });
                // visibility sampled exactly once, at this instant
                let active = model.visibility.is_active();
                let settled = api::into_app_result(*result)
                    .and_then(|response| api::parse_analysis(&response.body));
                if let Err(error) = &settled {
                    if model.session.authorized && api::is_auth_failure(error) {
                        Self::expire_session(model);
                        caps.render.render();
                        return;
                    }
                }
                if active {
                    let drawer = model.drawer_mut(chat_id);
                    drawer.step = DrawerStep::Settled;
                    match settled {
                        Ok(outcome) => {
                            tracing::debug!(chat_id, "analysis settled on screen");
                            drawer.outcome = Some(outcome);
                            drawer.error = None;
                            model.show_toast(ToastKind::Success, ANALYSIS_READY_TITLE);
                            caps.haptics.pulse(HapticKind::Success);
                        }
                        Err(error) => {
                            tracing::warn!(chat_id, error = %error, "analysis failed on screen");
                            drawer.error = Some(error.message.clone());
                            drawer.outcome = None;
                            model.show_toast(ToastKind::Failure, error.message);
                        }
                    }
                } else {
                    // the drawer stays Running and no result is stored; the
                    // user learns of completion through the notification
                    let chat_title = model.chat_title(chat_id).unwrap_or_default().to_owned();
                    let (title, body) = match &settled {
                        Ok(_) => (
                            ANALYSIS_READY_TITLE,
                            format!("Your analysis of \"{chat_title}\" is ready."),
                        ),
                        Err(_) => (
                            ANALYSIS_FAILED_TITLE,
                            format!("The analysis of \"{chat_title}\" could not be completed."),
                        ),
                    };
                    tracing::debug!(chat_id, "analysis settled while backgrounded");
                    caps.notification.post(
                        LocalNotification {
                            title: title.into(),
                            body,
                            data: NotificationData {
                                chat_id,
                                chat_title,
                            },
                        },
                        |result| Event::NotificationPosted(Box::new(result)),
                    );
                }
                caps.render.render();
            }

            Event::MarkerCleared(result) => {
                if let Err(error) = *result {
                    tracing::warn!(error = %error, "failed to clear analysis marker");
                }
            }

            Event::NotificationPosted(result) => {
                if let Err(error) = *result {
                    // delivery is best effort
                    tracing::warn!(error = %error, "completion notification not posted");
                }
            }

            Event::DrawerDismissed { chat_id } => {
                if model.drawers.get(&chat_id).map(|drawer| drawer.step)
                    == Some(DrawerStep::Running)
                {
                    // keep Running state so the in-flight job can settle into it
                    tracing::debug!(chat_id, "drawer closed while running");
                } else {
                    model.drawers.remove(&chat_id);
                }
                caps.render.render();
            }

            Event::ToastDismissed => {
                model.toast = None;
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        let screen = if !model.session.checked {
            Screen::Loading
        } else if model.session.authorized {
            Screen::Chats
        } else {
            match model.session.step {
                AuthStep::Phone => Screen::Phone,
                AuthStep::Code => Screen::Code,
                AuthStep::Password => Screen::Password,
            }
        };
        ViewModel {
            screen,
            country_code: model.auth.country_code.clone(),
            phone_input: model.auth.phone_input.clone(),
            code_digits: model.auth.code.digits(),
            code_focus: model.auth.code.focus(),
            code_error: model.auth.code_error,
            submitting: model.auth.submitting,
            status: model.auth.status.clone(),
            chats: model
                .chats
                .iter()
                .map(|chat| ChatListItem {
                    id: chat.id,
                    title: chat.title.clone(),
                    kind: chat.kind.clone(),
                    avatar_url: chat.avatar_url.clone(),
                    can_analyze: model.analyzable.get(&chat.id).copied().unwrap_or(false),
                })
                .collect(),
            chats_loading: model.chats_loading,
            drawers: model
                .drawers
                .iter()
                .map(|(chat_id, drawer)| DrawerView {
                    chat_id: *chat_id,
                    step: drawer.step,
                    kind: drawer.kind.clone(),
                    outcome: drawer.outcome.clone(),
                    error: drawer.error.clone(),
                })
                .collect(),
            toast: model.toast.clone(),
            intro_seen: model.intro_seen,
        }
    }
}
