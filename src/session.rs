//! Authentication session state.
//!
//! A single `Session` value lives in the model and is only ever replaced
//! through [`reduce`], so every transition is inspectable and testable in
//! isolation from I/O.

use serde::{Deserialize, Serialize};

/// Which screen of the sign-in flow is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    #[default]
    Phone,
    Code,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Whether the server currently recognises this client.
    pub authorized: bool,
    /// Whether the initial authorization check has resolved. Flips to true
    /// once and stays true for the rest of the process lifetime.
    pub checked: bool,
    /// Full phone number (country code + digits) a code was sent to.
    /// Empty until a code has been sent, and again after logout.
    pub phone: String,
    pub step: AuthStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    StatusChecked { authorized: bool },
    CodeSent { phone: String },
    PasswordRequired,
    Authorized,
    SteppedBack,
    LoggedOut,
}

/// Pure session reducer. Events that make no sense in the current state are
/// ignored rather than applied, so the step can never regress except through
/// `SteppedBack` or `LoggedOut`.
#[must_use]
pub fn reduce(session: &Session, event: &SessionEvent) -> Session {
    let mut next = session.clone();
    match event {
        SessionEvent::StatusChecked { authorized } => {
            if !next.checked {
                next.checked = true;
                next.authorized = *authorized;
            }
        }
        SessionEvent::CodeSent { phone } => {
            if !next.authorized && next.step != AuthStep::Password {
                next.phone.clone_from(phone);
                next.step = AuthStep::Code;
            }
        }
        SessionEvent::PasswordRequired => {
            if !next.authorized && next.step == AuthStep::Code {
                next.step = AuthStep::Password;
            }
        }
        SessionEvent::Authorized => {
            next.authorized = true;
            next.step = AuthStep::Phone;
        }
        SessionEvent::SteppedBack => {
            if !next.authorized {
                next.step = AuthStep::Phone;
            }
        }
        SessionEvent::LoggedOut => {
            next = Session {
                authorized: false,
                checked: true,
                phone: String::new(),
                step: AuthStep::Phone,
            };
        }
    }
    next
}
