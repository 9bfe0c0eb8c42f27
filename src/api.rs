//! Wire types and paths for the backend API.
//!
//! Paths are relative; the shell owns the base URL, TLS and the cookie jar,
//! and sends every request with credentials included.

use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResponse, HttpResult};
use crate::{AppError, ErrorKind};

pub const AUTH_STATUS: &str = "/auth/status";
pub const SEND_CODE: &str = "/auth/send-code";
pub const SIGN_IN: &str = "/auth/sign-in";
pub const PASSWORD: &str = "/auth/password";
pub const CHATS: &str = "/chats";
// Historical asymmetry on the backend, kept as-is.
pub const LOGOUT: &str = "/api/auth/logout";

#[must_use]
pub fn analyze_possible_path(chat_id: i64) -> String {
    format!("/chats/{chat_id}/analyze/possible")
}

#[must_use]
pub fn analyze_path(chat_id: i64) -> String {
    format!("/chats/{chat_id}/analyze")
}

// --- Requests ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendCodeRequest {
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

// --- Responses ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthStatusResponse {
    pub authorized: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendCodeResponse {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignInResponse {
    pub need_password: bool,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// `analyze/possible` has returned both a bare boolean and a wrapped object
/// across backend versions; accept either.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnalyzePossibleResponse {
    Flag(bool),
    Object { possible: bool },
}

impl AnalyzePossibleResponse {
    #[must_use]
    pub const fn possible(&self) -> bool {
        match self {
            Self::Flag(value) | Self::Object { possible: value } => *value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub header: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Normalized analyze result. Exactly one side is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
}

/// The analyze endpoint has shipped three response shapes: `{analysis}`,
/// `{blocks}` and a bare block array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAnalyzeResponse {
    Wrapped {
        #[serde(default)]
        analysis: Option<String>,
        #[serde(default)]
        blocks: Option<Vec<Block>>,
    },
    Bare(Vec<Block>),
}

pub fn parse_analysis(body: &[u8]) -> Result<AnalysisOutcome, AppError> {
    let raw: RawAnalyzeResponse =
        serde_json::from_slice(body).map_err(|e| AppError::transport(e.to_string()))?;
    Ok(match raw {
        RawAnalyzeResponse::Wrapped { analysis, blocks } => AnalysisOutcome { analysis, blocks },
        RawAnalyzeResponse::Bare(blocks) => AnalysisOutcome {
            analysis: None,
            blocks: Some(blocks),
        },
    })
}

// --- Error interpretation ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiErrorBody {
    code: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// Known backend error codes and the copy shown for each. Anything not in
/// this table collapses to the generic message.
#[must_use]
pub fn message_for_code(code: &str) -> Option<(&'static str, &'static str)> {
    let normalized = code.trim().to_ascii_lowercase().replace('_', "-");
    Some(match normalized.as_str() {
        "invalid-phone" | "phone-number-invalid" => {
            ("invalid-phone", "That phone number doesn't look right.")
        }
        "flood-wait" | "too-many-requests" => (
            "flood-wait",
            "Too many attempts. Please wait a moment and try again.",
        ),
        "code-expired" | "phone-code-expired" => {
            ("code-expired", "That code has expired. Request a new one.")
        }
        "code-invalid" | "phone-code-invalid" => ("code-invalid", "That code is incorrect."),
        "not-authorized" | "unauthorized" => (
            "not-authorized",
            "Your session has ended. Please sign in again.",
        ),
        "chat-not-found" => (
            "chat-not-found",
            "That conversation is no longer available.",
        ),
        _ => return None,
    })
}

/// Map an error code field from a response body onto the taxonomy.
#[must_use]
pub fn error_from_code_field(code: Option<&str>) -> AppError {
    match code.and_then(message_for_code) {
        Some((canonical, message)) => AppError::domain(canonical, message),
        None => AppError::transport(format!(
            "unrecognised error code: {}",
            code.unwrap_or("<none>")
        )),
    }
}

/// Interpret a non-2xx response: look for a known code in `code`, `error`
/// then `message`, falling back to the status line.
#[must_use]
pub fn error_from_response(response: &HttpResponse) -> AppError {
    let body: ApiErrorBody = serde_json::from_slice(&response.body).unwrap_or_default();
    let code = body.code.or(body.error).or(body.message);
    if let Some((canonical, message)) = code.as_deref().and_then(message_for_code) {
        return AppError::domain(canonical, message);
    }
    if response.status == 401 {
        return AppError::session_expired();
    }
    AppError::transport(format!("http status {}", response.status))
}

/// Collapse transport failures and non-2xx statuses into the error taxonomy.
pub fn into_app_result(result: HttpResult) -> Result<HttpResponse, AppError> {
    match result {
        Ok(response) if response.is_success() => Ok(response),
        Ok(response) => Err(error_from_response(&response)),
        Err(error) => Err(AppError::transport(error.to_string())),
    }
}

/// Whether this failure means the stored session is no longer valid.
#[must_use]
pub fn is_auth_failure(error: &AppError) -> bool {
    error.kind == ErrorKind::SessionExpired || error.code.as_deref() == Some("not-authorized")
}
