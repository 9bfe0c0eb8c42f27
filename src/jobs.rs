//! Per-chat analysis drawer state and the durable in-flight marker.

use serde::{Deserialize, Serialize};

use crate::api::AnalysisOutcome;

/// Drawer lifecycle for one chat's analysis flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawerStep {
    #[default]
    TypeSelection,
    OptionSelection,
    Running,
    Settled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawer {
    pub step: DrawerStep,
    pub kind: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
    pub outcome: Option<AnalysisOutcome>,
    pub error: Option<String>,
}

impl Drawer {
    /// A new job may only start from the selection steps. `Running` means one
    /// is already in flight; `Settled` means a result is still on screen.
    #[must_use]
    pub const fn can_start(&self) -> bool {
        matches!(self.step, DrawerStep::TypeSelection | DrawerStep::OptionSelection)
    }
}

/// Durable record that an analysis request is in flight, written before the
/// request is issued and deleted when it settles. Purely advisory: the server
/// owns the job, and a marker left behind by a killed process is only ever
/// read and logged, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMarker {
    pub chat_id: i64,
    pub chat_title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: u64,
}
