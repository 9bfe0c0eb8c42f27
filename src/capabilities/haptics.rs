//! Haptic feedback capability. Fire-and-forget: the core decides when a
//! pulse fires, the shell decides whether the device actually vibrates.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum HapticsOperation {
    Pulse(HapticKind),
}

impl Operation for HapticsOperation {
    type Output = ();
}

pub struct Haptics<Ev> {
    context: CapabilityContext<HapticsOperation, Ev>,
}

impl<Ev> Capability<Ev> for Haptics<Ev> {
    type Operation = HapticsOperation;
    type MappedSelf<MappedEv> = Haptics<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Haptics::new(self.context.map_event(f))
    }
}

impl<Ev> Haptics<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<HapticsOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn pulse(&self, kind: HapticKind) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(HapticsOperation::Pulse(kind)).await;
        });
    }
}
