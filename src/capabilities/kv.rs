//! Durable key-value capability.
//!
//! Backs the in-flight analysis marker and the intro-seen flag. The shell
//! persists values across process restarts (UserDefaults / SharedPreferences
//! class storage); writes to the same key are last-write-wins.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 128;
pub const MAX_VALUE_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data")]
pub enum KvOperation {
    Get { key: String },
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl KvOperation {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Get { key } | Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value of {size} bytes exceeds maximum of {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage failure: {0}")]
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum KvOutput {
    /// Result of a `Get`; `None` when the key is absent.
    Value(Option<Vec<u8>>),
    Written,
    Deleted,
}

pub type KvResult = Result<KvOutput, KvError>;

impl Operation for KvOperation {
    type Output = KvResult;
}

fn validate_key(key: &str) -> Result<(), KvError> {
    if key.is_empty() {
        return Err(KvError::InvalidKey {
            key: key.into(),
            reason: "key must not be empty".into(),
        });
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KvError::InvalidKey {
            key: key.into(),
            reason: format!("key exceeds {MAX_KEY_LENGTH} bytes"),
        });
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(KvError::InvalidKey {
            key: key.into(),
            reason: "keys are limited to [A-Za-z0-9_.-]".into(),
        });
    }
    Ok(())
}

pub struct Kv<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> Capability<Ev> for Kv<Ev> {
    type Operation = KvOperation;
    type MappedSelf<MappedEv> = Kv<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Kv::new(self.context.map_event(f))
    }
}

impl<Ev> Kv<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.run(KvOperation::Get { key: key.into() }, make_event);
    }

    pub fn set<F>(&self, key: impl Into<String>, value: Vec<u8>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.run(
            KvOperation::Set {
                key: key.into(),
                value,
            },
            make_event,
        );
    }

    pub fn delete<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.run(KvOperation::Delete { key: key.into() }, make_event);
    }

    /// Invalid operations are rejected locally and still produce a result
    /// event, so callers see a single completion path.
    fn run<F>(&self, operation: KvOperation, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = match Self::validate(&operation) {
                Ok(()) => context.request_from_shell(operation).await,
                Err(error) => Err(error),
            };
            context.update_app(make_event(result));
        });
    }

    fn validate(operation: &KvOperation) -> Result<(), KvError> {
        validate_key(operation.key())?;
        if let KvOperation::Set { value, .. } = operation {
            if value.len() > MAX_VALUE_SIZE {
                return Err(KvError::ValueTooLarge {
                    size: value.len(),
                    max: MAX_VALUE_SIZE,
                });
            }
        }
        Ok(())
    }
}
