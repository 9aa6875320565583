use thiserror::Error;

use super::CapabilityKind;

/// Capability instantiation failure.
///
/// `Clone` because a single in-flight instantiation fans its outcome out to
/// every caller awaiting the shared future.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceLoadError {
    #[error("failed to instantiate {kind} capability: {reason}")]
    InstantiationFailed { kind: CapabilityKind, reason: String },
}

impl ServiceLoadError {
    /// The capability kind whose instantiation failed.
    pub fn kind(&self) -> CapabilityKind {
        match self {
            ServiceLoadError::InstantiationFailed { kind, .. } => *kind,
        }
    }
}
