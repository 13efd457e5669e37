//! Error types for server resolution

use thiserror::Error;

use crate::client::ClientError;

/// Result type for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors returned by the resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The cloud API failed for a reason other than absence
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// Neither the cloud API nor the inventory knows the server.
    ///
    /// Callers treat this as "deregister the node", so it must stay
    /// distinguishable from every other failure.
    #[error("instance not found")]
    InstanceNotFound,

    /// Provider ID does not follow `hcloud://<id>`
    #[error("{reason}: {provider_id}")]
    MalformedIdentifier {
        reason: MalformedReason,
        provider_id: String,
    },
}

impl ResolveError {
    /// Check for the not-found sentinel
    pub fn is_instance_not_found(&self) -> bool {
        matches!(self, Self::InstanceNotFound)
    }

    /// Transport errors may be retried, the rest may not
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub(crate) fn malformed(reason: MalformedReason, provider_id: &str) -> Self {
        Self::MalformedIdentifier {
            reason,
            provider_id: provider_id.to_string(),
        }
    }
}

/// Why a provider ID was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    MissingPrefix,
    MissingServerId,
    InvalidServerId,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "missing prefix {}", super::provider_id::PROVIDER_PREFIX),
            Self::MissingServerId => write!(f, "missing server ID"),
            Self::InvalidServerId => write!(f, "invalid server ID"),
        }
    }
}
