//! Provider ID parsing
//!
//! Nodes are known to the orchestrator as `hcloud://<server id>`.

use super::error::{MalformedReason, ResolveError, ResolveResult};
use crate::models::ServerId;
use crate::PROVIDER_NAME;

/// Scheme prefix of every provider ID
pub const PROVIDER_PREFIX: &str = "hcloud://";

/// Extract the server ID from a provider ID
pub fn parse_provider_id(provider_id: &str) -> ResolveResult<ServerId> {
    if !provider_id.starts_with(PROVIDER_PREFIX) {
        return Err(ResolveError::malformed(MalformedReason::MissingPrefix, provider_id));
    }

    // Every occurrence is stripped, not just the leading one
    let id = provider_id.replace(PROVIDER_PREFIX, "");
    if id.is_empty() {
        return Err(ResolveError::malformed(MalformedReason::MissingServerId, provider_id));
    }

    id.parse::<ServerId>()
        .map_err(|_| ResolveError::malformed(MalformedReason::InvalidServerId, provider_id))
}

/// Build the provider ID for a server
pub fn provider_id_for(id: ServerId) -> String {
    format!("{PROVIDER_NAME}://{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: ResolveResult<ServerId>) -> MalformedReason {
        match result {
            Err(ResolveError::MalformedIdentifier { reason, .. }) => reason,
            other => panic!("expected malformed identifier, got {other:?}"),
        }
    }

    #[test]
    fn test_prefix_matches_provider_name() {
        assert_eq!(PROVIDER_PREFIX, format!("{PROVIDER_NAME}://"));
    }

    #[test]
    fn test_valid() {
        assert_eq!(parse_provider_id("hcloud://12345").unwrap(), 12345);
        assert_eq!(parse_provider_id("hcloud://0").unwrap(), 0);
    }

    #[test]
    fn test_missing_prefix() {
        assert_eq!(reason(parse_provider_id("other://12345")), MalformedReason::MissingPrefix);
        assert_eq!(reason(parse_provider_id("12345")), MalformedReason::MissingPrefix);
        assert_eq!(reason(parse_provider_id("")), MalformedReason::MissingPrefix);
    }

    #[test]
    fn test_missing_id() {
        assert_eq!(reason(parse_provider_id("hcloud://")), MalformedReason::MissingServerId);
        assert_eq!(
            reason(parse_provider_id("hcloud://hcloud://")),
            MalformedReason::MissingServerId
        );
    }

    #[test]
    fn test_invalid_id() {
        assert_eq!(reason(parse_provider_id("hcloud://abc")), MalformedReason::InvalidServerId);
        assert_eq!(reason(parse_provider_id("hcloud://-5")), MalformedReason::InvalidServerId);
        assert_eq!(reason(parse_provider_id("hcloud://1 2")), MalformedReason::InvalidServerId);
    }

    #[test]
    fn test_repeated_prefix_is_stripped() {
        assert_eq!(parse_provider_id("hcloud://hcloud://42").unwrap(), 42);
    }

    #[test]
    fn test_provider_id_for() {
        assert_eq!(provider_id_for(12345), "hcloud://12345");
        assert_eq!(parse_provider_id(&provider_id_for(99)).unwrap(), 99);
    }
}
