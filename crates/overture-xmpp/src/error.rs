//! Error types for session negotiation.

use thiserror::Error;

/// Errors raised while negotiating an XMPP session.
///
/// Every variant aborts the remaining pipeline steps; the crate never
/// retries an exchange on its own.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// A received stanza does not match the shape required by the active
    /// transport mode or by the current exchange.
    #[error("unexpected stanza: expected {expected}, received {received}")]
    StructuralViolation {
        /// What the current exchange required.
        expected: String,
        /// A short description of what actually arrived.
        received: String,
    },

    /// Client policy demands a capability the server does not advertise.
    #[error("feature unavailable: {0}")]
    FeatureUnavailable(String),

    /// The SASL exchange ended in a failure condition.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Connection-level failure reported by the transport.
    #[error("transport error: {0}")]
    TransportFailure(String),

    /// The transport's receive deadline elapsed.
    #[error("negotiation timeout")]
    Timeout,
}

impl NegotiationError {
    /// Create a structural-violation error.
    pub fn structural(expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self::StructuralViolation {
            expected: expected.into(),
            received: received.into(),
        }
    }

    /// Create a feature-unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::FeatureUnavailable(msg.into())
    }

    /// Create a transport-failure error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    /// Whether a caller could reasonably retry the whole pipeline.
    ///
    /// Structural, policy, and authentication failures are terminal; only
    /// connection-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NegotiationError::TransportFailure(_) | NegotiationError::Timeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_violation_reports_both_sides() {
        let error = NegotiationError::structural("a stream start", "a <message/> stanza");
        let rendered = error.to_string();
        assert!(rendered.contains("a stream start"));
        assert!(rendered.contains("a <message/> stanza"));
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(NegotiationError::transport("connection reset").is_retryable());
        assert!(NegotiationError::Timeout.is_retryable());
        assert!(!NegotiationError::structural("x", "y").is_retryable());
        assert!(!NegotiationError::unavailable("starttls").is_retryable());
        assert!(!NegotiationError::AuthenticationFailed("bad password".to_string()).is_retryable());
    }
}
