//! Chain Error Taxonomy
//!
//! Every contract interaction in the library reports failures through
//! `ChainError`. Application wiring (config loading, the binary) uses
//! `anyhow` on top of it.
//!
//! Cross-contract divergence is deliberately absent: a service whose
//! two status fields disagree is data (`TransitState::Diverged`), not
//! a failure.

use alloy::primitives::Address;

use crate::domain::service::{ServiceId, ServiceStatus};

/// Library result alias.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Coarse classification used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No provider / RPC endpoint reachable.
    Connectivity,
    /// Write attempted without a signer.
    Authorization,
    /// The chain rejected the call.
    ContractRevert,
    /// Rejected locally before reaching the chain.
    Validation,
    /// The caller cancelled or superseded the operation.
    Cancelled,
}

impl ErrorKind {
    /// Stable label for metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Authorization => "authorization",
            Self::ContractRevert => "revert",
            Self::Validation => "validation",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Failure of a chain read or write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("no chain provider available: {0}")]
    NoProvider(String),

    #[error("no wallet signer available for write access")]
    NoSigner,

    #[error("contract reverted: {0}")]
    Reverted(String),

    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("failed to decode contract response: {0}")]
    Decode(String),

    #[error("service {0} not found")]
    NotFound(ServiceId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("service {service_id} is {status}, cannot {operation}")]
    InvalidState {
        service_id: ServiceId,
        status: ServiceStatus,
        operation: &'static str,
    },

    #[error("no bid from {bidder} on service {service_id}")]
    BidNotFound {
        service_id: ServiceId,
        bidder: Address,
    },

    #[error("service {0} already has an accepted bid")]
    BidAlreadyAccepted(ServiceId),

    #[error("transaction not confirmed within {0}s")]
    Timeout(u64),

    #[error("operation cancelled")]
    Cancelled,
}

impl ChainError {
    /// Classify an RPC-layer error message.
    ///
    /// Nodes report reverts as JSON-RPC errors whose message contains
    /// "revert"; everything else is a transport problem.
    pub fn from_rpc(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        if message.to_ascii_lowercase().contains("revert") {
            Self::Reverted(message)
        } else {
            Self::Transport(message)
        }
    }

    /// Taxonomy bucket of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoProvider(_) | Self::Transport(_) | Self::Timeout(_) => ErrorKind::Connectivity,
            Self::NoSigner => ErrorKind::Authorization,
            Self::Reverted(_) | Self::NotFound(_) | Self::Decode(_) => ErrorKind::ContractRevert,
            Self::InvalidInput(_)
            | Self::InvalidState { .. }
            | Self::BidNotFound { .. }
            | Self::BidAlreadyAccepted(_) => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_revert_classified() {
        let err = ChainError::from_rpc("server returned an error response: execution reverted: not client");
        assert!(matches!(err, ChainError::Reverted(_)));
        assert_eq!(err.kind(), ErrorKind::ContractRevert);

        let err = ChainError::from_rpc("connection refused");
        assert!(matches!(err, ChainError::Transport(_)));
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[test]
    fn test_messages_are_non_empty() {
        assert!(!ChainError::NoSigner.to_string().is_empty());
        assert_eq!(ChainError::NotFound(7).to_string(), "service 7 not found");
    }
}
