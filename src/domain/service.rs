//! Freight marketplace domain types.
//!
//! Defines services (freight jobs), bids, and the two independent
//! status enums kept by the marketplace and requester contracts.
//! Numeric codes match the on-chain `uint8` representations.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Numeric service identifier assigned by the marketplace contract.
pub type ServiceId = u64;

// ────────────────────────────────────────────
// Marketplace contract status
// ────────────────────────────────────────────

/// Lifecycle of a service on the marketplace contract.
///
/// ```text
/// Available ──► InProgress ──► InTransit ──► Completed
///     │              │
///     └──────────────┴──► Cancelled
/// ```
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceStatus {
    Available = 0,
    InProgress = 1,
    InTransit = 2,
    Completed = 3,
    Cancelled = 4,
}

impl ServiceStatus {
    /// All statuses in code order.
    pub const ALL: [Self; 5] = [
        Self::Available,
        Self::InProgress,
        Self::InTransit,
        Self::Completed,
        Self::Cancelled,
    ];

    /// On-chain `uint8` code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether carriers may still bid on the service.
    pub const fn accepts_bids(self) -> bool {
        matches!(self, Self::Available | Self::InProgress)
    }

    /// Whether `self → next` is an edge of the lifecycle.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::InProgress)
                | (Self::InProgress, Self::InTransit)
                | (Self::InTransit, Self::Completed)
                | (Self::Available | Self::InProgress, Self::Cancelled)
        )
    }
}

impl TryFrom<u8> for ServiceStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Available),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::InTransit),
            3 => Ok(Self::Completed),
            4 => Ok(Self::Cancelled),
            other => Err(other),
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::InProgress => write!(f, "in-progress"),
            Self::InTransit => write!(f, "in-transit"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u8>() {
            return Self::try_from(code).map_err(|c| format!("unknown service status code {c}"));
        }
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "available" => Ok(Self::Available),
            "in-progress" | "inprogress" => Ok(Self::InProgress),
            "in-transit" | "intransit" => Ok(Self::InTransit),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown service status '{other}'")),
        }
    }
}

// ────────────────────────────────────────────
// Requester contract status
// ────────────────────────────────────────────

/// Shipment-request handshake tracked by the requester contract.
///
/// Stored independently of [`ServiceStatus`] under the same id space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecondaryStatus {
    #[default]
    NotRequested = 0,
    Requested = 1,
    Accepted = 2,
    Completed = 3,
    Cancelled = 4,
}

impl SecondaryStatus {
    /// On-chain `uint8` code.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SecondaryStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NotRequested),
            1 => Ok(Self::Requested),
            2 => Ok(Self::Accepted),
            3 => Ok(Self::Completed),
            4 => Ok(Self::Cancelled),
            other => Err(other),
        }
    }
}

impl fmt::Display for SecondaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not-requested"),
            Self::Requested => write!(f, "requested"),
            Self::Accepted => write!(f, "accepted"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ────────────────────────────────────────────
// Records
// ────────────────────────────────────────────

/// One freight job as stored by the marketplace contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Contract-assigned id.
    pub id: ServiceId,
    /// Creator of the service.
    pub client: Address,
    /// Carrier whose bid was accepted, if any.
    pub transporter: Option<Address>,
    /// "city, state" free text.
    pub origin: String,
    /// "city, state" free text.
    pub destination: String,
    pub cargo_type: String,
    /// Weight in kg.
    pub weight: U256,
    /// Volume in m³.
    pub volume: U256,
    /// Pickup date, seconds since epoch.
    pub pickup_date: u64,
    pub status: ServiceStatus,
    /// Zero until a bid is accepted.
    pub accepted_bid_amount: U256,
}

/// A carrier's offer on a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: Address,
    pub amount: U256,
    pub accepted: bool,
}

/// Input for `createService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub origin: String,
    pub destination: String,
    pub cargo_type: String,
    pub weight: U256,
    pub volume: U256,
    pub pickup_date: u64,
}

impl NewService {
    /// Check the fields the contract would otherwise accept blindly.
    pub fn validate(&self) -> Result<(), String> {
        if self.origin.trim().is_empty() {
            return Err("origin must not be empty".to_string());
        }
        if self.destination.trim().is_empty() {
            return Err("destination must not be empty".to_string());
        }
        if self.cargo_type.trim().is_empty() {
            return Err("cargo type must not be empty".to_string());
        }
        if self.weight.is_zero() {
            return Err("weight must be positive".to_string());
        }
        if self.volume.is_zero() {
            return Err("volume must be positive".to_string());
        }
        Ok(())
    }
}

/// Map the contract's zero-address placeholder to `None`.
pub fn optional_address(addr: Address) -> Option<Address> {
    if addr.is_zero() { None } else { Some(addr) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in ServiceStatus::ALL {
            assert_eq!(ServiceStatus::try_from(status.code()), Ok(status));
        }
        assert_eq!(ServiceStatus::try_from(5), Err(5));
        assert_eq!(SecondaryStatus::try_from(2), Ok(SecondaryStatus::Accepted));
        assert_eq!(SecondaryStatus::try_from(9), Err(9));
    }

    #[test]
    fn test_lifecycle_edges() {
        use ServiceStatus::*;
        assert!(Available.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(Completed));
        assert!(Available.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));

        assert!(!InTransit.can_transition_to(Cancelled));
        assert!(!Available.can_transition_to(InTransit));
        for next in ServiceStatus::ALL {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("in_transit".parse::<ServiceStatus>(), Ok(ServiceStatus::InTransit));
        assert_eq!("3".parse::<ServiceStatus>(), Ok(ServiceStatus::Completed));
        assert!("9".parse::<ServiceStatus>().is_err());
        assert!("shipped".parse::<ServiceStatus>().is_err());
    }

    #[test]
    fn test_new_service_validation() {
        let mut input = NewService {
            origin: "São Paulo, SP".to_string(),
            destination: "Curitiba, PR".to_string(),
            cargo_type: "Grãos".to_string(),
            weight: U256::from(1200),
            volume: U256::from(30),
            pickup_date: 1_717_200_000,
        };
        assert!(input.validate().is_ok());

        input.weight = U256::ZERO;
        assert_eq!(input.validate(), Err("weight must be positive".to_string()));

        input.weight = U256::from(1);
        input.origin = "  ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_zero_address_is_none() {
        assert_eq!(optional_address(Address::ZERO), None);
        let addr = Address::repeat_byte(0x11);
        assert_eq!(optional_address(addr), Some(addr));
    }
}
