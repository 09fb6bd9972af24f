//! Status projection and presentation fields.
//!
//! Pure functions mapping raw contract data onto display values:
//! status labels, pt-BR pickup dates and shortened wallet addresses.
//! Nothing here holds state.

use alloy::primitives::Address;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use tracing::warn;

use super::service::{Service, ServiceId, ServiceStatus};

/// Label for any status code outside `0..=4`.
pub const UNKNOWN_LABEL: &str = "Desconhecido";

/// Label shown for services whose arrival date is not yet known.
pub const ARRIVAL_PENDING_LABEL: &str = "Em andamento";

/// Label shown on transit cards.
pub const IN_TRANSIT_CARD_LABEL: &str = "Em trânsito";

/// Display label for a raw status code.
///
/// Total over `u8`: out-of-range codes get [`UNKNOWN_LABEL`] and a
/// warning instead of being mislabelled.
pub fn status_label(code: u8) -> &'static str {
    match ServiceStatus::try_from(code) {
        Ok(status) => status.label(),
        Err(code) => {
            warn!(code, "Unknown service status code");
            UNKNOWN_LABEL
        }
    }
}

impl ServiceStatus {
    /// pt-BR display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "Disponível",
            Self::InProgress => "Em Progresso",
            Self::InTransit => "Em Trânsito",
            Self::Completed => "Concluído",
            Self::Cancelled => "Cancelado",
        }
    }
}

/// Format seconds-since-epoch as `dd/mm/yyyy` (UTC).
///
/// Timestamps chrono cannot represent render as `"-"`.
pub fn format_pickup_date(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map_or_else(|| "-".to_string(), |dt| dt.format("%d/%m/%Y").to_string())
}

/// Parse a pickup date given as `dd/mm/yyyy` (midnight UTC) or as
/// seconds since epoch.
pub fn parse_pickup_date(input: &str) -> Option<u64> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<u64>() {
        return Some(secs);
    }
    let date = NaiveDate::parse_from_str(input, "%d/%m/%Y").ok()?;
    let secs = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
    u64::try_from(secs).ok()
}

/// Shorten a checksummed address to `0x1234...abcd`.
pub fn truncate_address(addr: &Address) -> String {
    shorten(&addr.to_checksum(None))
}

/// Shorten any string to its first 6 and last 4 characters.
///
/// Strings of 10 characters or fewer are returned unchanged.
pub fn shorten(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 10 {
        return s.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Marketplace listing view of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCard {
    pub id: ServiceId,
    pub origin: String,
    pub destination: String,
    pub cargo: String,
    pub weight: String,
    pub volume: String,
    pub pickup_date: String,
    pub status: &'static str,
}

impl From<&Service> for ServiceCard {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            origin: service.origin.clone(),
            destination: service.destination.clone(),
            cargo: service.cargo_type.clone(),
            weight: format!("{}kg", service.weight),
            volume: format!("{}m³", service.volume),
            pickup_date: format_pickup_date(service.pickup_date),
            status: service.status.label(),
        }
    }
}

/// Transit board view of a service already under way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitCard {
    pub id: ServiceId,
    pub transporter: String,
    pub origin: String,
    pub destination: String,
    pub capacity: String,
    pub departure_date: String,
    pub arrival_date: &'static str,
    pub status: &'static str,
}

impl From<&Service> for TransitCard {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            transporter: service
                .transporter
                .as_ref()
                .map_or_else(|| "-".to_string(), truncate_address),
            origin: service.origin.clone(),
            destination: service.destination.clone(),
            capacity: format!("{}kg", service.weight),
            departure_date: format_pickup_date(service.pickup_date),
            arrival_date: ARRIVAL_PENDING_LABEL,
            status: IN_TRANSIT_CARD_LABEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{U256, address};

    use super::*;

    #[test]
    fn test_every_known_code_has_a_label() {
        for code in 0..=4u8 {
            let label = status_label(code);
            assert!(!label.is_empty());
            assert_ne!(label, UNKNOWN_LABEL);
        }
        assert_eq!(status_label(2), "Em Trânsito");
    }

    #[test]
    fn test_out_of_range_code_is_unknown() {
        assert_eq!(status_label(5), UNKNOWN_LABEL);
        assert_eq!(status_label(u8::MAX), UNKNOWN_LABEL);
    }

    #[test]
    fn test_pickup_date_format() {
        // 2024-06-01T00:00:00Z
        assert_eq!(format_pickup_date(1_717_200_000), "01/06/2024");
        assert_eq!(format_pickup_date(0), "01/01/1970");
        assert_eq!(format_pickup_date(u64::MAX), "-");
    }

    #[test]
    fn test_parse_pickup_date() {
        assert_eq!(parse_pickup_date("01/06/2024"), Some(1_717_200_000));
        assert_eq!(parse_pickup_date("1717200000"), Some(1_717_200_000));
        assert_eq!(parse_pickup_date("31/02/2024"), None);
        assert_eq!(parse_pickup_date("amanhã"), None);

        let secs = parse_pickup_date("15/03/2025").unwrap();
        assert_eq!(format_pickup_date(secs), "15/03/2025");
    }

    #[test]
    fn test_truncate_address() {
        let addr = address!("0D6084048C239E2a1073979c616408cC339ad571");
        assert_eq!(truncate_address(&addr).to_lowercase(), "0x0d60...d571");
        assert_eq!(shorten("0xabc"), "0xabc");
    }

    #[test]
    fn test_transit_card_fields() {
        let service = Service {
            id: 4,
            client: Address::repeat_byte(0x01),
            transporter: Some(address!("D49d50091afdae97D2dE1b7d45778CF72CD25448")),
            origin: "Campinas, SP".to_string(),
            destination: "Belo Horizonte, MG".to_string(),
            cargo_type: "Eletrônicos".to_string(),
            weight: U256::from(850),
            volume: U256::from(12),
            pickup_date: 1_717_200_000,
            status: ServiceStatus::InTransit,
            accepted_bid_amount: U256::from(3_500),
        };

        let card = TransitCard::from(&service);
        assert_eq!(card.transporter.to_lowercase(), "0xd49d...5448");
        assert_eq!(card.capacity, "850kg");
        assert_eq!(card.departure_date, "01/06/2024");
        assert_eq!(card.status, IN_TRANSIT_CARD_LABEL);

        let listing = ServiceCard::from(&service);
        assert_eq!(listing.volume, "12m³");
        assert_eq!(listing.status, "Em Trânsito");
    }
}
