//! Command-line interface definitions and output rendering
//!
//! Every command maps to one `Marketplace` operation. Results print as
//! text by default or as JSON with `--json`; failures print the
//! operation's error message and make the process exit non-zero.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use freteracer_chain::domain::projection::{ServiceCard, TransitCard};
use freteracer_chain::domain::reconcile::ReconciledService;
use freteracer_chain::domain::service::{Bid, SecondaryStatus, Service, ServiceStatus};
use freteracer_chain::domain::stats::MarketStats;
use freteracer_chain::ports::TxReceipt;
use freteracer_chain::usecases::Outcome;

/// FreteRacer marketplace client
#[derive(Parser, Debug)]
#[command(name = "freteracer")]
#[command(about = "FreteRacer freight marketplace client: services, bids and transit reconciliation")]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this address on the simulated chain
    #[arg(long, global = true)]
    pub sender: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Service operations
    #[command(subcommand)]
    Services(ServicesCommand),

    /// Bid operations
    #[command(subcommand)]
    Bids(BidsCommand),

    /// Request shipment of a service on the requester contract
    Request { id: u64 },

    /// Record a transporter's acceptance on the requester contract
    AcceptRequest { id: u64, transporter: String },

    /// Requester-side status of a service
    SecondaryStatus { id: u64 },

    /// Services both contracts agree are in transit
    Transit,

    /// Joined marketplace/requester status of every service
    Reconcile,

    /// Dashboard figures
    Stats,

    /// Re-run the transit scan periodically and serve metrics
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum ServicesCommand {
    /// List all services
    List {
        /// Keep services whose origin or destination mentions this city
        #[arg(long)]
        city: Option<String>,
    },

    /// Show one service
    Get { id: u64 },

    /// Create a service as the connected wallet
    Create(CreateArgs),

    /// Move a service to a new status
    Status { id: u64, status: ServiceStatus },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub origin: String,
    #[arg(long)]
    pub destination: String,
    #[arg(long)]
    pub cargo_type: String,
    /// Weight in kg
    #[arg(long)]
    pub weight: u64,
    /// Volume in m³
    #[arg(long)]
    pub volume: u64,
    /// `dd/mm/yyyy` or seconds since epoch
    #[arg(long)]
    pub pickup_date: String,
}

#[derive(Subcommand, Debug)]
pub enum BidsCommand {
    /// List bids on a service
    List { id: u64 },

    /// Bid on a service as the connected wallet
    Place { id: u64, amount: String },

    /// Accept a bidder's offer
    Accept { id: u64, bidder: String },
}

impl Commands {
    /// Whether the command sends transactions.
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Services(ServicesCommand::Create(_) | ServicesCommand::Status { .. })
                | Self::Bids(BidsCommand::Place { .. } | BidsCommand::Accept { .. })
                | Self::Request { .. }
                | Self::AcceptRequest { .. }
        )
    }
}

// ── Output ──────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonReport<'a, T: Serialize> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Print an outcome; returns whether it succeeded.
pub fn emit<T: Serialize>(json: bool, outcome: &Outcome<T>, text: impl FnOnce(&T) -> String) -> bool {
    if json {
        let report = JsonReport {
            ok: outcome.succeeded(),
            value: outcome.value(),
            error: outcome.error(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(e) => eprintln!("error: failed to encode output: {e}"),
        }
    } else if let Some(value) = outcome.value() {
        println!("{}", text(value));
    } else if let Some(error) = outcome.error() {
        eprintln!("error: {error}");
    }
    outcome.succeeded()
}

pub fn render_receipt(receipt: &TxReceipt) -> String {
    match receipt.block_number {
        Some(block) => format!("confirmed tx {} in block {block}", receipt.tx_hash),
        None => format!("confirmed tx {}", receipt.tx_hash),
    }
}

fn service_line(card: &ServiceCard) -> String {
    format!(
        "#{:<4} {} -> {}  {}  {}  {}  coleta {}  [{}]",
        card.id,
        card.origin,
        card.destination,
        card.cargo,
        card.weight,
        card.volume,
        card.pickup_date,
        card.status
    )
}

pub fn render_services(services: &[&Service]) -> String {
    if services.is_empty() {
        return "no services".to_string();
    }
    services
        .iter()
        .map(|s| service_line(&ServiceCard::from(*s)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_service(service: &Service) -> String {
    let card = ServiceCard::from(service);
    let mut out = service_line(&card);
    out.push_str(&format!("\n  client: {}", service.client));
    if let Some(transporter) = service.transporter {
        out.push_str(&format!(
            "\n  transporter: {transporter} (accepted {})",
            service.accepted_bid_amount
        ));
    }
    out
}

pub fn render_bids(bids: &[Bid]) -> String {
    if bids.is_empty() {
        return "no bids".to_string();
    }
    bids.iter()
        .map(|b| {
            let mark = if b.accepted { " (accepted)" } else { "" };
            format!("{}  {}{mark}", b.bidder, b.amount)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_secondary(status: &SecondaryStatus) -> String {
    format!("{status} ({})", status.code())
}

pub fn render_transit(services: &[Service]) -> String {
    if services.is_empty() {
        return "no services in transit".to_string();
    }
    services
        .iter()
        .map(|s| {
            let card = TransitCard::from(s);
            format!(
                "#{:<4} {}  {} -> {}  {}  saída {}  chegada {}  [{}]",
                card.id,
                card.transporter,
                card.origin,
                card.destination,
                card.capacity,
                card.departure_date,
                card.arrival_date,
                card.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_reconciled(rows: &[ReconciledService]) -> String {
    if rows.is_empty() {
        return "no services".to_string();
    }
    rows.iter()
        .map(|r| {
            format!(
                "#{:<4} marketplace={:<12} requester={:<14} {:?}",
                r.service.id, r.service.status, r.secondary, r.state
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(stats: &MarketStats) -> String {
    let mut lines = vec![format!("total services: {}", stats.total_services)];
    for entry in &stats.by_status {
        lines.push(format!("  {:<14} {}", entry.label, entry.count));
    }
    lines.push(format!("in transit: {}", stats.in_transit));
    lines.push(format!("completed: {}", stats.completed));
    lines.push(format!("total volume: {}m³", stats.total_volume));
    for (title, by_city) in [
        ("volume by origin:", &stats.volume_by_origin),
        ("volume by destination:", &stats.volume_by_destination),
    ] {
        if by_city.is_empty() {
            continue;
        }
        lines.push(title.to_string());
        for (city, volume) in by_city {
            lines.push(format!("  {city:<20} {volume}m³"));
        }
    }
    if let Some(avg) = stats.average_accepted_bid {
        lines.push(format!("average accepted bid: {avg}"));
    }
    lines.join("\n")
}
