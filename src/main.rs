//! FreteRacer Client - Entry Point
//!
//! Initializes configuration, logging and the chain connection, then
//! runs one CLI command through the `Marketplace` facade.
//!
//! Wiring sequence:
//! 1. Parse CLI, load config.toml + validate
//! 2. Init tracing (JSON or human-readable, on stderr)
//! 3. Load signing keys from the env var named in config
//! 4. Build the chain client: simulated ledger or alloy RPC
//! 5. Run the command; print the outcome
//! 6. Simulated mode: persist the ledger after writes
//!
//! `watch` additionally spawns the health and metrics servers and the
//! transit monitor, and runs until SIGINT.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod cli;

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use freteracer_chain::adapters::chain::{AlloyChainClient, OfflineChainClient};
use freteracer_chain::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use freteracer_chain::adapters::persistence::{LEDGER_FILE, SnapshotStore, TRANSIT_FILE};
use freteracer_chain::adapters::simulated::{Ledger, SimulatedChain, SimulatedChainClient};
use freteracer_chain::adapters::wallet::LocalWallet;
use freteracer_chain::config::{self, AppConfig};
use freteracer_chain::domain::projection::parse_pickup_date;
use freteracer_chain::domain::service::NewService;
use freteracer_chain::domain::stats::filter_by_city;
use freteracer_chain::ports::{ChainClient, WalletProvider};
use freteracer_chain::usecases::{Marketplace, TransitMonitor};

use cli::{BidsCommand, Cli, Commands, ServicesCommand};

type App = Marketplace<dyn ChainClient>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fatal error");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_config(&cli.config).context("Failed to load configuration")?;

    // ── 2. Initialize logging ───────────────────────────────
    init_tracing(&config);

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        simulate = config.app.simulate,
        "Starting FreteRacer client"
    );

    // ── 3. Wallet ───────────────────────────────────────────
    let wallet = LocalWallet::from_env(&config.wallet.private_key_env, config.chain.chain_id)?;
    if let Err(e) = wallet.request_accounts().await {
        info!(reason = %e, "Running without a connected wallet, writes will fail");
    }

    // ── 4. Chain client ─────────────────────────────────────
    let metrics = if matches!(cli.command, Commands::Watch) && config.metrics.enabled {
        Some(Arc::new(MetricsRegistry::new()?))
    } else {
        None
    };

    let store = SnapshotStore::new(&config.app.data_dir).await?;
    let mut simulated: Option<Arc<SimulatedChain>> = None;

    let chain: Arc<dyn ChainClient> = if config.app.simulate {
        let ledger: Ledger = store.load(LEDGER_FILE).await?.unwrap_or_default();
        info!(services = ledger.services.len(), "Simulated ledger loaded");
        let sim = Arc::new(SimulatedChain::from_ledger(ledger));
        simulated = Some(Arc::clone(&sim));

        let sender = match &cli.sender {
            Some(raw) => Some(Address::from_str(raw).context("Invalid --sender address")?),
            None => wallet.current_account().await,
        };
        let client = SimulatedChainClient::new(sim);
        Arc::new(match sender {
            Some(sender) => client.with_signer(sender),
            None => client,
        })
    } else {
        let signer = wallet.active_signer().await;
        match AlloyChainClient::connect(&config.chain, signer, metrics.clone()).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Chain unavailable");
                Arc::new(OfflineChainClient::new(format!("{e:#}")))
            }
        }
    };

    let app: Arc<App> = Arc::new(Marketplace::new(Arc::clone(&chain)));

    // ── 5. Run the command ──────────────────────────────────
    let is_write = cli.command.is_write();
    let ok = match cli.command {
        Commands::Watch => {
            run_watch(&config, app, chain, metrics, &store).await?;
            true
        }
        command => run_command(&app, command, cli.json).await?,
    };

    // ── 6. Persist the simulated ledger ─────────────────────
    if let Some(sim) = simulated {
        if is_write && ok {
            store.save(LEDGER_FILE, &sim.snapshot().await).await?;
        }
    }

    Ok(ok)
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.app.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_address(raw: &str, what: &str) -> Result<Address> {
    Address::from_str(raw).with_context(|| format!("Invalid {what} address: {raw}"))
}

/// Run one non-watch command; returns whether it succeeded.
async fn run_command(app: &App, command: Commands, json: bool) -> Result<bool> {
    let ok = match command {
        Commands::Services(ServicesCommand::List { city }) => {
            let outcome = app.get_all_services().await;
            let needle = city.unwrap_or_default();
            let outcome = outcome.map(|all| {
                filter_by_city(&all, &needle)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
            });
            cli::emit(json, &outcome, |services| {
                cli::render_services(&services.iter().collect::<Vec<_>>())
            })
        }
        Commands::Services(ServicesCommand::Get { id }) => {
            cli::emit(json, &app.get_service(id).await, cli::render_service)
        }
        Commands::Services(ServicesCommand::Create(args)) => {
            let pickup_date = parse_pickup_date(&args.pickup_date)
                .with_context(|| format!("Invalid pickup date: {}", args.pickup_date))?;
            let input = NewService {
                origin: args.origin,
                destination: args.destination,
                cargo_type: args.cargo_type,
                weight: U256::from(args.weight),
                volume: U256::from(args.volume),
                pickup_date,
            };
            cli::emit(json, &app.create_service(&input).await, cli::render_receipt)
        }
        Commands::Services(ServicesCommand::Status { id, status }) => cli::emit(
            json,
            &app.update_service_status(id, status).await,
            cli::render_receipt,
        ),
        Commands::Bids(BidsCommand::List { id }) => {
            cli::emit(json, &app.get_bids(id).await, |bids| cli::render_bids(bids))
        }
        Commands::Bids(BidsCommand::Place { id, amount }) => {
            let amount = U256::from_str(&amount)
                .with_context(|| format!("Invalid bid amount: {amount}"))?;
            cli::emit(json, &app.place_bid(id, amount).await, cli::render_receipt)
        }
        Commands::Bids(BidsCommand::Accept { id, bidder }) => {
            let bidder = parse_address(&bidder, "bidder")?;
            cli::emit(json, &app.accept_bid(id, bidder).await, cli::render_receipt)
        }
        Commands::Request { id } => {
            cli::emit(json, &app.request_service(id).await, cli::render_receipt)
        }
        Commands::AcceptRequest { id, transporter } => {
            let transporter = parse_address(&transporter, "transporter")?;
            cli::emit(
                json,
                &app.accept_service(id, transporter).await,
                cli::render_receipt,
            )
        }
        Commands::SecondaryStatus { id } => {
            cli::emit(json, &app.secondary_status(id).await, cli::render_secondary)
        }
        Commands::Transit => cli::emit(json, &app.services_in_transit().await, |services| {
            cli::render_transit(services)
        }),
        Commands::Reconcile => cli::emit(json, &app.reconcile_all().await, |rows| {
            cli::render_reconciled(rows)
        }),
        Commands::Stats => cli::emit(json, &app.stats().await, cli::render_stats),
        Commands::Watch => anyhow::bail!("watch is not a one-shot command"),
    };
    Ok(ok)
}

/// Scan for services in transit until SIGINT.
async fn run_watch(
    config: &AppConfig,
    app: Arc<App>,
    chain: Arc<dyn ChainClient>,
    metrics: Option<Arc<MetricsRegistry>>,
    store: &SnapshotStore,
) -> Result<()> {
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());
    health.set_chain_healthy(chain.is_healthy().await);

    // ── Health + metrics servers ────────────────────────────
    let mut servers = Vec::new();
    if let Some(metrics) = &metrics {
        let health_server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
        let health_shutdown = shutdown_tx.subscribe();
        servers.push(tokio::spawn(async move {
            if let Err(e) = health_server.run(health_shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }));

        let metrics_ref = Arc::clone(metrics);
        let bind = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        servers.push(tokio::spawn(async move {
            if let Err(e) = metrics_ref.serve(bind, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }));
    }

    // ── Transit monitor ─────────────────────────────────────
    let (monitor, mut snapshot_rx) = TransitMonitor::new(
        Arc::clone(&app),
        Duration::from_secs(config.scan.interval_secs),
    );
    let mut status_rx = monitor.subscribe_status();
    let monitor_shutdown = shutdown_tx.subscribe();
    let monitor_handle = tokio::spawn(async move { monitor.run(monitor_shutdown).await });

    info!("Watch mode running, press Ctrl-C to stop");

    // ── Consume snapshots until SIGINT ──────────────────────
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => {
                info!("SIGINT received, initiating graceful shutdown");
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    warn!("Transit monitor stopped");
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                let Some(status) = status else { continue };

                if !status.is_healthy() {
                    warn!(
                        failures = status.consecutive_failures,
                        error = ?status.error,
                        "Transit scan unhealthy"
                    );
                }
                health.set_scan_healthy(status.is_healthy());
                health.set_chain_healthy(chain.is_healthy().await);
            }
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    warn!("Transit monitor stopped");
                    break;
                }
                let snapshot = snapshot_rx.borrow_and_update().clone();
                let Some(snapshot) = snapshot else { continue };

                if let Some(metrics) = &metrics {
                    metrics.record_scan(
                        Duration::from_millis(snapshot.scan_ms),
                        snapshot.services.len(),
                    );
                }
                if let Err(e) = store.save(TRANSIT_FILE, &snapshot).await {
                    warn!(error = %e, "Failed to persist transit snapshot");
                }
            }
        }
    }

    // ── Graceful shutdown ───────────────────────────────────
    let _ = shutdown_tx.send(());
    health.set_scan_healthy(false);

    let _ = tokio::time::timeout(Duration::from_secs(10), monitor_handle).await;
    for server in servers {
        let _ = tokio::time::timeout(Duration::from_secs(5), server).await;
    }

    info!("Shutdown complete");
    Ok(())
}
