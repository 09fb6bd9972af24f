//! Marketplace and Requester Contract Bindings
//!
//! Implements the `MarketplaceContract` and `RequesterContract` ports
//! over alloy-rs 0.9. Calldata is encoded with `sol!`-generated call
//! types and sent through the shared type-erased provider:
//!
//! - views go out as `eth_call` and are decoded with `abi_decode_returns`
//! - writes are sent, then awaited for a receipt within `tx_timeout`;
//!   a receipt with `status == false` is a revert
//!
//! Every round trip waits on a shared `governor` rate limiter and is
//! recorded in the Prometheus registry when one is attached. Nothing
//! is retried.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::{debug, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::service::{
    Bid, NewService, SecondaryStatus, Service, ServiceId, ServiceStatus, optional_address,
};
use crate::error::{ChainError, Result};
use crate::ports::marketplace::{MarketplaceContract, TxReceipt};
use crate::ports::requester::RequesterContract;

sol! {
    interface IFreteRacer {
        struct ServiceRecord {
            uint256 id;
            address client;
            address transporter;
            string origin;
            string destination;
            string cargoType;
            uint256 weight;
            uint256 volume;
            uint256 pickupDate;
            uint8 status;
            uint256 acceptedBidAmount;
        }

        struct BidRecord {
            address bidder;
            uint256 amount;
            bool accepted;
        }

        function createService(
            string origin,
            string destination,
            string cargoType,
            uint256 weight,
            uint256 volume,
            uint256 pickupDate
        ) external;
        function placeBid(uint256 serviceId, uint256 amount) external;
        function acceptBid(uint256 serviceId, address bidder) external;
        function updateServiceStatus(uint256 serviceId, uint8 status) external;
        function getService(uint256 serviceId) external view returns (ServiceRecord memory);
        function getServicesCount() external view returns (uint256);
        function getBids(uint256 serviceId) external view returns (BidRecord[] memory);
    }

    interface ISolicitante {
        function requestService(uint256 serviceId) external;
        function acceptService(uint256 serviceId, address transporter) external;
        function getServiceStatus(uint256 serviceId) external view returns (uint8);
    }
}

/// Function name of a call type, for logs and metric labels.
fn method_name<C: SolCall>() -> &'static str {
    C::SIGNATURE.split('(').next().unwrap_or(C::SIGNATURE)
}

/// Rate-limited, instrumented access to the RPC provider.
///
/// Shared by both contract bindings so the request budget covers all
/// contract traffic.
pub struct RpcCaller {
    provider: Arc<dyn Provider + Send + Sync>,
    signer: Option<Address>,
    limiter: DefaultDirectRateLimiter,
    tx_timeout: Duration,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl RpcCaller {
    pub fn new(
        provider: Arc<dyn Provider + Send + Sync>,
        signer: Option<Address>,
        max_requests_per_second: NonZeroU32,
        tx_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            signer,
            limiter: RateLimiter::direct(Quota::per_second(max_requests_per_second)),
            tx_timeout,
            metrics: None,
        }
    }

    /// Record call counts and latency in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub const fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    async fn observe<T>(
        &self,
        method: &'static str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        self.limiter.until_ready().await;

        let started = Instant::now();
        let result = call.await;
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_chain_call(method, elapsed, &result);
        }
        if let Err(e) = &result {
            debug!(method, kind = e.kind().as_str(), error = %e, "Contract call failed");
        }
        result
    }

    /// `eth_call` a view function and decode its return values.
    pub async fn view<C>(&self, to: Address, call: C) -> Result<C::Return>
    where
        C: SolCall + Send + Sync,
        C::Return: Send,
    {
        let method = method_name::<C>();
        self.observe(method, async {
            let tx = TransactionRequest::default()
                .to(to)
                .input(Bytes::from(call.abi_encode()).into());
            let data = self.provider.call(&tx).await.map_err(ChainError::from_rpc)?;
            C::abi_decode_returns(&data, true).map_err(|e| ChainError::Decode(e.to_string()))
        })
        .await
    }

    /// Send a transaction and wait for it to be mined.
    pub async fn transact<C: SolCall + Send + Sync>(&self, to: Address, call: C) -> Result<TxReceipt> {
        let from = self.signer.ok_or(ChainError::NoSigner)?;
        let method = method_name::<C>();

        self.observe(method, async {
            let tx = TransactionRequest::default()
                .from(from)
                .to(to)
                .input(Bytes::from(call.abi_encode()).into());

            let pending = self
                .provider
                .send_transaction(tx)
                .await
                .map_err(ChainError::from_rpc)?;
            debug!(method, tx = %pending.tx_hash(), "Transaction sent, waiting for receipt");

            let receipt = tokio::time::timeout(self.tx_timeout, pending.get_receipt())
                .await
                .map_err(|_| ChainError::Timeout(self.tx_timeout.as_secs()))?
                .map_err(ChainError::from_rpc)?;

            if !receipt.status() {
                warn!(method, tx = %receipt.transaction_hash, "Transaction reverted");
                return Err(ChainError::Reverted(format!(
                    "{method} reverted in tx {}",
                    receipt.transaction_hash
                )));
            }

            Ok(TxReceipt {
                tx_hash: receipt.transaction_hash.to_string(),
                block_number: receipt.block_number,
            })
        })
        .await
    }
}

fn to_u64(value: U256, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| ChainError::Decode(format!("{field} {value} overflows u64")))
}

fn service_from_record(record: IFreteRacer::ServiceRecord) -> Result<Service> {
    let status = ServiceStatus::try_from(record.status)
        .map_err(|code| ChainError::Decode(format!("unknown service status code {code}")))?;

    Ok(Service {
        id: to_u64(record.id, "service id")?,
        client: record.client,
        transporter: optional_address(record.transporter),
        origin: record.origin,
        destination: record.destination,
        cargo_type: record.cargoType,
        weight: record.weight,
        volume: record.volume,
        pickup_date: to_u64(record.pickupDate, "pickup date")?,
        status,
        accepted_bid_amount: record.acceptedBidAmount,
    })
}

// ────────────────────────────────────────────
// Marketplace contract
// ────────────────────────────────────────────

/// `MarketplaceContract` over a deployed FreteRacer contract.
pub struct AlloyMarketplace {
    caller: Arc<RpcCaller>,
    address: Address,
}

impl AlloyMarketplace {
    pub fn new(caller: Arc<RpcCaller>, address: Address) -> Self {
        Self { caller, address }
    }
}

#[async_trait]
impl MarketplaceContract for AlloyMarketplace {
    #[instrument(skip(self, service), fields(origin = %service.origin, destination = %service.destination))]
    async fn create_service(&self, service: &NewService) -> Result<TxReceipt> {
        let call = IFreteRacer::createServiceCall {
            origin: service.origin.clone(),
            destination: service.destination.clone(),
            cargoType: service.cargo_type.clone(),
            weight: service.weight,
            volume: service.volume,
            pickupDate: U256::from(service.pickup_date),
        };
        self.caller.transact(self.address, call).await
    }

    #[instrument(skip(self))]
    async fn place_bid(&self, service_id: ServiceId, amount: U256) -> Result<TxReceipt> {
        let call = IFreteRacer::placeBidCall {
            serviceId: U256::from(service_id),
            amount,
        };
        self.caller.transact(self.address, call).await
    }

    #[instrument(skip(self))]
    async fn accept_bid(&self, service_id: ServiceId, bidder: Address) -> Result<TxReceipt> {
        let call = IFreteRacer::acceptBidCall {
            serviceId: U256::from(service_id),
            bidder,
        };
        self.caller.transact(self.address, call).await
    }

    #[instrument(skip(self))]
    async fn update_service_status(
        &self,
        service_id: ServiceId,
        status: ServiceStatus,
    ) -> Result<TxReceipt> {
        let call = IFreteRacer::updateServiceStatusCall {
            serviceId: U256::from(service_id),
            status: status.code(),
        };
        self.caller.transact(self.address, call).await
    }

    async fn get_service(&self, service_id: ServiceId) -> Result<Service> {
        let call = IFreteRacer::getServiceCall {
            serviceId: U256::from(service_id),
        };
        match self.caller.view(self.address, call).await {
            Ok(ret) => service_from_record(ret._0),
            Err(ChainError::Reverted(_)) => Err(ChainError::NotFound(service_id)),
            Err(e) => Err(e),
        }
    }

    async fn services_count(&self) -> Result<u64> {
        let ret = self
            .caller
            .view(self.address, IFreteRacer::getServicesCountCall {})
            .await?;
        to_u64(ret._0, "services count")
    }

    async fn get_bids(&self, service_id: ServiceId) -> Result<Vec<Bid>> {
        let call = IFreteRacer::getBidsCall {
            serviceId: U256::from(service_id),
        };
        let ret = self.caller.view(self.address, call).await?;
        Ok(ret
            ._0
            .into_iter()
            .map(|b| Bid {
                bidder: b.bidder,
                amount: b.amount,
                accepted: b.accepted,
            })
            .collect())
    }
}

// ────────────────────────────────────────────
// Requester contract
// ────────────────────────────────────────────

/// `RequesterContract` over a deployed Solicitante contract.
pub struct AlloyRequester {
    caller: Arc<RpcCaller>,
    address: Address,
}

impl AlloyRequester {
    pub fn new(caller: Arc<RpcCaller>, address: Address) -> Self {
        Self { caller, address }
    }
}

#[async_trait]
impl RequesterContract for AlloyRequester {
    #[instrument(skip(self))]
    async fn request_service(&self, service_id: ServiceId) -> Result<TxReceipt> {
        let call = ISolicitante::requestServiceCall {
            serviceId: U256::from(service_id),
        };
        self.caller.transact(self.address, call).await
    }

    #[instrument(skip(self))]
    async fn accept_service(
        &self,
        service_id: ServiceId,
        transporter: Address,
    ) -> Result<TxReceipt> {
        let call = ISolicitante::acceptServiceCall {
            serviceId: U256::from(service_id),
            transporter,
        };
        self.caller.transact(self.address, call).await
    }

    async fn service_status(&self, service_id: ServiceId) -> Result<SecondaryStatus> {
        let call = ISolicitante::getServiceStatusCall {
            serviceId: U256::from(service_id),
        };
        let ret = self.caller.view(self.address, call).await?;
        SecondaryStatus::try_from(ret._0)
            .map_err(|code| ChainError::Decode(format!("unknown requester status code {code}")))
    }
}
