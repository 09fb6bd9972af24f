//! Local Wallet - Environment-backed Signer
//!
//! Implements the `WalletProvider` port over private keys read from the
//! environment. The key is never logged or written to config; only the
//! derived address appears in logs.
//!
//! Connection follows the browser-wallet model: accounts are hidden
//! until `request_accounts` succeeds, and account or chain switches are
//! broadcast on `watch` channels.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::{RwLock, watch};
use tracing::{info, instrument, warn};

use crate::error::{ChainError, Result};
use crate::ports::wallet::WalletProvider;

#[derive(Debug, Default)]
struct WalletState {
    connected: bool,
    active: usize,
}

/// Wallet holding zero or more local signing keys.
pub struct LocalWallet {
    signers: Vec<PrivateKeySigner>,
    state: RwLock<WalletState>,
    chain_id: RwLock<Option<u64>>,
    account_tx: watch::Sender<Option<Address>>,
    chain_tx: watch::Sender<Option<u64>>,
}

impl LocalWallet {
    pub fn new(signers: Vec<PrivateKeySigner>, chain_id: Option<u64>) -> Self {
        let (account_tx, _) = watch::channel(None);
        let (chain_tx, _) = watch::channel(chain_id);
        Self {
            signers,
            state: RwLock::new(WalletState::default()),
            chain_id: RwLock::new(chain_id),
            account_tx,
            chain_tx,
        }
    }

    /// Load keys from the environment variable `var`.
    ///
    /// The variable may hold several comma-separated hex keys; the first
    /// is the initial account. A missing variable yields an empty wallet
    /// (read-only use); a malformed key is an error.
    pub fn from_env(var: &str, chain_id: Option<u64>) -> anyhow::Result<Self> {
        let Ok(raw) = std::env::var(var) else {
            info!(var, "No signing key in environment, wallet absent");
            return Ok(Self::new(Vec::new(), chain_id));
        };

        let signers = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .enumerate()
            .map(|(i, key)| {
                key.parse::<PrivateKeySigner>()
                    .with_context(|| format!("Invalid private key #{i} in {var}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        info!(var, keys = signers.len(), "Loaded signing keys");
        Ok(Self::new(signers, chain_id))
    }

    fn addresses_from(&self, active: usize) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.signers.iter().map(PrivateKeySigner::address).collect();
        if active < addresses.len() {
            addresses.swap(0, active);
        }
        addresses
    }

    /// Signer of the active account, if connected.
    pub async fn active_signer(&self) -> Option<PrivateKeySigner> {
        let state = self.state.read().await;
        if !state.connected {
            return None;
        }
        self.signers.get(state.active).cloned()
    }

    /// Make `address` the active account.
    #[instrument(skip(self))]
    pub async fn switch_account(&self, address: Address) -> Result<()> {
        let idx = self
            .signers
            .iter()
            .position(|s| s.address() == address)
            .ok_or_else(|| ChainError::InvalidInput(format!("no key loaded for {address}")))?;

        let mut state = self.state.write().await;
        state.active = idx;
        if state.connected {
            self.account_tx.send_replace(Some(address));
        }
        info!(%address, "Active account switched");
        Ok(())
    }

    /// Record that the wallet moved to another chain.
    pub async fn switch_chain(&self, chain_id: u64) {
        *self.chain_id.write().await = Some(chain_id);
        self.chain_tx.send_replace(Some(chain_id));
        warn!(chain_id, "Wallet chain changed");
    }

    /// Hide all accounts again.
    pub async fn disconnect(&self) {
        self.state.write().await.connected = false;
        self.account_tx.send_replace(None);
        info!("Wallet disconnected");
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    #[instrument(skip(self))]
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if self.signers.is_empty() {
            return Err(ChainError::NoSigner);
        }

        let mut state = self.state.write().await;
        state.connected = true;
        let accounts = self.addresses_from(state.active);
        self.account_tx.send_replace(accounts.first().copied());

        info!(account = ?accounts.first(), "Wallet connected");
        Ok(accounts)
    }

    async fn accounts(&self) -> Vec<Address> {
        let state = self.state.read().await;
        if state.connected {
            self.addresses_from(state.active)
        } else {
            Vec::new()
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .read()
            .await
            .ok_or_else(|| ChainError::NoProvider("wallet chain id unknown".to_string()))
    }

    fn subscribe_accounts(&self) -> watch::Receiver<Option<Address>> {
        self.account_tx.subscribe()
    }

    fn subscribe_chain(&self) -> watch::Receiver<Option<u64>> {
        self.chain_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(keys: usize) -> LocalWallet {
        LocalWallet::new(
            (0..keys).map(|_| PrivateKeySigner::random()).collect(),
            Some(31_337),
        )
    }

    #[tokio::test]
    async fn test_absent_wallet_refuses_connection() {
        let wallet = wallet(0);
        assert_eq!(wallet.request_accounts().await, Err(ChainError::NoSigner));
        assert!(!wallet.is_connected().await);
        assert!(wallet.active_signer().await.is_none());
    }

    #[tokio::test]
    async fn test_accounts_hidden_until_requested() {
        let wallet = wallet(1);
        assert!(wallet.accounts().await.is_empty());

        let accounts = wallet.request_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(wallet.current_account().await, Some(accounts[0]));
    }

    #[tokio::test]
    async fn test_account_switch_is_broadcast() {
        let wallet = wallet(2);
        let mut rx = wallet.subscribe_accounts();
        let accounts = wallet.request_accounts().await.unwrap();
        rx.borrow_and_update();

        wallet.switch_account(accounts[1]).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(accounts[1]));
        assert_eq!(wallet.current_account().await, Some(accounts[1]));

        wallet.disconnect().await;
        assert_eq!(*rx.borrow_and_update(), None);
        assert!(!wallet.is_connected().await);
    }

    #[tokio::test]
    async fn test_chain_switch_is_broadcast() {
        let wallet = wallet(1);
        let rx = wallet.subscribe_chain();
        wallet.switch_chain(137).await;

        assert_eq!(*rx.borrow(), Some(137));
        assert_eq!(wallet.chain_id().await, Ok(137));
    }
}
