//! Wallet collaborator seam.
//!
//! The gateway never signs or broadcasts transfers. A [`WalletProvider`]
//! performs the transfer out of process and hands back an opaque
//! reference, which is the only thing the ledger persists.

use std::fmt;

use futures_util::future::BoxFuture;
use rust_decimal::Decimal;

use crate::error::MarketError;

/// Result of a wallet transfer: the external transaction reference used
/// for funding deduplication.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// Opaque external transaction reference (e.g. a transaction hash).
    pub reference: String,
}

/// External wallet connectivity, injected by the embedder.
pub trait WalletProvider: fmt::Debug + Send + Sync {
    /// Transfers `amount` of `currency` to `to_address` and resolves to
    /// the receipt once the transfer is broadcast.
    ///
    /// # Errors
    ///
    /// Implementations should return
    /// [`MarketError::CollaboratorUnavailable`] for transient transport
    /// failures so callers know a retry is safe.
    fn send_transfer<'a>(
        &'a self,
        to_address: &'a str,
        amount: Decimal,
        currency: &'a str,
    ) -> BoxFuture<'a, Result<TransferReceipt, MarketError>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    /// Deterministic in-process wallet for tests: hands out sequential
    /// references and remembers nothing.
    #[derive(Debug, Default)]
    pub struct StubWallet {
        counter: AtomicU64,
    }

    impl WalletProvider for StubWallet {
        fn send_transfer<'a>(
            &'a self,
            _to_address: &'a str,
            _amount: Decimal,
            _currency: &'a str,
        ) -> BoxFuture<'a, Result<TransferReceipt, MarketError>> {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            Box::pin(async move {
                Ok(TransferReceipt {
                    reference: format!("0xstub{n:08x}"),
                })
            })
        }
    }

    /// Wallet that always fails with a transient error.
    #[derive(Debug, Default)]
    pub struct DownWallet;

    impl WalletProvider for DownWallet {
        fn send_transfer<'a>(
            &'a self,
            _to_address: &'a str,
            _amount: Decimal,
            _currency: &'a str,
        ) -> BoxFuture<'a, Result<TransferReceipt, MarketError>> {
            Box::pin(async {
                Err(MarketError::CollaboratorUnavailable(
                    "wallet provider offline".to_string(),
                ))
            })
        }
    }
}
