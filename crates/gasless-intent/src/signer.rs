//! wallet signing: eip-7702 delegation authorizations and personal messages
//!
//! the orchestrator only talks to [`WalletSigner`]; a browser or hardware
//! wallet bridge implements it the same way [`LocalSigner`] does for keys
//! held in-process.

use crate::types::{Address, B256, U256};
use crate::{Error, Result};
pub use alloy_eips::eip7702::{Authorization, SignedAuthorization};
pub use alloy_primitives::Signature;
use alloy_primitives::{eip191_hash_message, hex};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// unsigned eip-7702 tuple delegating the signer's code to `delegate`
pub fn authorization(delegate: Address, chain_id: u64, nonce: u64) -> Authorization {
    Authorization {
        chain_id: U256::from(chain_id),
        address: delegate,
        nonce,
    }
}

/// keccak(0x05 ‖ rlp([chain_id, address, nonce]))
pub fn authorization_hash(delegate: Address, chain_id: u64, nonce: u64) -> B256 {
    authorization(delegate, chain_id, nonce).signature_hash()
}

/// eip-191 personal message digest
pub fn personal_message_hash(message: &[u8]) -> B256 {
    eip191_hash_message(message)
}

/// address that produced `signature` over `prehash`
pub fn recover_address(prehash: &B256, signature: &Signature) -> Result<Address> {
    signature
        .recover_address_from_prehash(prehash)
        .map_err(|e| Error::InvalidData(format!("recovery failed: {}", e)))
}

/// a connected wallet
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// eip-7702 authorization for `delegate` at the account's current nonce
    async fn sign_authorization(&self, delegate: Address, chain_id: u64, nonce: u64) -> Result<SignedAuthorization>;

    /// eip-191 signature over raw message bytes
    async fn sign_message(&self, message: &[u8]) -> Result<Signature>;
}

/// resolves whichever wallet is connected right now
pub trait WalletProvider: Send + Sync {
    fn current(&self) -> Option<Arc<dyn WalletSigner>>;
}

/// holds the connected wallet; swapped on connect/disconnect
#[derive(Default)]
pub struct WalletSlot {
    inner: RwLock<Option<Arc<dyn WalletSigner>>>,
}

impl WalletSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(signer: Arc<dyn WalletSigner>) -> Self {
        let slot = Self::new();
        slot.connect(signer);
        slot
    }

    pub fn connect(&self, signer: Arc<dyn WalletSigner>) {
        // a poisoned slot only means a writer panicked mid-swap; the value is still whole
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(signer);
    }

    pub fn disconnect(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl WalletProvider for WalletSlot {
    fn current(&self) -> Option<Arc<dyn WalletSigner>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// secp256k1 key held in-process
pub struct LocalSigner {
    inner: PrivateKeySigner,
}

impl LocalSigner {
    pub fn from_bytes(secret: &[u8]) -> Result<Self> {
        let inner = PrivateKeySigner::from_slice(secret)
            .map_err(|e| Error::Signer(format!("invalid private key: {}", e)))?;
        Ok(Self { inner })
    }

    pub fn from_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.trim()).map_err(|e| Error::InvalidData(format!("invalid hex key: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
        }
    }

    /// low-s, recoverable signature over a 32-byte digest
    pub fn sign_prehash(&self, prehash: &B256) -> Result<Signature> {
        self.inner
            .sign_hash_sync(prehash)
            .map_err(|e| Error::Signer(e.to_string()))
    }
}

#[async_trait]
impl WalletSigner for LocalSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_authorization(&self, delegate: Address, chain_id: u64, nonce: u64) -> Result<SignedAuthorization> {
        let unsigned = authorization(delegate, chain_id, nonce);
        let signature = self.sign_prehash(&unsigned.signature_hash())?;
        Ok(unsigned.into_signed(signature))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.sign_prehash(&personal_message_hash(message))
    }
}
