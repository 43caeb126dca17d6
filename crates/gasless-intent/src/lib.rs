//! # gasless-intent
//!
//! turns a list of on-chain calls into a relayer-executed intent: the user
//! signs an eip-7702 delegation and a personal-message signature over the
//! batch digest, the relayer pays gas and executes.
//!
//! ## flow
//!
//! ```text
//!   calls ──► codec ──► ChainBatch + hash
//!                           │
//!            ┌──────────────┴──────────────┐
//!            ▼                             ▼
//!   sign authorization            sign intent digest
//!   (delegate, chain, nonce)      (personal message)
//!            └──────────────┬──────────────┘
//!                           ▼
//!              POST /transaction/submit
//!                           ▼
//!              POST /intent/{id}/step/0
//!                           ▼
//!        GET /intent/{id}/step/0/status  (every 3s, ≤ 60 times)
//! ```
//!
//! ## usage
//!
//! ```rust,ignore
//! use gasless_intent::*;
//! use std::sync::Arc;
//!
//! let wallets = Arc::new(WalletSlot::connected(Arc::new(LocalSigner::from_hex(key)?)));
//! let config = OrchestratorConfig::new("https://relay.example/api", delegate);
//! let orchestrator = GaslessOrchestrator::new(
//!     config.clone(),
//!     wallets,
//!     Arc::new(JsonRpcChain::new(rpc_url)?),
//!     Arc::new(HttpRelayer::new(&config.api_url)),
//! );
//!
//! let outcome = orchestrator
//!     .execute(request, &|p: GaslessProgress| println!("{}: {}", p.step, p.message))
//!     .await?;
//! ```

pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod progress;
pub mod relayer;
pub mod signer;
pub mod types;

pub use chain::{ChainReader, JsonRpcChain};
pub use codec::{batch_hash, hash_chain_batches, intent_hash, keccak256};
pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use lock::{ExecutionGuard, ExecutionLock};
pub use orchestrator::{ExecutionOutcome, GaslessOrchestrator, GaslessRequest};
pub use progress::{ChannelSink, GaslessProgress, GaslessStep, NoProgress, ProgressSink};
pub use relayer::{HttpRelayer, IntentStatus, Relayer, RelayerReply, StepStatus, SubmitRequest};
pub use signer::{
    Authorization, LocalSigner, Signature, SignedAuthorization, WalletProvider, WalletSigner, WalletSlot,
};
pub use types::{Address, Bytes, Call, ChainBatch, HashedChainBatch, B256, U256};

pub use tokio_util::sync::CancellationToken;
