//! gasless execution state machine
//!
//! ```text
//! idle → building → signing-delegation → signing-intent → submitting → executing → success
//!                                                                                 ↘ error
//! ```
//!
//! one execution at a time per [`ExecutionLock`]. the guard is taken before
//! any wallet interaction and dropped on every exit path, before an error
//! is reported.

use crate::chain::ChainReader;
use crate::codec::{hash_chain_batches, intent_hash};
use crate::config::OrchestratorConfig;
use crate::lock::ExecutionLock;
use crate::progress::{GaslessProgress, GaslessStep, ProgressSink};
use crate::relayer::{IntentStatus, Relayer, RelayerReply, SubmitRequest};
use crate::signer::WalletProvider;
use crate::types::{Address, Call, ChainBatch, U256};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// what the caller wants executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaslessRequest {
    pub calls: Vec<Call>,
    /// submission metadata only, not part of the signed batch
    pub token_address: Address,
    pub token_amount: U256,
}

impl GaslessRequest {
    pub fn validate(&self) -> Result<()> {
        if self.calls.is_empty() {
            return Err(Error::InvalidRequest("no calls to execute".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// relayer reported success
    Completed {
        intent_id: String,
        tx_hash: Option<String>,
    },
    /// stopped watching before a terminal status; the relayer may still land it
    StillProcessing { intent_id: String },
}

impl ExecutionOutcome {
    pub fn intent_id(&self) -> &str {
        match self {
            ExecutionOutcome::Completed { intent_id, .. } => intent_id,
            ExecutionOutcome::StillProcessing { intent_id } => intent_id,
        }
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Completed { tx_hash, .. } => tx_hash.as_deref(),
            ExecutionOutcome::StillProcessing { .. } => None,
        }
    }
}

pub struct GaslessOrchestrator {
    config: OrchestratorConfig,
    wallets: Arc<dyn WalletProvider>,
    chain: Arc<dyn ChainReader>,
    relayer: Arc<dyn Relayer>,
    lock: ExecutionLock,
}

impl GaslessOrchestrator {
    /// shares the process-wide execution lock
    pub fn new(
        config: OrchestratorConfig,
        wallets: Arc<dyn WalletProvider>,
        chain: Arc<dyn ChainReader>,
        relayer: Arc<dyn Relayer>,
    ) -> Self {
        Self {
            config,
            wallets,
            chain,
            relayer,
            lock: ExecutionLock::global(),
        }
    }

    pub fn with_lock(mut self, lock: ExecutionLock) -> Self {
        self.lock = lock;
        self
    }

    pub fn lock(&self) -> &ExecutionLock {
        &self.lock
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// run one execution to a terminal state
    pub async fn execute(&self, request: GaslessRequest, progress: &dyn ProgressSink) -> Result<ExecutionOutcome> {
        self.execute_with_cancel(request, progress, CancellationToken::new())
            .await
    }

    /// like [`execute`](Self::execute); cancelling `cancel` stops status
    /// polling early with [`ExecutionOutcome::StillProcessing`]. signing and
    /// submission are never interrupted.
    pub async fn execute_with_cancel(
        &self,
        request: GaslessRequest,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome> {
        let Some(guard) = self.lock.try_acquire() else {
            warn!("rejecting execution: another one holds the lock");
            return Err(Error::AlreadyInProgress);
        };

        let result = self.run(&request, progress, &cancel).await;
        drop(guard);

        if let Err(e) = &result {
            warn!("gasless execution failed: {}", e);
            progress.emit(GaslessProgress::failed(e));
        }
        result
    }

    async fn run(
        &self,
        request: &GaslessRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome> {
        progress.emit(GaslessProgress::step(GaslessStep::Building, "Preparing transaction"));
        request.validate()?;

        // resolved now, not when the orchestrator was built
        let wallet = self.wallets.current().ok_or(Error::NoWallet)?;
        let address = wallet.address();

        let chain_id = self.chain.chain_id().await?;
        let head = self.chain.block_number().await?;
        let nonce = self.chain.transaction_count(&address).await?;
        let recent_block = head.checked_add(self.config.recent_block_buffer).ok_or_else(|| {
            Error::InvalidData(format!(
                "head block {} plus buffer {} overflows",
                head, self.config.recent_block_buffer
            ))
        })?;

        let batch = ChainBatch {
            chain_id,
            calls: request.calls.clone(),
            recent_block,
        };
        let batches = hash_chain_batches(std::slice::from_ref(&batch));
        debug!(
            "built batch for {} on chain {}: {} calls, recent block {}, nonce {}",
            address,
            chain_id,
            batch.calls.len(),
            batch.recent_block,
            nonce
        );

        progress.emit(GaslessProgress::step(
            GaslessStep::SigningDelegation,
            "Approve the account delegation in your wallet",
        ));
        let authorization = wallet
            .sign_authorization(self.config.delegate, chain_id, nonce)
            .await?;

        progress.emit(GaslessProgress::step(
            GaslessStep::SigningIntent,
            "Sign the transaction intent in your wallet",
        ));
        let digest = intent_hash(&batches);
        let signature = wallet.sign_message(digest.as_slice()).await?;

        progress.emit(GaslessProgress::step(GaslessStep::Submitting, "Submitting to relayer"));
        let submit = SubmitRequest::new(
            address,
            &authorization,
            &signature,
            batches,
            request.token_address,
            request.token_amount,
        );
        let intent_id = match self.relayer.submit(&submit).await? {
            Some(id) => id,
            None => signature.to_string(),
        };
        info!("intent {} submitted for {}", intent_id, address);

        progress.emit(GaslessProgress::step(GaslessStep::Executing, "Executing transaction"));
        self.execute_intent(&intent_id, progress, cancel).await
    }

    async fn execute_intent(
        &self,
        intent_id: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome> {
        match self.relayer.trigger_step(intent_id).await {
            Ok(RelayerReply::NotFound) => {
                return Err(Error::IntentNotFound(format!(
                    "relayer does not recognize intent {}",
                    intent_id
                )));
            }
            Ok(RelayerReply::Status(status)) if is_success(status.status) => {
                return Ok(self.completed(intent_id, status.transaction_hash, progress));
            }
            Ok(RelayerReply::Status(status)) => {
                debug!("trigger for {} returned {:?}, polling", intent_id, status.status);
            }
            Err(e) => {
                warn!("trigger for {} failed, polling instead: {}", intent_id, e);
            }
        }

        self.poll(intent_id, progress, cancel).await
    }

    async fn poll(
        &self,
        intent_id: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome> {
        let mut ticks = interval(self.config.poll_interval());
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick is immediate; every poll waits a full interval
        ticks.tick().await;

        let mut consecutive_not_found = 0u32;

        for attempt in 1..=self.config.max_poll_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("stopped polling {} after {} attempts", intent_id, attempt - 1);
                    return Ok(self.still_processing(intent_id, progress));
                }
                _ = ticks.tick() => {}
            }

            match self.relayer.step_status(intent_id).await {
                Ok(RelayerReply::NotFound) => {
                    consecutive_not_found += 1;
                    warn!(
                        "intent {} not found (attempt {}, {} in a row)",
                        intent_id, attempt, consecutive_not_found
                    );
                    if consecutive_not_found >= self.config.not_found_threshold {
                        return Err(Error::IntentNotFound(format!(
                            "intent {} not found after {} consecutive 404s",
                            intent_id, consecutive_not_found
                        )));
                    }
                }
                Ok(RelayerReply::Status(status)) => {
                    consecutive_not_found = 0;
                    match status.status {
                        IntentStatus::Success | IntentStatus::Completed => {
                            return Ok(self.completed(intent_id, status.transaction_hash, progress));
                        }
                        IntentStatus::Reverted | IntentStatus::Error => {
                            let reason = status
                                .error
                                .unwrap_or_else(|| "execution failed on-chain".into());
                            return Err(Error::Reverted(format!(
                                "{}. check your token balance, allowance and the vault's deposit limits",
                                reason
                            )));
                        }
                        IntentStatus::Pending
                        | IntentStatus::Created
                        | IntentStatus::Submitted
                        | IntentStatus::Executing
                        | IntentStatus::Unknown => {
                            debug!("intent {} is {:?} (attempt {})", intent_id, status.status, attempt);
                        }
                    }
                }
                Err(e) => {
                    warn!("status poll {} for {} failed: {}", attempt, intent_id, e);
                }
            }
        }

        info!(
            "intent {} not final after {} polls, leaving it to the relayer",
            intent_id, self.config.max_poll_attempts
        );
        Ok(self.still_processing(intent_id, progress))
    }

    fn completed(&self, intent_id: &str, tx_hash: Option<String>, progress: &dyn ProgressSink) -> ExecutionOutcome {
        info!("intent {} executed, tx {:?}", intent_id, tx_hash);
        progress.emit(GaslessProgress::success("Transaction confirmed", tx_hash.clone()));
        ExecutionOutcome::Completed {
            intent_id: intent_id.to_string(),
            tx_hash,
        }
    }

    fn still_processing(&self, intent_id: &str, progress: &dyn ProgressSink) -> ExecutionOutcome {
        progress.emit(GaslessProgress::success(
            "Transaction submitted and still processing, check back later",
            None,
        ));
        ExecutionOutcome::StillProcessing {
            intent_id: intent_id.to_string(),
        }
    }
}

fn is_success(status: IntentStatus) -> bool {
    matches!(status, IntentStatus::Success | IntentStatus::Completed)
}
