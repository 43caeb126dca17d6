//! relayer api client
//!
//! ```text
//! POST {api}/transaction/submit              -> { data: { intentId } }
//! POST {api}/intent/{id}/step/0              -> { data: { status, transactionHash? } } | 404
//! GET  {api}/intent/{id}/step/0/status       -> { data: { status, transactionHash?, error? } } | 404
//! ```

use crate::signer::{Signature, SignedAuthorization};
use crate::types::{decimal, Address, HashedChainBatch, B256, U256};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// body of `/transaction/submit`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub address: Address,
    pub authorization: Vec<WireAuthorization>,
    pub intent_authorization: IntentAuthorization,
    pub token_address: Address,
    #[serde(with = "decimal")]
    pub token_amount: U256,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAuthorization {
    pub address: Address,
    #[serde(with = "decimal")]
    pub chain_id: U256,
    #[serde(with = "decimal")]
    pub nonce: u64,
    pub r: B256,
    pub s: B256,
    pub y_parity: u8,
}

impl From<&SignedAuthorization> for WireAuthorization {
    fn from(auth: &SignedAuthorization) -> Self {
        Self {
            address: auth.address,
            chain_id: auth.chain_id,
            nonce: auth.nonce,
            r: auth.r().to_be_bytes::<32>().into(),
            s: auth.s().to_be_bytes::<32>().into(),
            y_parity: auth.y_parity(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentAuthorization {
    /// 65-byte intent signature, hex
    pub signature: String,
    pub chain_batches: Vec<HashedChainBatch>,
}

impl SubmitRequest {
    pub fn new(
        address: Address,
        authorization: &SignedAuthorization,
        intent_signature: &Signature,
        chain_batches: Vec<HashedChainBatch>,
        token_address: Address,
        token_amount: U256,
    ) -> Self {
        Self {
            address,
            authorization: vec![authorization.into()],
            intent_authorization: IntentAuthorization {
                signature: intent_signature.to_string(),
                chain_batches,
            },
            token_address,
            token_amount,
        }
    }
}

/// execution status reported by the relayer for an intent step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    Pending,
    Created,
    Submitted,
    Executing,
    Success,
    Completed,
    Reverted,
    Error,
    /// anything this client does not know yet; treated as still pending
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    #[serde(default)]
    pub status: IntentStatus,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// what the relayer said about an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayerReply {
    /// http 404: the relayer does not know this intent (yet)
    NotFound,
    Status(StepStatus),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitData {
    intent_id: Option<String>,
}

#[async_trait]
pub trait Relayer: Send + Sync {
    /// submit a signed intent; returns the relayer's intent id when it gives one
    async fn submit(&self, request: &SubmitRequest) -> Result<Option<String>>;

    /// ask the relayer to execute step 0 now
    async fn trigger_step(&self, intent_id: &str) -> Result<RelayerReply>;

    async fn step_status(&self, intent_id: &str) -> Result<RelayerReply>;
}

/// relayer over https
#[derive(Clone)]
pub struct HttpRelayer {
    api_url: String,
    http: Client,
}

impl HttpRelayer {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// api url with `segments` appended, each percent-encoded as a single path segment
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| Error::InvalidData(format!("invalid api url {:?}: {}", self.api_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidData(format!("api url {:?} cannot take a path", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_reply(&self, response: reqwest::Response) -> Result<RelayerReply> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(RelayerReply::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!("relayer returned {}: {}", status.as_u16(), body)));
        }

        let envelope: Envelope<StepStatus> = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(e.to_string()))?;
        Ok(RelayerReply::Status(envelope.data.unwrap_or_default()))
    }
}

#[async_trait]
impl Relayer for HttpRelayer {
    async fn submit(&self, request: &SubmitRequest) -> Result<Option<String>> {
        let response = self
            .http
            .post(self.endpoint(&["transaction", "submit"])?)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Submission {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| Error::Network(e.to_string()))?;
        debug!("submit response: {}", body);

        // a 2xx without a parseable id still means the intent was accepted
        let intent_id = serde_json::from_str::<Envelope<SubmitData>>(&body)
            .ok()
            .and_then(|e| e.data)
            .and_then(|d| d.intent_id)
            .filter(|id| !id.is_empty());
        Ok(intent_id)
    }

    async fn trigger_step(&self, intent_id: &str) -> Result<RelayerReply> {
        let response = self
            .http
            .post(self.endpoint(&["intent", intent_id, "step", "0"])?)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        self.read_reply(response).await
    }

    async fn step_status(&self, intent_id: &str) -> Result<RelayerReply> {
        let response = self
            .http
            .get(self.endpoint(&["intent", intent_id, "step", "0", "status"])?)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        self.read_reply(response).await
    }
}
