//! progress events emitted while an intent executes

use crate::Error;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GaslessStep {
    Idle,
    Building,
    SigningDelegation,
    SigningIntent,
    Submitting,
    Executing,
    Success,
    Error,
}

impl GaslessStep {
    pub fn is_terminal(self) -> bool {
        matches!(self, GaslessStep::Success | GaslessStep::Error)
    }

    /// the ui must not be closed while the wallet is mid-signature
    pub fn can_dismiss(self) -> bool {
        !matches!(self, GaslessStep::SigningDelegation | GaslessStep::SigningIntent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GaslessStep::Idle => "idle",
            GaslessStep::Building => "building",
            GaslessStep::SigningDelegation => "signing-delegation",
            GaslessStep::SigningIntent => "signing-intent",
            GaslessStep::Submitting => "submitting",
            GaslessStep::Executing => "executing",
            GaslessStep::Success => "success",
            GaslessStep::Error => "error",
        }
    }
}

impl std::fmt::Display for GaslessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaslessProgress {
    pub step: GaslessStep,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GaslessProgress {
    pub fn step(step: GaslessStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            tx_hash: None,
            error: None,
        }
    }

    pub fn success(message: impl Into<String>, tx_hash: Option<String>) -> Self {
        Self {
            tx_hash,
            ..Self::step(GaslessStep::Success, message)
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::step(GaslessStep::Error, "Transaction failed")
        }
    }
}

/// receives progress events, synchronously, in emission order
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: GaslessProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(GaslessProgress) + Send + Sync,
{
    fn emit(&self, progress: GaslessProgress) {
        self(progress)
    }
}

/// forwards events into a channel for a consumer on another task
#[derive(Clone)]
pub struct ChannelSink(pub UnboundedSender<GaslessProgress>);

impl ProgressSink for ChannelSink {
    fn emit(&self, progress: GaslessProgress) {
        // a dropped receiver just means nobody is watching any more
        let _ = self.0.send(progress);
    }
}

/// discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _progress: GaslessProgress) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_step_wire_names() {
        let json = serde_json::to_value(GaslessProgress::step(GaslessStep::SigningDelegation, "sign")).unwrap();
        assert_eq!(json["step"], "signing-delegation");
        assert!(json.get("txHash").is_none());
        assert_eq!(GaslessStep::SigningIntent.to_string(), "signing-intent");
    }

    #[test]
    fn test_dismiss_and_terminal() {
        assert!(!GaslessStep::SigningDelegation.can_dismiss());
        assert!(!GaslessStep::SigningIntent.can_dismiss());
        assert!(GaslessStep::Executing.can_dismiss());
        assert!(GaslessStep::Error.is_terminal());
        assert!(!GaslessStep::Submitting.is_terminal());
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: GaslessProgress| seen.lock().unwrap().push(p.step);
        sink.emit(GaslessProgress::step(GaslessStep::Building, "b"));
        sink.emit(GaslessProgress::failed(&Error::NoWallet));
        assert_eq!(*seen.lock().unwrap(), vec![GaslessStep::Building, GaslessStep::Error]);
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelSink(tx);
        sink.emit(GaslessProgress::success("done", Some("0xabc".into())));
        let got = rx.recv().await.unwrap();
        assert_eq!(got.step, GaslessStep::Success);
        assert_eq!(got.tx_hash.as_deref(), Some("0xabc"));
    }
}
