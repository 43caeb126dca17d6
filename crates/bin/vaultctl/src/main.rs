//! vaultctl - vault yield, position p&l and gasless deposits
//!
//! ```text
//! vaultctl apy --snapshots rates.json
//! vaultctl position --shares 1000000000000000000 --cost-basis 1000000000000000000 --rate 1080000000000000000 --decimals 6
//! vaultctl intent-hash --calls calls.json --chain-id 8453 --recent-block 1000010
//! vaultctl execute --calls calls.json --token 0x… --amount 1000000
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gasless_intent::{
    hash_chain_batches, intent_hash, Address, Call, CancellationToken, ChainBatch, ExecutionOutcome,
    GaslessOrchestrator, GaslessProgress, GaslessRequest, GaslessStep, HttpRelayer, JsonRpcChain, LocalSigner,
    OrchestratorConfig, WalletSlot, U256,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use vault_rates::{
    estimate_apy, format_units, format_unsigned_units, parse_snapshots_json, Denominator, Position, PositionInput,
    PositionValuator, RateValuator,
};

#[derive(Parser)]
#[command(name = "vaultctl")]
#[command(about = "vault yield estimates and gasless intent execution")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Annualized yield from redemption-rate snapshots
    Apy {
        /// JSON array of {"rate": "<wad>", "timestamp": <unix secs>}
        #[arg(long)]
        snapshots: PathBuf,

        /// Evaluation time (unix seconds), defaults to now
        #[arg(long)]
        now: Option<u64>,

        #[arg(long, value_enum, default_value_t = DenominatorArg::Anchor)]
        denominator: DenominatorArg,
    },

    /// Value a share position at a redemption rate
    Position {
        /// Share balance, smallest unit
        #[arg(long)]
        shares: u128,

        /// Cost basis, 18 decimals
        #[arg(long)]
        cost_basis: u128,

        /// Realized p&l, 18 decimals
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        realized: i128,

        /// Assets per share, 18 decimals
        #[arg(long)]
        rate: u128,

        /// Decimals of the underlying asset
        #[arg(long, default_value_t = 18)]
        decimals: u8,
    },

    /// Print batch and intent digests for a list of calls
    IntentHash {
        /// JSON array of {"to": "0x…", "value": "<dec>", "data": "0x…"}
        #[arg(long)]
        calls: PathBuf,

        #[arg(long)]
        chain_id: u64,

        #[arg(long)]
        recent_block: u64,
    },

    /// Sign and submit calls through the relayer, then wait for execution
    Execute {
        #[arg(long)]
        calls: PathBuf,

        /// Token the relayer takes its fee in
        #[arg(long)]
        token: Address,

        /// Token amount, smallest unit
        #[arg(long)]
        amount: U256,

        /// Relayer API base URL
        #[arg(long, env = "VAULTCTL_API_URL", default_value = "http://localhost:8080")]
        api_url: String,

        /// Ethereum JSON-RPC endpoint
        #[arg(long, env = "VAULTCTL_RPC_URL", default_value = "http://localhost:8545")]
        rpc_url: String,

        /// Contract the account delegates to
        #[arg(long, env = "VAULTCTL_DELEGATE")]
        delegate: Address,

        /// Hex secp256k1 key of the signing account
        #[arg(long, env = "VAULTCTL_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        /// Milliseconds between status polls
        #[arg(long)]
        poll_interval_ms: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DenominatorArg {
    Anchor,
    Latest,
}

impl From<DenominatorArg> for Denominator {
    fn from(arg: DenominatorArg) -> Self {
        match arg {
            DenominatorArg::Anchor => Denominator::Anchor,
            DenominatorArg::Latest => Denominator::Latest,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaultctl=info,gasless_intent=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Apy {
            snapshots,
            now,
            denominator,
        } => cmd_apy(&snapshots, now, denominator.into()),
        Command::Position {
            shares,
            cost_basis,
            realized,
            rate,
            decimals,
        } => {
            let position = Position {
                share_balance: shares,
                cost_basis,
                realized_pnl: realized,
            };
            cmd_position(&position, rate, decimals)
        }
        Command::IntentHash {
            calls,
            chain_id,
            recent_block,
        } => cmd_intent_hash(&calls, chain_id, recent_block),
        Command::Execute {
            calls,
            token,
            amount,
            api_url,
            rpc_url,
            delegate,
            private_key,
            poll_interval_ms,
        } => {
            let mut config = OrchestratorConfig::new(api_url, delegate);
            if let Some(ms) = poll_interval_ms {
                config.poll_interval_ms = ms;
            }
            let request = GaslessRequest {
                calls: load_calls(&calls)?,
                token_address: token,
                token_amount: amount,
            };
            cmd_execute(config, &rpc_url, &private_key, request).await
        }
    }
}

fn cmd_apy(path: &Path, now: Option<u64>, denominator: Denominator) -> Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshots = parse_snapshots_json(&json)?;

    match estimate_apy(&snapshots, now, denominator) {
        Some(apy) => {
            info!("window {}s over {} snapshots", apy.window_seconds, snapshots.len());
            match denominator {
                Denominator::Anchor => println!("apy: {}%", apy.apy_string),
                Denominator::Latest => println!("apy: {}", apy.apy_string),
            }
        }
        None => println!("apy: n/a (not enough rate history)"),
    }
    Ok(())
}

fn cmd_position(position: &Position, rate: u128, decimals: u8) -> Result<()> {
    print!("{}", position_report(position, rate, decimals));
    Ok(())
}

fn position_report(position: &Position, rate: u128, decimals: u8) -> String {
    let value = RateValuator.value(&PositionInput::new(position, rate, decimals));
    let d = decimals as u32;

    format!(
        "underlying:     {}\ncost basis:     {}\nunrealized p&l: {}\ntotal p&l:      {}\n",
        format_unsigned_units(value.underlying_value, d),
        format_unsigned_units(value.cost_basis, d),
        format_units(value.unrealized_pnl, d),
        format_units(value.total_pnl, d),
    )
}

fn cmd_intent_hash(path: &Path, chain_id: u64, recent_block: u64) -> Result<()> {
    let batches = hash_chain_batches(&[ChainBatch {
        chain_id,
        calls: load_calls(path)?,
        recent_block,
    }]);

    for batch in &batches {
        println!("batch  {} (chain {}, {} calls)", batch.hash, batch.chain_id, batch.calls.len());
    }
    println!("intent {}", intent_hash(&batches));
    Ok(())
}

async fn cmd_execute(config: OrchestratorConfig, rpc_url: &str, private_key: &str, request: GaslessRequest) -> Result<()> {
    let signer = LocalSigner::from_hex(private_key).context("loading private key")?;
    let relayer = HttpRelayer::new(&config.api_url);
    let orchestrator = GaslessOrchestrator::new(
        config,
        Arc::new(WalletSlot::connected(Arc::new(signer))),
        Arc::new(JsonRpcChain::new(rpc_url).context("connecting to rpc")?),
        Arc::new(relayer),
    );

    // ctrl-c stops waiting; the relayer keeps the intent
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let print = |p: GaslessProgress| match p.step {
        GaslessStep::Error => eprintln!("[{}] {}", p.step, p.error.as_deref().unwrap_or(&p.message)),
        _ => eprintln!("[{}] {}", p.step, p.message),
    };

    match orchestrator.execute_with_cancel(request, &print, cancel).await {
        Ok(ExecutionOutcome::Completed { intent_id, tx_hash }) => {
            println!("intent:  {}", intent_id);
            println!("tx hash: {}", tx_hash.as_deref().unwrap_or("(not reported)"));
            Ok(())
        }
        Ok(ExecutionOutcome::StillProcessing { intent_id }) => {
            println!("intent:  {} (still processing)", intent_id);
            Ok(())
        }
        Err(e) if e.is_retryable() => {
            warn!("nothing was submitted, safe to retry");
            bail!(e)
        }
        Err(e) => bail!(e),
    }
}

fn load_calls(path: &Path) -> Result<Vec<Call>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_calls(&json)
}

fn parse_calls(json: &str) -> Result<Vec<Call>> {
    let calls: Vec<Call> = serde_json::from_str(json).context("parsing calls")?;
    if calls.is_empty() {
        bail!("call file is empty");
    }
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calls() {
        let json = r#"[
            {"to": "0x00000000000000000000000000000000000000aa", "value": "0", "data": "0x095ea7b3"},
            {"to": "0x00000000000000000000000000000000000000bb", "value": "1000", "data": "0x"}
        ]"#;
        let calls = parse_calls(json).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(&calls[0].data[..], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(calls[1].value, U256::from(1000));
        assert!(calls[1].data.is_empty());
    }

    #[test]
    fn test_position_report_full_range() {
        let position = Position {
            share_balance: u128::MAX,
            cost_basis: u128::MAX,
            realized_pnl: 0,
        };
        let report = position_report(&position, 1_000_000_000_000_000_000, 18);
        assert_eq!(
            report,
            "underlying:     340282366920938463463.374607431768211455\n\
             cost basis:     340282366920938463463.374607431768211455\n\
             unrealized p&l: 0\n\
             total p&l:      0\n"
        );
        assert!(!report.contains('-'));
    }

    #[test]
    fn test_execute_amount_above_u128() {
        let cli = Cli::try_parse_from([
            "vaultctl",
            "execute",
            "--calls",
            "calls.json",
            "--token",
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            "--amount",
            "1000000000000000000000000000000000000000",
            "--delegate",
            "0x63c0c19a282a1b52b07dd5a65b58948a07dae32b",
            "--private-key",
            "0x01",
        ])
        .unwrap();
        match cli.command {
            Command::Execute { amount, .. } => {
                assert_eq!(amount, U256::from(10u64).pow(U256::from(39)));
            }
            _ => panic!("expected execute"),
        }
    }

    #[test]
    fn test_empty_call_file_rejected() {
        assert!(parse_calls("[]").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from([
            "vaultctl",
            "position",
            "--shares",
            "1000",
            "--cost-basis",
            "900",
            "--realized",
            "-5",
            "--rate",
            "1000000000000000000",
        ])
        .unwrap();
        match cli.command {
            Command::Position { realized, decimals, .. } => {
                assert_eq!(realized, -5);
                assert_eq!(decimals, 18);
            }
            _ => panic!("expected position"),
        }
    }
}
