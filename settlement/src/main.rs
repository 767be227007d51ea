//! TokenSettle Node Binary
//!
//! Runs invocations read from stdin, one per line, against an in-memory
//! ledger. Each line is `<Function> <arg> <arg>...`; each result is printed
//! as `OK <payload>` or `ERR <CODE> <message>`.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokensettle_ledger::MemoryLedger;
use tokensettle_settlement::{Dispatcher, NodeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_env();

    // Logs go to stderr; stdout carries results only.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if config.log_json {
        tracing_subscriber::registry().with(filter).with(fmt.json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt).init();
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        role_attribute = %config.auth.role_attribute,
        central_bank_role = %config.auth.central_bank_role,
        central_bank_msp = ?config.auth.central_bank_msp,
        "Starting TokenSettle node"
    );

    let ledger = MemoryLedger::new();
    let dispatcher = Dispatcher::new(config.auth.policy());
    let identity = config.caller_identity.into_bytes();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut invocations = 0u64;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };
        let Some(line) = line else { break };

        let mut parts = line.split_whitespace();
        let Some(function) = parts.next() else { continue };
        if function.starts_with('#') {
            continue;
        }
        let args: Vec<String> = parts.map(str::to_string).collect();

        invocations += 1;
        match ledger.execute(identity.clone(), |inv| {
            debug!(invocation_id = %inv.id(), function = function, "Invocation received");
            dispatcher.invoke(inv, function, &args)
        }) {
            Ok(payload) => println!("OK {}", payload),
            Err(e) => {
                warn!(function = function, code = e.error_code(), error = %e, "Invocation failed");
                println!("ERR {} {}", e.error_code(), e);
            }
        }
    }

    info!(invocations = invocations, "TokenSettle node stopped");
    Ok(())
}
