//! Replay payloads through the handler against an in-memory ledger
//!
//! ```text
//! gcxb-replay [--config <path>] [--metrics] [payloads.txt]
//! ```
//!
//! Reads one payload per line (stdin when no file is given). Blank lines and
//! lines starting with `#` are skipped. With `--metrics` the Prometheus
//! counters are written to stderr once the input is exhausted.

use anyhow::Context;
use gcxb_processor::{metrics::Metrics, Config, GcxbHandler, InMemoryState, TransactionRequest};
use std::io::{BufRead, BufReader};

fn main() -> anyhow::Result<()> {
    let mut config_path = None;
    let mut input_path = None;
    let mut dump_metrics = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = Some(args.next().context("--config needs a path")?),
            "--metrics" => dump_metrics = true,
            _ => input_path = Some(arg),
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let metrics = Metrics::new().context("Failed to register metrics")?;
    let handler = GcxbHandler::from_config(&config).with_metrics(metrics.clone());
    let state = InMemoryState::new().restricted_to(config.namespace());

    let reader: Box<dyn BufRead> = match &input_path {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let (mut applied, mut rejected) = (0usize, 0usize);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let payload = line.trim_end_matches('\r');
        if payload.trim().is_empty() || payload.starts_with('#') {
            continue;
        }

        let request = TransactionRequest::from_payload(payload);
        match handler.process(&request, &state) {
            Ok(outcome) => {
                applied += 1;
                let addresses: Vec<&str> = outcome.committed.iter().map(|a| a.as_str()).collect();
                println!(
                    "{}: applied {} [{}]",
                    index + 1,
                    outcome.transaction_type,
                    addresses.join(", ")
                );
            }
            Err(err) if err.is_invalid_transaction() => {
                rejected += 1;
                println!("{}: rejected: {}", index + 1, err);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Internal failure on line {}", index + 1));
            }
        }
    }

    tracing::info!(applied, rejected, entries = state.len(), "Replay finished");
    if dump_metrics {
        eprint!("{}", metrics.export().context("Failed to export metrics")?);
    }
    Ok(())
}
