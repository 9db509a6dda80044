//! `gateway-call` — invoke methods on a remote object through the HTTP gateway.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — endpoint and call options come from flags, with
//!    `GATEWAY_HOST` / `GATEWAY_PORT` / `GATEWAY_PREFIX` as fallbacks.
//! 2. **Wire observability** — configure `tracing-subscriber` on stderr (plain
//!    text, or JSON with `--json-logs`). `RUST_LOG` overrides the default
//!    filter. Failed calls are reported here by the `gateway` crate.
//! 3. **Fan out** — issue one call per METHOD concurrently and print each
//!    result to stdout as soon as it arrives, so output order is not fixed.
//!
//! Exits with status 1 if any call did not deliver a result.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gateway::{dispatch, CallOptions, CorrelationId, GatewayConfig, GatewayRequest, Value};
use gateway_http::HttpGatewayCaller;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "gateway-call", version, about = "Call remote object methods through the HTTP gateway")]
struct Cli {
    /// Gateway host.
    #[arg(long, env = "GATEWAY_HOST", default_value = "localhost")]
    host: String,

    /// Gateway port.
    #[arg(short, long, env = "GATEWAY_PORT", default_value_t = 8080)]
    port: u16,

    /// Path prefix under which the gateway serves objects.
    #[arg(long, env = "GATEWAY_PREFIX", default_value = "pyro")]
    prefix: String,

    /// Do not wait for method results (the gateway returns an empty body).
    #[arg(long)]
    oneway: bool,

    /// Key for gateways that require one.
    #[arg(long, env = "GATEWAY_KEY", hide_env_values = true)]
    gateway_key: Option<String>,

    /// Correlation id to propagate to the remote side.
    #[arg(long)]
    correlation_id: Option<CorrelationId>,

    /// Extra `key=value` argument added to every call's query string.
    #[arg(short = 'a', long = "arg", value_parser = parse_key_value)]
    args: Vec<(String, String)>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Remote object name, e.g. `Pyro.NameServer`.
    object: String,

    /// Methods to call; each may embed a query, e.g. `lookup?name=Pyro.NameServer`.
    #[arg(required = true)]
    methods: Vec<String>,
}

impl Cli {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.host.clone(), self.port).with_prefix(self.prefix.clone())
    }

    fn call_options(&self) -> CallOptions {
        CallOptions {
            oneway: self.oneway,
            correlation_id: self.correlation_id,
            gateway_key: self.gateway_key.clone(),
        }
    }

    fn requests(&self) -> Result<Vec<GatewayRequest>> {
        self.methods
            .iter()
            .map(|method| {
                let request = GatewayRequest::from_parts(&self.object, method)
                    .with_context(|| format!("invalid call {}/{}", self.object, method))?;
                let request = self
                    .args
                    .iter()
                    .fold(request, |request, (key, value)| request.with_arg(key, value));
                Ok(request.with_options(self.call_options()))
            })
            .collect()
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing already initialized: {err}");
    }
}

fn print_result(method: &str, value: &Value) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    println!("\n{method}--->\n{rendered}");
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.gateway_config();
    let caller = HttpGatewayCaller::new(config).context("failed to set up gateway caller")?;
    info!(
        endpoint = %caller.config().base_url(),
        prefix = %caller.config().prefix,
        calls = cli.methods.len(),
        "Calling gateway"
    );

    let mut calls = JoinSet::new();
    for request in cli.requests()? {
        let caller = caller.clone();
        calls.spawn(async move {
            let method = request.method().to_string();
            dispatch(&caller, &request, |value| print_result(&method, &value)).await
        });
    }

    let mut failures = 0usize;
    while let Some(joined) = calls.join_next().await {
        match joined {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(err) => {
                error!(error = %err, "Gateway call task failed");
                failures += 1;
            }
        }
    }

    if failures == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failures, "Some gateway calls did not deliver a result");
        Ok(ExitCode::FAILURE)
    }
}
