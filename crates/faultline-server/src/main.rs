// Control API binary for the Faultline failure-injection proxy

use std::sync::Arc;

use clap::Parser;
use faultline_core::FaultlineCore;
use faultline_server::ControlServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Failure-injection control API for driver resilience testing", long_about = None)]
struct Args {
    /// Control API listen port
    #[arg(long, default_value_t = 18081)]
    api_port: u16,

    /// Proxy data-plane port (owned by the interception engine; advertised
    /// here so harness configs have one source of truth)
    #[arg(long, default_value_t = 18080)]
    proxy_port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let core = Arc::new(FaultlineCore::new());
    info!("loaded {} failure scenarios", core.list_scenarios().len());
    info!("proxy data plane on port {} (interception engine)", args.proxy_port);
    info!("control API on port {}", args.api_port);

    ControlServer::new(format!("0.0.0.0:{}", args.api_port), core)
        .start()
        .await
}
