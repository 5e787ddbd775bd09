use anyhow::{Context, Result};
use clap::Parser;
use gemini_proxy::ai::{GeminiGenerationClient, GenerationService};
use gemini_proxy::models::Config;
use gemini_proxy::proxy::ProxyHandler;
use gemini_proxy::server;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-proxy")]
#[command(about = "Proxy text and image prompts to the Gemini API")]
struct CliArgs {
    /// Address to bind; overrides HOST.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on; overrides PORT.
    #[arg(long, short)]
    port: Option<u16>,
}

fn bind_addr(args: &CliArgs, config: &Config) -> Result<SocketAddr> {
    let host = match args.host {
        Some(host) => host,
        None => config
            .host
            .parse()
            .with_context(|| format!("Invalid HOST '{}'", config.host))?,
    };
    Ok(SocketAddr::new(host, args.port.unwrap_or(config.port)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; proxy requests will fail until it is configured");
    }

    let addr = bind_addr(&args, &config)?;
    info!(
        text_model = %config.text_model,
        vision_model = %config.vision_model,
        relax_safety = config.relax_safety,
        "Starting gemini-proxy"
    );

    let upstream: Arc<dyn GenerationService> = Arc::new(
        GeminiGenerationClient::new(config.request_timeout).with_base_url(config.base_url.clone()),
    );
    let handler = ProxyHandler::new(Arc::new(config), upstream);

    if let Err(e) = server::serve(addr, handler).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
