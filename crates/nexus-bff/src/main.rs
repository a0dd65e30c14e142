//! NexusOps BFF - entry point.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ENV` | `local` | `local` or `aws`. |
//! | `BFF_HOST` | `0.0.0.0` | Bind address. |
//! | `BFF_PORT` | `5000` | TCP port to listen on. |
//! | `AWS_REGION` | `us-east-1` | AWS region. |
//! | `ORCHESTRATOR_SERVICE_URL` | `http://localhost:5001` | Orchestrator base URL. |
//! | `BFF_API_KEYS` | *(none)* | Comma-separated API keys, enforced when `ENV=aws`. |
//! | `BFF_STAGE` | `ASK` | Value of `meta.stage` in every envelope. |
//! | `BFF_CONFIG` | *(none)* | Optional config file read before the environment. |
//! | `RUST_LOG` | per `ENV` | `tracing` filter directive. |

use nexus_bff::{BffConfig, BffServer, Deployment};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match BffConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.deployment {
        Deployment::Aws => subscriber.json().init(),
        Deployment::Local => subscriber.init(),
    }

    info!(
        environment = %config.deployment,
        bind = %config.bind_addr(),
        aws_region = %config.aws_region,
        orchestrator = %config.orchestrator_service_url,
        dynamodb_endpoint = ?config.dynamodb_endpoint(),
        auth_bypass = config.auth_bypass(),
        debug = config.debug(),
        "NexusOps BFF configuration loaded"
    );

    if let Err(e) = BffServer::new(config).start().await {
        eprintln!("BFF error: {e}");
        std::process::exit(1);
    }
}
