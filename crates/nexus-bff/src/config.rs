//! Process configuration.
//!
//! Settings are read with the `config` crate from the process environment,
//! layered over an optional file named by `BFF_CONFIG` (any format the crate
//! detects from the extension). `ENV` picks the deployment and everything
//! deployment-specific is derived from it.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ENV` | `local` | `local` or `aws`. |
//! | `BFF_HOST` | `0.0.0.0` | Bind host. |
//! | `BFF_PORT` | `5000` | Bind port. |
//! | `AWS_REGION` | `us-east-1` | Region label. |
//! | `ORCHESTRATOR_SERVICE_URL` | `http://localhost:5001` | Orchestrator base URL. |
//! | `BFF_API_KEYS` | *(none)* | Comma-separated keys accepted when auth is enforced. |
//! | `BFF_STAGE` | `ASK` | Envelope stage label. |

use crate::envelope::DEFAULT_STAGE;
use crate::error::{BffError, BffResult};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const APP_NAME: &str = "NexusOps BFF";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LOCAL_DYNAMODB_ENDPOINT: &str = "http://localhost:8000";

/// Deployment target selected by `ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Aws,
}

impl Deployment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::Local => "local",
            Deployment::Aws => "aws",
        }
    }
}

impl FromStr for Deployment {
    type Err = BffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Deployment::Local),
            "aws" => Ok(Deployment::Aws),
            other => Err(BffError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw keys as they come out of the `config` sources.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSettings {
    env: String,
    bff_host: String,
    bff_port: u16,
    aws_region: String,
    orchestrator_service_url: String,
    bff_api_keys: String,
    bff_stage: String,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            bff_host: "0.0.0.0".to_string(),
            bff_port: 5000,
            aws_region: "us-east-1".to_string(),
            orchestrator_service_url: "http://localhost:5001".to_string(),
            bff_api_keys: String::new(),
            bff_stage: DEFAULT_STAGE.to_string(),
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct BffConfig {
    pub deployment: Deployment,
    pub host: String,
    pub port: u16,
    pub aws_region: String,
    pub orchestrator_service_url: String,
    pub api_keys: Vec<String>,
    pub stage: String,
}

impl Default for BffConfig {
    fn default() -> Self {
        let raw = RawSettings::default();
        Self {
            deployment: Deployment::Local,
            host: raw.bff_host,
            port: raw.bff_port,
            aws_region: raw.aws_region,
            orchestrator_service_url: raw.orchestrator_service_url,
            api_keys: Vec::new(),
            stage: raw.bff_stage,
        }
    }
}

impl BffConfig {
    /// Load from the environment (and `BFF_CONFIG`, if set).
    pub fn load() -> BffResult<Self> {
        let mut builder = Config::builder();
        if let Ok(path) = std::env::var("BFF_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(false));
        }
        let cfg = builder
            .add_source(Environment::default().try_parsing(true))
            .build()?;
        Self::from_config(cfg)
    }

    /// Resolve from an already-built [`Config`].
    pub fn from_config(cfg: Config) -> BffResult<Self> {
        let raw: RawSettings = cfg.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> BffResult<Self> {
        let deployment = raw.env.parse()?;
        let api_keys = raw
            .bff_api_keys
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            deployment,
            host: raw.bff_host,
            port: raw.bff_port,
            aws_region: raw.aws_region,
            orchestrator_service_url: raw.orchestrator_service_url,
            api_keys,
            stage: raw.bff_stage,
        })
    }

    /// Default `tracing` level directive.
    pub fn log_level(&self) -> &'static str {
        match self.deployment {
            Deployment::Local => "debug",
            Deployment::Aws => "info",
        }
    }

    /// Local development skips the API key gate.
    pub fn auth_bypass(&self) -> bool {
        self.deployment == Deployment::Local
    }

    pub fn debug(&self) -> bool {
        self.deployment == Deployment::Local
    }

    /// `None` means the provider's default endpoint.
    pub fn dynamodb_endpoint(&self) -> Option<&'static str> {
        match self.deployment {
            Deployment::Local => Some(LOCAL_DYNAMODB_ENDPOINT),
            Deployment::Aws => None,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
