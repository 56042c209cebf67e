//! Gateway configuration

use anyhow::{Context, bail};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use storage_api_store::S3Config;

/// Default request body cap (10 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Placeholder in `API_URL` replaced by the resolved port
const PORT_PLACEHOLDER: &str = "{PORT}";

/// Where file bytes live
#[derive(Clone, Debug)]
pub enum StoreBackend {
    /// Process-local map, lost on restart
    Memory { bucket: String },
    /// S3-compatible bucket
    S3(S3Config),
}

/// Gateway server configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API, used to build download URLs
    pub api_url: String,
    /// Secret expected in the Authorization header
    pub token: String,
    /// Object store backend
    pub store: StoreBackend,
    /// Regex patterns hiding folders from listings
    pub exclude_folders: Vec<String>,
    /// Regex patterns hiding files from listings
    pub exclude_files: Vec<String>,
    /// Client IPs allowed through the IP gate
    pub whitelist_ips: Vec<IpAddr>,
    /// Secret that skips the IP gate when sent in `X-Bypass-Whitelist`
    pub bypass_whitelist: Option<String>,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`
    pub trust_proxy: bool,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            api_url: "http://localhost:9000/v1".to_string(),
            token: String::new(),
            store: StoreBackend::Memory {
                bucket: "memory".to_string(),
            },
            exclude_folders: Vec::new(),
            exclude_files: Vec::new(),
            whitelist_ips: default_whitelist(),
            bypass_whitelist: None,
            trust_proxy: false,
            cors_origins: Vec::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loopback only
pub fn default_whitelist() -> Vec<IpAddr> {
    vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)]
}

fn parse_ip(value: &str) -> Result<IpAddr, String> {
    value
        .trim()
        .parse()
        .map_err(|e| format!("invalid IP address {:?}: {}", value, e))
}

/// Command line and environment options
#[derive(Parser, Debug)]
#[command(name = "storage-api")]
#[command(about = "HTTP gateway for files stored in an S3-compatible bucket")]
#[command(version)]
pub struct Cli {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Port used when PORT is unset or 0
    #[arg(long, env = "TRY_PORT")]
    pub try_port: Option<u16>,

    /// Public API base URL; `{PORT}` is replaced with the listening port
    #[arg(long, env = "API_URL")]
    pub api_url: String,

    /// Secret token expected in the Authorization header
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: String,

    /// Cloudflare account id
    #[arg(long, env = "CLOUDFLARE_ACCOUNT_ID", required_unless_present = "memory_store")]
    pub account_id: Option<String>,

    /// Bucket access key id
    #[arg(long, env = "CLOUDFLARE_ACCESS_KEY_ID", required_unless_present = "memory_store")]
    pub access_key_id: Option<String>,

    /// Bucket secret access key
    #[arg(
        long,
        env = "CLOUDFLARE_ACCESS_KEY_SECRET",
        hide_env_values = true,
        required_unless_present = "memory_store"
    )]
    pub secret_access_key: Option<String>,

    /// Bucket name
    #[arg(long, env = "BUCKET_NAME", required_unless_present = "memory_store")]
    pub bucket_name: Option<String>,

    /// Bucket region
    #[arg(long, env = "BUCKET_REGION", required_unless_present = "memory_store")]
    pub bucket_region: Option<String>,

    /// S3 endpoint, defaults to the account's R2 endpoint
    #[arg(long, env = "BUCKET_ENDPOINT")]
    pub bucket_endpoint: Option<String>,

    /// Comma-separated regex patterns of folders hidden from listings
    #[arg(long, env = "EXCLUDE_FOLDER", value_delimiter = ',')]
    pub exclude_folder: Vec<String>,

    /// Comma-separated regex patterns of files hidden from listings
    #[arg(long, env = "EXCLUDE_FILE", value_delimiter = ',')]
    pub exclude_file: Vec<String>,

    /// Comma-separated client IPs allowed to call the API
    #[arg(
        long,
        env = "WHITELIST_IPS",
        value_delimiter = ',',
        value_parser = parse_ip,
        default_values = ["127.0.0.1", "::1"]
    )]
    pub whitelist_ips: Vec<IpAddr>,

    /// Secret that skips the IP allowlist when sent in X-Bypass-Whitelist
    #[arg(long, env = "BYPASS_WHITELIST", hide_env_values = true)]
    pub bypass_whitelist: Option<String>,

    /// Read the client IP from proxy headers; only enable behind a proxy that overwrites them
    #[arg(long, env = "TRUST_PROXY")]
    pub trust_proxy: bool,

    /// Comma-separated CORS origins
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: usize,

    /// Log file, appended to
    #[arg(long, env = "LOG_FILE", default_value = "logs/app.log")]
    pub log_file: PathBuf,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "STORAGE_MEMORY_STORE")]
    pub memory_store: bool,

    /// Enable debug logging
    #[arg(short, long, env = "STORAGE_DEBUG")]
    pub debug: bool,
}

fn required(value: Option<String>, name: &str) -> anyhow::Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Invalid {} value", name))
}

impl Cli {
    /// Validate the options and build the gateway configuration
    pub fn into_config(self) -> anyhow::Result<GatewayConfig> {
        let port = match (self.port.filter(|p| *p != 0), self.try_port) {
            (Some(port), _) => port,
            (None, Some(port)) => port,
            (None, None) => bail!("Invalid PORT value"),
        };

        if self.api_url.trim().is_empty() {
            bail!("Invalid API_URL value");
        }
        if self.token.trim().is_empty() {
            bail!("Invalid TOKEN value");
        }

        let api_url = self
            .api_url
            .replace(PORT_PLACEHOLDER, &port.to_string())
            .trim_end_matches('/')
            .to_string();

        let store = if self.memory_store {
            StoreBackend::Memory {
                bucket: self.bucket_name.unwrap_or_else(|| "memory".to_string()),
            }
        } else {
            StoreBackend::S3(S3Config {
                account_id: required(self.account_id, "CLOUDFLARE_ACCOUNT_ID")?,
                access_key_id: required(self.access_key_id, "CLOUDFLARE_ACCESS_KEY_ID")?,
                secret_access_key: required(self.secret_access_key, "CLOUDFLARE_ACCESS_KEY_SECRET")?,
                bucket: required(self.bucket_name, "BUCKET_NAME")?,
                region: required(self.bucket_region, "BUCKET_REGION")?,
                endpoint: self.bucket_endpoint.filter(|e| !e.trim().is_empty()),
            })
        };

        let whitelist_ips = if self.whitelist_ips.is_empty() {
            default_whitelist()
        } else {
            self.whitelist_ips
        };

        Ok(GatewayConfig {
            host: self.host,
            port,
            api_url,
            token: self.token,
            store,
            exclude_folders: self.exclude_folder,
            exclude_files: self.exclude_file,
            whitelist_ips,
            bypass_whitelist: self.bypass_whitelist.filter(|s| !s.is_empty()),
            trust_proxy: self.trust_proxy,
            cors_origins: self.cors_origins.into_iter().filter(|o| !o.is_empty()).collect(),
            max_body_size: self.max_body_size,
        })
    }
}
