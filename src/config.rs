//! Command line and environment configuration

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{Error, Result};

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    #[default]
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// AWS region of the SSM Parameter Store
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    /// Address the webhook and probe listeners bind to
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: IpAddr,

    /// Webhook (HTTPS) port
    #[arg(long, env = "WEBHOOK_PORT", default_value_t = 8443)]
    pub port: u16,

    /// Health probe (HTTP) port
    #[arg(long, env = "HEALTH_PORT", default_value_t = 8081)]
    pub health_port: u16,

    /// Directory holding tls.crt and tls.key
    #[arg(long, env = "CERT_DIR", default_value = "ssl")]
    pub cert_dir: PathBuf,

    /// Serve the webhook over plain HTTP (local development only)
    #[arg(long, env = "WEBHOOK_INSECURE")]
    pub insecure: bool,

    /// Seconds allowed for resolving all parameters of one request
    #[arg(
        long = "request-timeout",
        env = "REQUEST_TIMEOUT_SECONDS",
        default_value_t = 10
    )]
    pub request_timeout_seconds: u64,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn health_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.health_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_seconds == 0 {
            return Err(Error::ConfigError(
                "request timeout must be at least one second".to_string(),
            ));
        }
        if self.port == self.health_port {
            return Err(Error::ConfigError(format!(
                "webhook and health probe listeners share port {}",
                self.port
            )));
        }
        Ok(())
    }
}
