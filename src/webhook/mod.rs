//! Webhook Module
//!
//! This module exposes the injector as a Kubernetes MutatingAdmissionWebhook.
//!
//! # Example
//!
//! ```rust,ignore
//! use ssm_param_injector::injector::Injector;
//! use ssm_param_injector::resolver::SsmParameterStore;
//! use ssm_param_injector::webhook::{TlsConfig, WebhookServer};
//!
//! let store = SsmParameterStore::from_env("us-east-1").await;
//! let server = WebhookServer::new(Injector::new(Arc::new(store)))
//!     .with_tls(TlsConfig::from_cert_dir("ssl"));
//!
//! let (_tx, rx) = tokio::sync::watch::channel(false);
//! server.start("0.0.0.0:8443".parse()?, rx).await?;
//! ```

pub mod mutation;
pub mod server;
pub mod tls;

pub use mutation::{apply_mutations, UNCHANGED_MESSAGE};
pub use server::{probe_router, serve_probes, WebhookServer};
pub use tls::TlsConfig;
