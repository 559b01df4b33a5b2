//! SSM Param Injector: Kubernetes mutating admission webhook
//!
//! Replaces `ssm:/<name>` string values in admitted ConfigMaps, CronJobs,
//! ExternalSecrets, Ingresses, Jobs, Pods and ServiceAccounts with the
//! decrypted value of the named AWS Systems Manager parameter, and answers
//! the API server with a JSON Patch.

pub mod config;
pub mod crd;
pub mod error;
pub mod injector;
pub mod resolver;
pub mod telemetry;
pub mod webhook;

pub use crate::error::{Error, Result};
