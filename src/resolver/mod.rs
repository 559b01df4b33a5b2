//! Parameter resolution
//!
//! A [`ParameterStore`] fetches the decrypted value of a named parameter.
//! Handlers never talk to a store directly: they go through a [`Resolver`],
//! which is created per admission request and bounds every lookup by the
//! request's deadline.
//!
//! There is deliberately no caching, batching or retrying here. Every
//! reference found in an object costs one round-trip to the store.

pub mod ssm;

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::error::{Error, Result};

pub use ssm::SsmParameterStore;

/// Failure reported by a [`ParameterStore`].
#[derive(Error, Debug)]
pub enum ParameterStoreError {
    #[error("parameter not found")]
    NotFound,

    #[error("parameter has no value")]
    MissingValue,

    #[error("request deadline exceeded before the parameter was retrieved")]
    DeadlineExceeded,

    #[error("{0}")]
    Backend(String),
}

/// A remote store of (possibly encrypted) parameters.
///
/// Implementations are shared by every in-flight admission request and must
/// be safe for concurrent use.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch the decrypted value of `name`.
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterStoreError>;
}

/// Resolves parameter names for a single admission request.
pub struct Resolver<'a> {
    store: &'a dyn ParameterStore,
    deadline: Instant,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn ParameterStore, deadline: Instant) -> Self {
        Self { store, deadline }
    }

    /// Fetch `name`, failing fast once the request deadline has passed.
    pub async fn resolve(&self, name: &str) -> Result<String> {
        debug!(parameter = name, "Retrieving SSM Parameter value");

        let outcome = tokio::time::timeout_at(self.deadline, self.store.get_parameter(name))
            .await
            .unwrap_or(Err(ParameterStoreError::DeadlineExceeded));

        outcome.map_err(|source| {
            error!(parameter = name, error = %source, "failed to retrieve SSM parameter");
            Error::Resolution {
                name: name.to_string(),
                source,
            }
        })
    }
}

/// In-memory [`ParameterStore`] backed by a fixed map.
///
/// Records every lookup so callers can see which parameters were requested
/// and in what order. Useful for local runs and tests.
#[derive(Debug, Default)]
pub struct StaticParameterStore {
    values: BTreeMap<String, String>,
    lookups: Mutex<Vec<String>>,
}

impl StaticParameterStore {
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Parameter names requested so far, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .map(|lookups| lookups.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterStoreError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(name.to_string());
        }
        self.values
            .get(name)
            .cloned()
            .ok_or(ParameterStoreError::NotFound)
    }
}
