//! Parameter injection
//!
//! Dispatches an admitted object to the handler for its kind. Each handler
//! decodes the object into its typed form, replaces every `ssm:/<name>`
//! value found under the kind's field paths with the named parameter's
//! decrypted value, and returns a JSON Patch describing the change.
//!
//! | Kind           | Fields scanned                                                  |
//! |----------------|-----------------------------------------------------------------|
//! | ConfigMap      | `data` values                                                   |
//! | CronJob        | container and init container `env[].value` of the job template  |
//! | ExternalSecret | `spec.data[].remoteRef.key`                                     |
//! | Ingress        | annotation values, `spec.rules[].host`, `spec.tls[].hosts[]`    |
//! | Job            | container and init container `env[].value` of the pod template  |
//! | Pod            | container and init container `env[].value`                      |
//! | ServiceAccount | annotation values                                               |

mod fields;
mod handlers;
mod kind;
mod patch;
mod reference;

use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::crd::ExternalSecret;
use crate::error::{Error, Result};
use crate::resolver::{ParameterStore, Resolver};

pub use fields::{FieldPath, Selector};
pub use kind::ResourceKind;
pub use patch::PatchResult;
pub use reference::{ParameterReference, REFERENCE_PREFIX};

/// Default upper bound on the time spent resolving one admission request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared, stateless entry point for mutating admitted objects.
#[derive(Clone)]
pub struct Injector {
    store: Arc<dyn ParameterStore>,
    request_timeout: Duration,
}

impl Injector {
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self {
            store,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Resolve every reference in `object`, which was submitted as `kind`.
    ///
    /// The kind is checked before anything else, so an unsupported kind is
    /// rejected even when the request carries no object. All lookups must
    /// finish before `deadline`.
    #[instrument(skip(self, object, deadline))]
    pub async fn inject(
        &self,
        kind: &str,
        object: Option<&Value>,
        deadline: Instant,
    ) -> Result<PatchResult> {
        let kind: ResourceKind = kind.parse()?;
        info!("{kind} request received");

        let object = object.ok_or(Error::MissingObject)?;
        let resolver = Resolver::new(self.store.as_ref(), deadline);

        match kind {
            ResourceKind::ConfigMap => {
                handlers::inject::<ConfigMap>(kind, object, handlers::CONFIG_MAP_FIELDS, &resolver)
                    .await
            }
            ResourceKind::CronJob => {
                handlers::inject::<CronJob>(kind, object, handlers::CRON_JOB_FIELDS, &resolver)
                    .await
            }
            ResourceKind::ExternalSecret => {
                handlers::inject::<ExternalSecret>(
                    kind,
                    object,
                    handlers::EXTERNAL_SECRET_FIELDS,
                    &resolver,
                )
                .await
            }
            ResourceKind::Ingress => {
                handlers::inject::<Ingress>(kind, object, handlers::INGRESS_FIELDS, &resolver)
                    .await
            }
            ResourceKind::Job => {
                handlers::inject::<Job>(kind, object, handlers::JOB_FIELDS, &resolver).await
            }
            ResourceKind::Pod => {
                handlers::inject::<Pod>(kind, object, handlers::POD_FIELDS, &resolver).await
            }
            ResourceKind::ServiceAccount => {
                handlers::inject::<ServiceAccount>(
                    kind,
                    object,
                    handlers::SERVICE_ACCOUNT_FIELDS,
                    &resolver,
                )
                .await
            }
        }
    }
}
