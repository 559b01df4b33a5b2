//! Mutating Admission Logic
//!
//! Turns an [`AdmissionRequest`] into the [`AdmissionResponse`] the API
//! server expects: allowed with a JSON Patch, allowed unchanged, or denied
//! with the failure message and an HTTP-style status code.

use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::DynamicObject;
use tokio::time::Instant;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::injector::{Injector, PatchResult};

/// Message returned when the object is admitted as submitted.
pub const UNCHANGED_MESSAGE: &str = "No modifications required";

/// Apply parameter injection to an admission request
#[instrument(
    skip(injector, req),
    fields(uid = %req.uid, kind = %req.kind.kind, operation = ?req.operation)
)]
pub async fn apply_mutations(
    injector: &Injector,
    req: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let deadline = Instant::now() + injector.request_timeout();

    match mutate(injector, req, deadline).await {
        Ok(PatchResult::Unchanged) => {
            let mut response = AdmissionResponse::from(req);
            response.result.message = UNCHANGED_MESSAGE.to_string();
            response
        }
        Ok(PatchResult::Patch(patch)) => match AdmissionResponse::from(req).with_patch(patch) {
            Ok(response) => {
                info!(name = %req.name, "Applied SSM parameter injection");
                response
            }
            Err(e) => deny(req, &Error::Patch(e.to_string())),
        },
        Err(e) => deny(req, &e),
    }
}

async fn mutate(
    injector: &Injector,
    req: &AdmissionRequest<DynamicObject>,
    deadline: Instant,
) -> Result<PatchResult> {
    let object = req
        .object
        .as_ref()
        .map(|object| {
            serde_json::to_value(object).map_err(|source| Error::Serialization {
                kind: req.kind.kind.clone(),
                source,
            })
        })
        .transpose()?;

    injector
        .inject(&req.kind.kind, object.as_ref(), deadline)
        .await
}

fn deny(req: &AdmissionRequest<DynamicObject>, err: &Error) -> AdmissionResponse {
    let code = err.status_code();
    error!(code = code.as_u16(), error = %err, "Denying admission request");

    let mut response = AdmissionResponse::from(req).deny(err.to_string());
    response.result.code = code.as_u16();
    response
}
