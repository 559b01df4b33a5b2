//! Per-kind field tables and the generic decode / walk / patch handler

use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, PodSpec, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::fields::{
    annotation_values, container_env_values, init_container_env_values, walk, FieldPath,
};
use super::kind::ResourceKind;
use super::patch::{self, PatchResult};
use crate::crd::ExternalSecret;
use crate::error::{Error, Result};
use crate::resolver::Resolver;

pub const CONFIG_MAP_FIELDS: &[FieldPath<ConfigMap>] = &[FieldPath {
    path: "data",
    select: config_map_data,
}];

pub const CRON_JOB_FIELDS: &[FieldPath<CronJob>] = &[
    FieldPath {
        path: "spec.jobTemplate.spec.template.spec.containers[].env[].value",
        select: cron_job_containers,
    },
    FieldPath {
        path: "spec.jobTemplate.spec.template.spec.initContainers[].env[].value",
        select: cron_job_init_containers,
    },
];

pub const EXTERNAL_SECRET_FIELDS: &[FieldPath<ExternalSecret>] = &[FieldPath {
    path: "spec.data[].remoteRef.key",
    select: external_secret_remote_keys,
}];

pub const INGRESS_FIELDS: &[FieldPath<Ingress>] = &[
    FieldPath {
        path: "metadata.annotations",
        select: annotation_values::<Ingress>,
    },
    FieldPath {
        path: "spec.rules[].host",
        select: ingress_rule_hosts,
    },
    FieldPath {
        path: "spec.tls[].hosts[]",
        select: ingress_tls_hosts,
    },
];

pub const JOB_FIELDS: &[FieldPath<Job>] = &[
    FieldPath {
        path: "spec.template.spec.containers[].env[].value",
        select: job_containers,
    },
    FieldPath {
        path: "spec.template.spec.initContainers[].env[].value",
        select: job_init_containers,
    },
];

pub const POD_FIELDS: &[FieldPath<Pod>] = &[
    FieldPath {
        path: "spec.containers[].env[].value",
        select: pod_containers,
    },
    FieldPath {
        path: "spec.initContainers[].env[].value",
        select: pod_init_containers,
    },
];

pub const SERVICE_ACCOUNT_FIELDS: &[FieldPath<ServiceAccount>] = &[FieldPath {
    path: "metadata.annotations",
    select: annotation_values::<ServiceAccount>,
}];

/// Decode `object` as `K`, resolve every reference under `fields`, and diff
/// the result against the decoded object.
///
/// Both sides of the diff are encoded through `K`, so anything the typed
/// model normalises (explicit `null`s, fields it does not know) is identical
/// on both sides and never shows up in the patch.
pub async fn inject<K>(
    kind: ResourceKind,
    object: &Value,
    fields: &[FieldPath<K>],
    resolver: &Resolver<'_>,
) -> Result<PatchResult>
where
    K: Resource + DeserializeOwned + Serialize + Send,
{
    debug!("Decoding {kind} from request");
    let mut resource: K = serde_json::from_value(object.clone()).map_err(|source| {
        error!(error = %source, "unable to decode {kind}");
        Error::Decode {
            kind: kind.to_string(),
            source,
        }
    })?;
    debug!(
        name = %resource.name_any(),
        namespace = ?resource.namespace(),
        "{kind} successfully decoded"
    );

    let original = encode(kind, &resource)?;

    let mut modified = false;
    for field in fields {
        modified |= walk(field, &mut resource, resolver).await?;
    }

    if !modified {
        info!("No SSM parameters found");
        return Ok(PatchResult::Unchanged);
    }

    let mutated = encode(kind, &resource)?;

    info!("Returning JSON patch for value injection(s)");
    Ok(patch::diff(&original, &mutated))
}

fn encode<K: Serialize>(kind: ResourceKind, resource: &K) -> Result<Value> {
    serde_json::to_value(resource).map_err(|source| {
        error!(error = %source, "unable to marshal modified {kind} to JSON");
        Error::Serialization {
            kind: kind.to_string(),
            source,
        }
    })
}

fn config_map_data(config_map: &mut ConfigMap) -> Vec<&mut String> {
    config_map
        .data
        .as_mut()
        .map(|data| data.values_mut().collect())
        .unwrap_or_default()
}

fn external_secret_remote_keys(external_secret: &mut ExternalSecret) -> Vec<&mut String> {
    external_secret
        .spec
        .data
        .iter_mut()
        .flatten()
        .map(|data| &mut data.remote_ref.key)
        .collect()
}

fn ingress_rule_hosts(ingress: &mut Ingress) -> Vec<&mut String> {
    ingress
        .spec
        .as_mut()
        .and_then(|spec| spec.rules.as_mut())
        .map(|rules| {
            rules
                .iter_mut()
                .filter_map(|rule| rule.host.as_mut())
                .collect()
        })
        .unwrap_or_default()
}

fn ingress_tls_hosts(ingress: &mut Ingress) -> Vec<&mut String> {
    ingress
        .spec
        .as_mut()
        .and_then(|spec| spec.tls.as_mut())
        .map(|tls| {
            tls.iter_mut()
                .filter_map(|entry| entry.hosts.as_mut())
                .flatten()
                .collect()
        })
        .unwrap_or_default()
}

fn pod_containers(pod: &mut Pod) -> Vec<&mut String> {
    container_env_values(pod.spec.as_mut())
}

fn pod_init_containers(pod: &mut Pod) -> Vec<&mut String> {
    init_container_env_values(pod.spec.as_mut())
}

fn job_pod_spec(job: &mut Job) -> Option<&mut PodSpec> {
    job.spec.as_mut()?.template.spec.as_mut()
}

fn job_containers(job: &mut Job) -> Vec<&mut String> {
    container_env_values(job_pod_spec(job))
}

fn job_init_containers(job: &mut Job) -> Vec<&mut String> {
    init_container_env_values(job_pod_spec(job))
}

fn cron_job_pod_spec(cron_job: &mut CronJob) -> Option<&mut PodSpec> {
    cron_job
        .spec
        .as_mut()?
        .job_template
        .spec
        .as_mut()?
        .template
        .spec
        .as_mut()
}

fn cron_job_containers(cron_job: &mut CronJob) -> Vec<&mut String> {
    container_env_values(cron_job_pod_spec(cron_job))
}

fn cron_job_init_containers(cron_job: &mut CronJob) -> Vec<&mut String> {
    init_container_env_values(cron_job_pod_spec(cron_job))
}
