//! Field paths scanned for parameter references
//!
//! Each resource kind is described by an ordered list of [`FieldPath`]s. A
//! field path knows how to collect mutable handles to every string value it
//! covers; absent parts of the object simply contribute nothing.

use k8s_openapi::api::core::v1::{Container, PodSpec};
use kube::Resource;
use tracing::{debug, info};

use super::reference::ParameterReference;
use crate::error::Result;
use crate::resolver::Resolver;

/// Collects every candidate string value of one field path.
pub type Selector<K> = for<'a> fn(&'a mut K) -> Vec<&'a mut String>;

/// A named set of string fields within resources of type `K`.
pub struct FieldPath<K> {
    /// Human readable location, used in logs
    pub path: &'static str,
    pub select: Selector<K>,
}

/// Resolve every reference found under `field`, in declaration order.
///
/// Returns whether any value was replaced. The first resolution failure is
/// returned immediately; values already replaced stay replaced in `resource`,
/// which the caller throws away on error.
pub async fn walk<K>(field: &FieldPath<K>, resource: &mut K, resolver: &Resolver<'_>) -> Result<bool> {
    let mut modified = false;

    for value in (field.select)(resource) {
        let Some(reference) = ParameterReference::parse(value.as_str()) else {
            continue;
        };

        info!(field = field.path, "SSM Parameter detected");
        debug!(
            field = field.path,
            parameter = reference.name(),
            "SSM Parameter detected"
        );

        let resolved = resolver.resolve(reference.name()).await?;
        debug!(field = field.path, "Updating field with SSM Parameter value");
        *value = resolved;
        modified = true;
    }

    Ok(modified)
}

/// Values of `metadata.annotations`.
pub fn annotation_values<K: Resource>(resource: &mut K) -> Vec<&mut String> {
    resource
        .meta_mut()
        .annotations
        .as_mut()
        .map(|annotations| annotations.values_mut().collect())
        .unwrap_or_default()
}

/// `env[].value` of a pod spec's regular containers.
pub fn container_env_values(spec: Option<&mut PodSpec>) -> Vec<&mut String> {
    spec.map(|spec| env_values(&mut spec.containers))
        .unwrap_or_default()
}

/// `env[].value` of a pod spec's init containers.
pub fn init_container_env_values(spec: Option<&mut PodSpec>) -> Vec<&mut String> {
    spec.and_then(|spec| spec.init_containers.as_mut())
        .map(|containers| env_values(containers))
        .unwrap_or_default()
}

fn env_values(containers: &mut [Container]) -> Vec<&mut String> {
    containers
        .iter_mut()
        .filter_map(|container| container.env.as_mut())
        .flatten()
        .filter_map(|env| env.value.as_mut())
        .collect()
}
