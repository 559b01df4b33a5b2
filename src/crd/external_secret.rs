//! ExternalSecret (external-secrets.io) resource
//!
//! Only the parts of the schema the injector looks at are typed. Every other
//! field is carried through untouched so that re-serializing a decoded
//! object does not drop anything the user wrote.

use std::borrow::Cow;
use std::collections::BTreeMap;

use k8s_openapi::NamespaceResourceScope;
use kube::core::{ObjectMeta, TypeMeta};
use kube::Resource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An `external-secrets.io/v1beta1` ExternalSecret.
///
/// Laid out like kube's `DynamicObject` rather than derived with
/// `CustomResource`, so that a missing `spec` decodes as an empty one and the
/// object is admitted unchanged instead of rejected.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ExternalSecret {
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ExternalSecretSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExternalSecretStatus>,
}

impl Resource for ExternalSecret {
    type DynamicType = ();
    type Scope = NamespaceResourceScope;

    fn kind(_: &()) -> Cow<'_, str> {
        "ExternalSecret".into()
    }

    fn group(_: &()) -> Cow<'_, str> {
        "external-secrets.io".into()
    }

    fn version(_: &()) -> Cow<'_, str> {
        "v1beta1".into()
    }

    fn api_version(_: &()) -> Cow<'_, str> {
        "external-secrets.io/v1beta1".into()
    }

    fn plural(_: &()) -> Cow<'_, str> {
        "externalsecrets".into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretSpec {
    /// Individual secret keys fetched from the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ExternalSecretData>>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretData {
    pub secret_key: String,

    pub remote_ref: ExternalSecretDataRemoteRef,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretDataRemoteRef {
    /// Key of the secret in the provider
    pub key: String,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Status is owned by the external-secrets controller and passed through as-is.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ExternalSecretStatus(pub BTreeMap<String, Value>);
