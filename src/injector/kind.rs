use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Resource kinds the injector knows how to scan.
///
/// Any other kind reaching the webhook means the webhook registration selects
/// resources it cannot handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ConfigMap,
    CronJob,
    ExternalSecret,
    Ingress,
    Job,
    Pod,
    ServiceAccount,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::ConfigMap,
        ResourceKind::CronJob,
        ResourceKind::ExternalSecret,
        ResourceKind::Ingress,
        ResourceKind::Job,
        ResourceKind::Pod,
        ResourceKind::ServiceAccount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::CronJob => "CronJob",
            ResourceKind::ExternalSecret => "ExternalSecret",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::Job => "Job",
            ResourceKind::Pod => "Pod",
            ResourceKind::ServiceAccount => "ServiceAccount",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    /// Exact, case-sensitive match on the admission request's `kind.kind`.
    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == kind)
            .ok_or_else(|| Error::UnsupportedKind(kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn kind_match_is_exact() {
        for kind in ["Deployment", "pod", "POD", " Pod", "configmap", ""] {
            match kind.parse::<ResourceKind>() {
                Err(Error::UnsupportedKind(name)) => assert_eq!(name, kind),
                other => panic!("expected unsupported kind for {kind:?}, got {other:?}"),
            }
        }
    }
}
