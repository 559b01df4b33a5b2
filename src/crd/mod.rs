//! Custom resources the injector mutates that `k8s-openapi` does not ship.

mod external_secret;

pub use external_secret::*;
