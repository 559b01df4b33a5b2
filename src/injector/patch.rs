//! JSON Patch generation

use json_patch::Patch;
use serde_json::Value;

/// Outcome of running an object through the injector.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchResult {
    /// No reference was found; the object is admitted as submitted.
    Unchanged,
    /// RFC 6902 operations turning the submitted object into the mutated one
    Patch(Patch),
}

impl PatchResult {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, PatchResult::Unchanged)
    }
}

/// Diff the submitted object against its mutated form.
///
/// An empty diff (a parameter whose value is its own reference) is reported
/// as [`PatchResult::Unchanged`].
pub fn diff(original: &Value, mutated: &Value) -> PatchResult {
    let patch = json_patch::diff(original, mutated);
    if patch.0.is_empty() {
        PatchResult::Unchanged
    } else {
        PatchResult::Patch(patch)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn replaced_scalar_becomes_a_single_replace() {
        let original = json!({ "data": { "a": "ssm:/a", "b": "plain" } });
        let mutated = json!({ "data": { "a": "resolved", "b": "plain" } });

        let PatchResult::Patch(patch) = diff(&original, &mutated) else {
            panic!("expected a patch");
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!([{ "op": "replace", "path": "/data/a", "value": "resolved" }])
        );
    }

    #[test]
    fn keys_with_slashes_are_escaped() {
        let original = json!({ "metadata": { "annotations": { "eks.amazonaws.com/role-arn": "ssm:/r" } } });
        let mutated = json!({ "metadata": { "annotations": { "eks.amazonaws.com/role-arn": "arn" } } });

        let PatchResult::Patch(patch) = diff(&original, &mutated) else {
            panic!("expected a patch");
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!([{
                "op": "replace",
                "path": "/metadata/annotations/eks.amazonaws.com~1role-arn",
                "value": "arn"
            }])
        );
    }

    #[test]
    fn identical_documents_are_unchanged() {
        let object = json!({ "data": { "a": "b" } });
        assert!(diff(&object, &object).is_unchanged());
    }
}
