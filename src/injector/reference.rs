//! Recognition of `ssm:/<name>` parameter references

/// Prefix marking a string value as a parameter reference.
pub const REFERENCE_PREFIX: &str = "ssm:/";

/// A string field value that points at a parameter in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterReference<'a> {
    name: &'a str,
}

impl<'a> ParameterReference<'a> {
    /// Returns the reference if `value` starts with [`REFERENCE_PREFIX`].
    ///
    /// The parameter name is the remainder of the value, verbatim. An empty
    /// remainder is still a reference; the store decides whether it exists.
    pub fn parse(value: &'a str) -> Option<Self> {
        value
            .strip_prefix(REFERENCE_PREFIX)
            .map(|name| Self { name })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_after_prefix() {
        let reference = ParameterReference::parse("ssm:/app/db/pass").unwrap();
        assert_eq!(reference.name(), "app/db/pass");
    }

    #[test]
    fn name_is_used_verbatim() {
        let reference = ParameterReference::parse("ssm://double/slash%20 x").unwrap();
        assert_eq!(reference.name(), "/double/slash%20 x");
    }

    #[test]
    fn bare_prefix_is_a_reference_with_empty_name() {
        assert_eq!(ParameterReference::parse("ssm:/").unwrap().name(), "");
    }

    #[test]
    fn other_values_are_not_references() {
        for value in ["", "plain", "ssm:", "ssm:app", "SSM:/app", " ssm:/app", "x-ssm:/app"] {
            assert!(
                ParameterReference::parse(value).is_none(),
                "{value:?} should not be a reference"
            );
        }
    }
}
