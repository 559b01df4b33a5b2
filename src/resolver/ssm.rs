//! AWS Systems Manager Parameter Store client

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use aws_sdk_ssm::Client;
use tracing::info;

use super::{ParameterStore, ParameterStoreError};

/// [`ParameterStore`] backed by AWS SSM `GetParameter`.
///
/// The SDK client is cheap to clone and safe to share between requests.
/// Retries are disabled: a failed lookup fails the admission request and
/// retrying is left to the API server.
#[derive(Clone, Debug)]
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    /// Load credentials from the default provider chain (environment, IRSA,
    /// instance profile, ...) for the given region.
    pub async fn from_env(region: impl Into<String>) -> Self {
        let region = region.into();
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        info!(region = %region, "Created SSM client");
        Self::new(Client::new(&sdk_config))
    }

    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String, ParameterStoreError> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|err| match err.into_service_error() {
                GetParameterError::ParameterNotFound(_) => ParameterStoreError::NotFound,
                other => ParameterStoreError::Backend(DisplayErrorContext(&other).to_string()),
            })?;

        output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_string)
            .ok_or(ParameterStoreError::MissingValue)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::config::Credentials;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const AMZ_JSON: &str = "application/x-amz-json-1.1";

    fn store_for(server: &MockServer) -> SsmParameterStore {
        let config = aws_sdk_ssm::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(server.uri())
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .build();
        SsmParameterStore::new(Client::from_conf(config))
    }

    #[tokio::test]
    async fn requests_decrypted_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AmazonSSM.GetParameter"))
            .and(body_partial_json(
                json!({ "Name": "app/db/pass", "WithDecryption": true }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                json!({
                    "Parameter": {
                        "Name": "app/db/pass",
                        "Type": "SecureString",
                        "Value": "s3cr3t",
                        "Version": 1
                    }
                })
                .to_string(),
                AMZ_JSON,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let value = store_for(&server)
            .get_parameter("app/db/pass")
            .await
            .unwrap();
        assert_eq!(value, "s3cr3t");
    }

    #[tokio::test]
    async fn parameter_not_found_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                json!({ "__type": "ParameterNotFound", "message": "missing" }).to_string(),
                AMZ_JSON,
            ))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .get_parameter("app/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, ParameterStoreError::NotFound), "got {err:?}");
    }

    #[tokio::test]
    async fn access_denied_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                json!({
                    "__type": "AccessDeniedException",
                    "message": "not authorized to perform ssm:GetParameter"
                })
                .to_string(),
                AMZ_JSON,
            ))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .get_parameter("app/forbidden")
            .await
            .unwrap_err();
        match err {
            ParameterStoreError::Backend(message) => {
                assert!(message.contains("AccessDeniedException"), "got: {message}")
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
