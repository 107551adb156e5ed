use async_trait::async_trait;
use aws_sdk_sts::primitives::DateTime as SmithyDateTime;
use aws_types::SdkConfig;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::assume_role::{AssumeRole, AssumeRoleOutput, AssumeRoleRequest};
use crate::config::GatewayConfig;

/// Calls STS through the AWS SDK for Rust.
#[derive(Debug, Clone)]
pub struct AwsSdkAssumeRole {
    client: aws_sdk_sts::Client,
}

impl AwsSdkAssumeRole {
    pub fn new(config: &SdkConfig) -> Self {
        AwsSdkAssumeRole {
            client: aws_sdk_sts::Client::new(config),
        }
    }

    pub async fn from_config(config: &GatewayConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;
        Self::new(&sdk_config)
    }

    pub fn region_name(&self) -> Option<String> {
        self.client.config().region().map(|r| r.to_string())
    }
}

fn expiration_from(dt: SmithyDateTime) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
        .ok_or_else(|| anyhow::anyhow!("expiration is out of range. secs:{}", dt.secs()))
}

#[async_trait]
impl AssumeRole for AwsSdkAssumeRole {
    async fn assume_role(&self, request: AssumeRoleRequest) -> anyhow::Result<AssumeRoleOutput> {
        // STS takes an i32.
        let duration_seconds = i32::try_from(request.duration_seconds).unwrap_or(i32::MAX);

        let output = self
            .client
            .assume_role()
            .role_arn(request.role_arn)
            .role_session_name(request.role_session_name)
            .duration_seconds(duration_seconds)
            .send()
            .await?;

        if let Some(user) = output.assumed_role_user() {
            debug!("assumed role:{}", user.arn());
        }

        let creds = output
            .credentials
            .ok_or_else(|| anyhow::anyhow!("assume-role didn't return a credential"))?;

        Ok(AssumeRoleOutput {
            expiration: expiration_from(creds.expiration)?,
            access_key_id: creds.access_key_id,
            secret_access_key: creds.secret_access_key,
            session_token: creds.session_token,
        })
    }
}
