use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sts_gateway_schema::credentials::Credentials;

pub mod aws_sdk;

pub mod defaults {
    pub const DURATION_SECONDS: u64 = 3600;
    pub const ROLE_SESSION_NAME: &str = "sts-gateway";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub duration_seconds: i64,
    pub role_arn: String,
    pub role_session_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleOutput {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl From<AssumeRoleOutput> for Credentials {
    fn from(output: AssumeRoleOutput) -> Self {
        Credentials::new(
            output.access_key_id,
            output.secret_access_key,
            output.session_token,
            output.expiration,
        )
    }
}

/// The identity provider's remote assume-role operation.
///
/// Implementations must be cancel safe: the gateway drops the returned
/// future when the caller's context finishes first.
#[async_trait]
pub trait AssumeRole {
    async fn assume_role(&self, request: AssumeRoleRequest) -> anyhow::Result<AssumeRoleOutput>;
}
