//! Credential issuance gateway.
//!
//! [`DefaultStsGateway`] turns a role ARN, session name and requested
//! validity into temporary [`Credentials`]: one `AssumeRole` call, raced
//! against the caller's [`Context`], with latency and in-flight metrics
//! recorded around it. Errors come back exactly as the provider returned
//! them.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use sts_gateway_schema::credentials::Credentials;

use crate::assume_role::aws_sdk::AwsSdkAssumeRole;
use crate::assume_role::{AssumeRole, AssumeRoleRequest};
use crate::config::GatewayConfig;
use crate::context::Context;
use crate::metrics::{InFlight, MetricsFacade, MetricsSink};

#[async_trait]
pub trait StsGateway {
    async fn issue(
        &self,
        ctx: &Context,
        role_arn: &str,
        session_name: &str,
        expiry: Duration,
    ) -> anyhow::Result<Credentials>;
}

pub struct DefaultStsGateway<A, M> {
    provider: A,
    metrics: M,
}

impl<A, M> DefaultStsGateway<A, M> {
    pub fn new(provider: A, metrics: M) -> Self {
        DefaultStsGateway { provider, metrics }
    }

    pub fn provider(&self) -> &A {
        &self.provider
    }
}

impl DefaultStsGateway<AwsSdkAssumeRole, MetricsFacade> {
    /// Builds a gateway backed by the AWS SDK, reporting through the
    /// `metrics` facade.
    pub async fn from_config(config: &GatewayConfig) -> Self {
        crate::metrics::describe_metrics();
        DefaultStsGateway::new(AwsSdkAssumeRole::from_config(config).await, MetricsFacade)
    }
}

/// Whole seconds of `expiry`, truncated toward zero.
pub fn duration_seconds(expiry: Duration) -> i64 {
    i64::try_from(expiry.as_secs()).unwrap_or(i64::MAX)
}

#[async_trait]
impl<A, M> StsGateway for DefaultStsGateway<A, M>
where
    A: AssumeRole + Send + Sync,
    M: MetricsSink + Send + Sync,
{
    async fn issue(
        &self,
        ctx: &Context,
        role_arn: &str,
        session_name: &str,
        expiry: Duration,
    ) -> anyhow::Result<Credentials> {
        let _in_flight = InFlight::start(&self.metrics);

        let request = AssumeRoleRequest {
            duration_seconds: duration_seconds(expiry),
            role_arn: role_arn.to_string(),
            role_session_name: session_name.to_string(),
        };
        debug!(
            role_arn,
            session_name,
            duration_seconds = request.duration_seconds,
            "assuming role"
        );

        let output = tokio::select! {
            biased;
            reason = ctx.done() => {
                debug!(role_arn, "assume-role abandoned: {}", reason);
                return Err(reason.into());
            }
            output = self.provider.assume_role(request) => output?,
        };

        debug!(
            role_arn,
            access_key_id = %output.access_key_id,
            expiration = %output.expiration,
            "assumed role"
        );
        Ok(Credentials::from(output))
    }
}
