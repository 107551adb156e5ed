use std::io;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{debug, warn};

use sts_gateway_schema::credentials::RoleCredentials;

use crate::assume_role::defaults;
use crate::config::GatewayConfig;
use crate::context::Context;
use crate::gateway::{DefaultStsGateway, StsGateway};
use crate::handler::credential_process::CredentialProcessHandler;
use crate::handler::env::EnvHandler;
use crate::handler::HandleCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Shell `export` statements.
    Env,
    /// AWS CLI `credential_process` JSON.
    CredentialProcess,
}

#[derive(Parser, Debug)]
#[command(name = "sts-gateway", version, about)]
pub struct Args {
    /// ARN of the role to assume.
    #[arg()]
    pub role_arn: String,

    /// Name of the role session, recorded by STS for auditing.
    #[arg(short, long, default_value = defaults::ROLE_SESSION_NAME)]
    pub session_name: String,

    /// Requested validity of the credentials.
    #[arg(short, long, default_value_t = defaults::DURATION_SECONDS)]
    pub duration_seconds: u64,

    /// Give up on STS after this many seconds.
    #[arg(short, long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long)]
    pub region: Option<String>,

    /// Profile providing the base credentials.
    #[arg(long)]
    pub profile: Option<String>,

    /// Override the STS endpoint.
    #[arg(long)]
    pub endpoint_url: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Env)]
    pub format: Format,
}

impl Args {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            region: self.region.clone(),
            profile_name: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }

    fn context(&self) -> Context {
        let ctx = Context::background();
        match self.timeout_seconds {
            Some(secs) => ctx.with_timeout(Duration::from_secs(secs)),
            None => ctx,
        }
    }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let gateway = DefaultStsGateway::from_config(&args.gateway_config()).await;
    let ctx = args.context();

    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted");
            interrupt.cancel();
        }
    });

    debug!("target role:{}", args.role_arn);
    let credentials = gateway
        .issue(
            &ctx,
            &args.role_arn,
            &args.session_name,
            Duration::from_secs(args.duration_seconds),
        )
        .await?;

    let credentials = RoleCredentials {
        role_arn: args.role_arn,
        session_name: args.session_name,
        region_name: gateway.provider().region_name(),
        credentials,
    };

    let mut out = io::stdout().lock();
    match args.format {
        Format::Env => EnvHandler.handle_credentials(&mut out, &credentials),
        Format::CredentialProcess => {
            CredentialProcessHandler.handle_credentials(&mut out, &credentials)
        }
    }
}
