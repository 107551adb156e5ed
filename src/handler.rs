use std::io::Write;

use sts_gateway_schema::credentials::RoleCredentials;

pub mod credential_process;
pub mod env;

pub trait HandleCredentials {
    fn handle_credentials<W: Write>(
        &self,
        out: &mut W,
        credentials: &RoleCredentials,
    ) -> anyhow::Result<()>;
}

struct Variable<'a> {
    name: &'a str,
    value: Option<String>,
}

fn into_variables(request: &RoleCredentials) -> Vec<Variable> {
    fn v<S: Into<String>>(name: &str, value: Option<S>) -> Variable {
        Variable {
            name,
            value: value.map(|s| s.into()),
        }
    }

    let creds = &request.credentials;
    vec![
        // for AWS SDK, aws-cli
        v("AWS_PROFILE", Option::<String>::None),
        v("AWS_REGION", request.region_name.as_deref()),
        v("AWS_DEFAULT_REGION", request.region_name.as_deref()),
        v("AWS_ACCESS_KEY_ID", Some(creds.access_key_id())),
        v("AWS_SECRET_ACCESS_KEY", Some(creds.secret_access_key())),
        v("AWS_SESSION_TOKEN", Some(creds.session_token())),
        v("AWS_SESSION_EXPIRATION", Some(creds.expiration().to_rfc3339())),
        // for prompts
        v("STS_GATEWAY_ROLE_ARN", Some(request.role_arn.as_str())),
        v("STS_GATEWAY_SESSION_NAME", Some(request.session_name.as_str())),
    ]
}
