use std::io::Write;

use serde::Serialize;

use sts_gateway_schema::credentials::{Credentials, RoleCredentials};

use crate::handler::HandleCredentials;

/// Prints the JSON document the AWS CLI expects from a `credential_process`.
pub struct CredentialProcessHandler;

#[derive(Serialize)]
struct CredentialProcessOutput<'a> {
    #[serde(rename = "Version")]
    version: u8,

    #[serde(flatten)]
    credentials: &'a Credentials,
}

impl HandleCredentials for CredentialProcessHandler {
    fn handle_credentials<W: Write>(
        &self,
        out: &mut W,
        credentials: &RoleCredentials,
    ) -> anyhow::Result<()> {
        let output = CredentialProcessOutput {
            version: 1,
            credentials: &credentials.credentials,
        };
        serde_json::to_writer(&mut *out, &output)?;
        writeln!(out)?;
        Ok(())
    }
}
