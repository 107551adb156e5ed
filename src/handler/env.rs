use std::io::Write;

use sts_gateway_schema::credentials::RoleCredentials;

use crate::handler::{into_variables, HandleCredentials, Variable};

/// Prints credentials as POSIX shell statements, for `eval "$(sts-gateway ...)"`.
pub struct EnvHandler;

impl HandleCredentials for EnvHandler {
    fn handle_credentials<W: Write>(
        &self,
        out: &mut W,
        credentials: &RoleCredentials,
    ) -> anyhow::Result<()> {
        for Variable { name, value } in into_variables(credentials) {
            match value {
                Some(value) => writeln!(out, "export {}={}", name, quote(&value))?,
                None => writeln!(out, "unset {}", name)?,
            }
        }

        Ok(())
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
