//! Discovery manifest command.

use crate::server::Manifest;

/// Print the discovery manifest as pretty JSON.
pub fn cmd_manifest() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Manifest::build())?);
    Ok(())
}
