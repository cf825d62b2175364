//! Configuration inspection command.

use console::style;

use crate::config::Settings;

/// Print the effective settings after file, env and default merging.
pub fn cmd_config(settings: &Settings) -> anyhow::Result<()> {
    eprintln!("{} Effective settings", style("→").cyan());
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}
