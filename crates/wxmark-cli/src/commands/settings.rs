use anyhow::Result;

use crate::config::CliConfig;

pub fn execute(config: &CliConfig) -> Result<()> {
    print!("{}", config.display_as_toml()?);
    Ok(())
}
