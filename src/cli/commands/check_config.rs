//! Validate and print the effective configuration

use crate::config::Config;

pub fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let mut shown = config.clone();
    shown.security.confirmation_secret = "********".to_string();

    println!("{}", toml::to_string_pretty(&shown)?);
    println!("Configuration is valid.");
    Ok(())
}
