use dnsroute_domain::{CliOverrides, Config};

/// Loads and validates the configuration. Errors surface before logging is
/// up, so they are returned rather than logged.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}
