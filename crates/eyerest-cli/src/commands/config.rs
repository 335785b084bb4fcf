use clap::Subcommand;
use eyerest_core::error::ConfigError;
use eyerest_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dotted config key (e.g. "clock.test_time", "ramp.delta")
        key: String,
    },
    /// Set a config value and save it
    Set {
        /// Dotted config key
        key: String,
        /// New value (negative numbers are accepted, e.g. -0.5)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List all config values
    List {
        /// Print the TOML file contents instead of JSON
        #[arg(long)]
        toml: bool,
    },
    /// Print the config file location
    Path,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key} (sections: clock, ramp, window, announcer)");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            let line = apply_set(&mut config, &key, &value)?;
            config.save()?;
            println!("{line}");
        }
        ConfigAction::List { toml } => {
            let config = Config::load()?;
            println!("{}", render(&config, toml)?);
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

/// Apply `key = value` in memory and describe the stored result.
fn apply_set(config: &mut Config, key: &str, value: &str) -> Result<String, ConfigError> {
    config.set(key, value).map_err(|err| {
        tracing::warn!(key, value, "rejected config value");
        err
    })?;
    let stored = config.get(key).unwrap_or_else(|| value.to_string());
    Ok(format!("{key} = {stored}"))
}

fn render(config: &Config, as_toml: bool) -> Result<String, Box<dyn std::error::Error>> {
    if as_toml {
        Ok(toml::to_string_pretty(config)?)
    } else {
        Ok(serde_json::to_string_pretty(config)?)
    }
}
