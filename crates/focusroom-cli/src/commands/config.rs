use clap::Subcommand;
use focusroom_core::{AppConfig, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting, e.g. `store.backend` or `clock.tick_interval_ms`
    Get { key: String },
    /// Change one setting and write the config file
    Set {
        /// `<section>.<field>`; sections are store, clock, stats and logging
        key: String,
        /// New value; an empty string clears `store.api_url`
        value: String,
    },
    /// Print every setting as `section.field = value`
    List {
        #[arg(long)]
        json: bool,
    },
    /// Overwrite the config file with defaults
    Reset,
    /// Print the config file location
    Path,
}

/// Unknown-key error listing the keys this config actually has.
fn unknown_key(config: &AppConfig, key: &str) -> Box<dyn std::error::Error> {
    let known: Vec<String> = config.entries().into_iter().map(|(k, _)| k).collect();
    format!("unknown config key '{key}' (known keys: {})", known.join(", ")).into()
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = AppConfig::load()?;
            let value = config.get(&key).ok_or_else(|| unknown_key(&config, &key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = AppConfig::load()?;
            match config.set(&key, &value) {
                Err(ConfigError::UnknownKey(_)) => return Err(unknown_key(&config, &key)),
                other => other?,
            }
            config.save()?;
            println!("{key} = {}", config.get(&key).unwrap_or_default());
        }
        ConfigAction::List { json } => {
            let config = AppConfig::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            AppConfig::default().save()?;
            println!("wrote defaults to {}", AppConfig::path()?.display());
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::path()?.display());
        }
    }
    Ok(())
}
