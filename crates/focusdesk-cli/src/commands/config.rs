use clap::Subcommand;
use focusdesk_core::{ConfigStore, SqliteStore, TimerConfig};
use std::sync::Arc;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "focusSeconds", "autoSwitch")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ConfigStore::open(Arc::new(SqliteStore::open()?));

    match action {
        ConfigAction::Get { key } => match store.current().get(&key) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
        },
        ConfigAction::Set { key, value } => {
            let mut config = *store.current();
            config.set(&key, &value)?;
            store.try_save(config)?;
            println!("ok");
        }
        ConfigAction::List => {
            let json = serde_json::to_string_pretty(store.current())?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            store.try_save(TimerConfig::default())?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
