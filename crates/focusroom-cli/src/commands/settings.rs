use clap::Subcommand;
use focusroom_core::{AppConfig, SettingsSynchronizer, Stores, SyncStatus, TimerSettingsPatch};
use serde_json::json;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Change one setting (e.g. `focus_minutes 30`, `sound_enabled off`)
    Set {
        /// One of focus_minutes, short_break_minutes, long_break_minutes,
        /// long_break_after, sound_enabled, transition_sound_enabled,
        /// pause_resume_sound_enabled
        field: String,
        value: String,
    },
    /// Load settings from the store and push any unsynced edit
    Sync,
}

fn describe(status: &SyncStatus) -> String {
    match status {
        SyncStatus::Synced { at } => format!("synced at {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        SyncStatus::Pending => "sync pending".to_string(),
        SyncStatus::Unsynced { reason } => format!("not synced: {reason}"),
    }
}

pub async fn run(action: SettingsAction, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let stores = Stores::open(config)?;
    let sync = SettingsSynchronizer::new(stores.settings);
    let settings = sync.load().await;

    match action {
        SettingsAction::Show { json } => {
            if json {
                let out = json!({ "settings": settings, "status": sync.status() });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("focus_minutes              {}", settings.focus_minutes);
                println!("short_break_minutes        {}", settings.short_break_minutes);
                println!("long_break_minutes         {}", settings.long_break_minutes);
                println!("long_break_after           {}", settings.long_break_after);
                println!("sound_enabled              {}", settings.sound_enabled);
                println!("transition_sound_enabled   {}", settings.transition_sound_enabled);
                println!("pause_resume_sound_enabled {}", settings.pause_resume_sound_enabled);
                println!("({})", describe(&sync.status()));
            }
        }
        SettingsAction::Set { field, value } => {
            let mut patch = TimerSettingsPatch::default();
            patch.set_field(&field, &value)?;
            match sync.update(&patch).await {
                Ok(updated) => println!("{}", serde_json::to_string_pretty(&updated)?),
                Err(e) if e.is_persistence() => {
                    eprintln!("settings changed locally but {}", describe(&sync.status()));
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        SettingsAction::Sync => {
            if !sync.status().is_synced() {
                sync.retry().await?;
            }
            println!("{}", describe(&sync.status()));
        }
    }
    Ok(())
}
