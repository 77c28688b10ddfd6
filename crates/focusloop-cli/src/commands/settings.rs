use clap::Subcommand;
use focusloop_core::{Config, SettingField, Settings};
use serde_json::Value;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print one setting
    Get {
        /// Setting name (e.g. "work_minutes", "autoStartNext")
        field: String,
    },
    /// Change one setting; out-of-range values are clamped
    Set {
        field: String,
        value: String,
    },
    /// Print all settings as JSON
    List,
    /// Restore default durations and flags
    Reset,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut engine = super::open_engine(&config)?;

    match action {
        SettingsAction::Get { field } => {
            let field: SettingField = field.parse()?;
            println!("{}", engine.settings().get(field));
        }
        SettingsAction::Set { field, value } => {
            let field: SettingField = field.parse()?;
            engine.edit_setting(field, &Value::String(value));
            println!("{field} = {}", engine.settings().get(field));
        }
        SettingsAction::List => {
            println!("{}", serde_json::to_string_pretty(engine.settings())?);
        }
        SettingsAction::Reset => {
            let defaults = Settings::default();
            for field in SettingField::ALL {
                engine.edit_setting(field, &defaults.get(field));
            }
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
