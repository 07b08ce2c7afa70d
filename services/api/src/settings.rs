use crate::infra::settings_store;
use clap::{Args, Subcommand};
use grade_highlighter::config::AppConfig;
use grade_highlighter::error::AppError;
use grade_highlighter::highlight::{HighlightService, RuleSettings, SettingKey};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Subcommand, Debug)]
pub(crate) enum SettingsCommand {
    /// Print every toggle and whether it is enabled
    Show(SettingsFileArgs),
    /// Enable or disable toggles, e.g. `borderline=false distMax=true`
    Set(SettingsSetArgs),
    /// Restore every toggle to enabled
    Reset(SettingsFileArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct SettingsFileArgs {
    /// Override the configured settings file
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SettingsSetArgs {
    /// KEY=BOOL pairs; legacy key names are accepted
    #[arg(required = true, value_parser = parse_toggle)]
    pub(crate) pairs: Vec<(String, bool)>,
    #[command(flatten)]
    pub(crate) file: SettingsFileArgs,
}

pub(crate) fn parse_toggle(raw: &str) -> Result<(String, bool), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=BOOL, got '{raw}'"))?;
    let enabled = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => true,
        "false" | "off" | "0" | "no" => false,
        other => return Err(format!("'{other}' is not a boolean for '{key}'")),
    };
    Ok((key.trim().to_string(), enabled))
}

pub(crate) fn run_settings(command: SettingsCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    match command {
        SettingsCommand::Show(args) => {
            let store = settings_store(&config, args.settings);
            let service = HighlightService::new(Arc::new(store));
            print!("{}", describe(&service.settings()?));
        }
        SettingsCommand::Set(args) => {
            let store = settings_store(&config, args.file.settings);
            let service = HighlightService::new(Arc::new(store));
            let overrides: BTreeMap<String, bool> = args.pairs.into_iter().collect();
            let update = service.update_settings(&overrides)?;
            for name in &update.ignored {
                eprintln!("ignored unknown setting '{name}'");
            }
            print!("{}", describe(&update.settings));
        }
        SettingsCommand::Reset(args) => {
            let store = settings_store(&config, args.settings);
            let service = HighlightService::new(Arc::new(store));
            print!("{}", describe(&service.reset_settings()?));
        }
    }

    Ok(())
}

fn describe(settings: &RuleSettings) -> String {
    SettingKey::ALL
        .into_iter()
        .map(|key| {
            let state = if settings.is_enabled(key) { "on" } else { "off" };
            format!("{:<22} {:<4} {}\n", key.as_str(), state, key.label())
        })
        .collect()
}
