//! Command dispatch: one handler per subcommand

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ConfigManager};
use crate::cli::args::{Cli, Commands, ConfigCommands, OutputFormat};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{KeyPath, RawValue};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show { format }) => _show(cli, *format),
        Some(Commands::Get { key }) => _get(cli, key),
        Some(Commands::Has { key }) => _has(cli, key),
        Some(Commands::Files) => _files(cli),
        Some(Commands::Tree) => _tree(cli),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => _show(cli, OutputFormat::Toml),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("current directory", e))),
    }
}

/// Effective settings: layered settings with command line flags on top.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let project = project_dir(cli)?;
    let mut settings = Settings::load(Some(&project))?;
    if !cli.dirs.is_empty() {
        settings.search_dirs = cli.dirs.clone();
    }
    if !cli.files.is_empty() {
        settings.file_names = cli.files.clone();
    }
    Ok(settings)
}

/// Load the cascade described by `cli`, then merge any pushed files.
pub fn load_manager(cli: &Cli) -> CliResult<ConfigManager> {
    let project = project_dir(cli)?;
    let settings = load_settings(cli)?;
    let mut options = settings.manager_options(&project);
    if let Some(hostname) = &cli.hostname {
        options = options.with_hostname(hostname.clone());
    }
    debug!("options: {:?}", options);

    let mut manager = ConfigManager::load(options);
    if !cli.push.is_empty() {
        manager.push_files(cli.push.iter().map(|p| resolve(&project, p)));
    }
    Ok(manager)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Serialize a plain value in the requested format.
///
/// TOML has no null: `null` entries are left out of TOML output.
pub fn render(value: &RawValue, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Toml => toml::to_string_pretty(&value.without_nulls())
            .map_err(|e| CliError::Render(e.to_string())),
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| CliError::Render(e.to_string()))
        }
    }
}

#[instrument(skip(cli))]
fn _show(cli: &Cli, format: OutputFormat) -> CliResult<()> {
    let manager = load_manager(cli)?;
    let rendered = render(&manager.flatten(), format)?;
    output::info(rendered.trim_end());
    Ok(())
}

#[instrument(skip(cli))]
fn _get(cli: &Cli, key: &str) -> CliResult<()> {
    KeyPath::parse(key).map_err(ApplicationError::from)?;
    let manager = load_manager(cli)?;
    let entry = manager
        .get(key)
        .ok_or_else(|| CliError::NotSet(key.to_string()))?;
    match entry.to_raw() {
        map @ RawValue::Map(_) => output::info(render(&map, OutputFormat::Toml)?.trim_end()),
        other => output::info(&other),
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _has(cli: &Cli, key: &str) -> CliResult<()> {
    KeyPath::parse(key).map_err(ApplicationError::from)?;
    let manager = load_manager(cli)?;
    if manager.has(key) {
        output::info("true");
        Ok(())
    } else {
        output::info("false");
        Err(CliError::Absent(key.to_string()))
    }
}

#[instrument(skip(cli))]
fn _files(cli: &Cli) -> CliResult<()> {
    let manager = load_manager(cli)?;
    if manager.files().is_empty() {
        output::warning("no configuration files found");
        for dir in manager.options().search_dirs() {
            output::detail(&dir.display());
        }
        return Ok(());
    }
    for file in manager.files() {
        output::info(&file.display());
    }
    Ok(())
}

#[instrument(skip(cli))]
fn _tree(cli: &Cli) -> CliResult<()> {
    let manager = load_manager(cli)?;
    output::info(&manager.table().to_tree_string());
    Ok(())
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(settings.to_toml()?.trim_end());
        }
        ConfigCommands::Template => {
            output::info(Settings::template().trim_end());
        }
        ConfigCommands::Path => {
            output::header("Settings files (lowest to highest precedence)");
            match global_config_path() {
                Some(path) => print_path("global", &path),
                None => output::failure("global: no home directory"),
            }
            print_path("local", &local_config_path(&project_dir(cli)?));
        }
    }
    Ok(())
}

fn print_path(label: &str, path: &Path) {
    let line = format!("{}: {}", label, path.display());
    if path.exists() {
        output::success_detail(&line);
    } else {
        output::failure(&format!("{} (not found)", line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawMap;

    fn sample() -> RawValue {
        let mut nested = RawMap::new();
        nested.insert("host".into(), "localhost".into());
        let mut map = RawMap::new();
        map.insert("name".into(), "app".into());
        map.insert("db".into(), RawValue::Map(nested));
        RawValue::Map(map)
    }

    #[test]
    fn given_nested_map_when_render_toml_then_table_section() {
        let rendered = render(&sample(), OutputFormat::Toml).unwrap();
        assert!(rendered.contains("name = \"app\""));
        assert!(rendered.contains("[db]"));
        assert!(rendered.contains("host = \"localhost\""));
    }

    #[test]
    fn given_nested_map_when_render_json_then_keeps_order() {
        let rendered = render(&sample(), OutputFormat::Json).unwrap();
        let name = rendered.find("\"name\"").unwrap();
        let db = rendered.find("\"db\"").unwrap();
        assert!(name < db);
    }

    #[test]
    fn given_null_when_render_toml_then_entry_left_out() {
        let mut map = RawMap::new();
        map.insert("a".into(), RawValue::from(1));
        map.insert("gone".into(), RawValue::Null);

        let rendered = render(&RawValue::Map(map), OutputFormat::Toml).unwrap();

        assert_eq!(rendered.trim_end(), "a = 1");
    }

    #[test]
    fn given_null_when_render_json_then_kept() {
        let mut map = RawMap::new();
        map.insert("gone".into(), RawValue::Null);

        let rendered = render(&RawValue::Map(map), OutputFormat::Json).unwrap();

        assert!(rendered.contains("\"gone\": null"));
    }
}
