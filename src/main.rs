//! windcfg: inspect and maintain a config root on the host
//!
//! Usage: `windcfg <config-root> <export|dirty|resolve <preset> [style]|active|reset>`
//!
//! `active` evaluates schedules in the zone named by the system section.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nature_wind_config::config::ConfigManager;
use nature_wind_config::persistence::LocalFs;
use nature_wind_config::platform::Clock;
use nature_wind_config::runtime::SelectionPolicy;
use nature_wind_config::{ConfigError, ManagerSettings, ResetTarget};

#[derive(Parser)]
#[command(name = "windcfg", about = "Inspect and maintain a fan config root", version)]
struct Cli {
    /// Directory the device paths (`/json/...`) resolve under
    root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every section as one JSON document
    Export,
    /// Print per-section dirty flags after loading
    Dirty,
    /// Print the resolved wind parameters
    Resolve {
        preset: String,
        style: Option<String>,
    },
    /// Print the schedule active right now
    Active,
    /// Factory reset every section and save
    Reset,
}

fn print_json(value: &impl serde::Serialize) -> Result<(), ConfigError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Encode {
        what: "output".to_string(),
        source,
    })?;
    println!("{}", text);
    Ok(())
}

fn run(root: &Path, command: Command) -> Result<(), ConfigError> {
    let settings = ManagerSettings::load(&root.join(ManagerSettings::FILE_NAME));
    let manager = ConfigManager::new(LocalFs::new(root), settings);

    match command {
        Command::Reset => {
            manager.load_manifest()?;
            manager.factory_reset(ResetTarget::All)?;
            let saved = manager.save_all()?.into_result()?;
            log::info!("Reset and saved {} section(s)", saved.len());
            print_json(&saved.iter().map(|kind| kind.key()).collect::<Vec<_>>())
        }
        Command::Export => {
            manager.load_all()?;
            print_json(&manager.export_all()?)
        }
        Command::Dirty => {
            manager.load_all()?;
            print_json(&manager.dirty_status())
        }
        Command::Resolve { preset, style } => {
            manager.load_all()?;
            print_json(&manager.resolve_wind(&preset, style.as_deref(), None)?)
        }
        Command::Active => {
            manager.load_all()?;
            let Some(now) = manager.system_clock()?.local_time() else {
                log::warn!("Local time unavailable");
                return print_json(&serde_json::Value::Null);
            };
            print_json(&manager.active_schedule(&now, SelectionPolicy::default())?)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli.root, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("windcfg: {}", e);
            ExitCode::FAILURE
        }
    }
}
