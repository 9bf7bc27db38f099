//! xtool-config
//!
//! Command-line access to the xtool configuration store: inspect instances,
//! versions and snapshots, edit preferences, and follow live reloads.

use clap::{Parser, Subcommand};
use serde_json::Value;

use xtool_config::config::{ConfigManager, ManagerOptions, PreferenceKey};
use xtool_config::lifecycle::signals;
use xtool_config::observability::logging;
use xtool_config::{archive, Environment};

#[derive(Parser)]
#[command(name = "xtool-config")]
#[command(about = "Inspect and edit the xtool configuration store", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration file path
    Path,
    /// List known versions
    Versions,
    /// List instance names
    Instances,
    /// Show one instance as JSON
    Instance { name: String },
    /// Show one snapshot as JSON
    Snapshot { name: String },
    /// Read a preference
    Get { preference: String },
    /// Set a preference and save (value is parsed as JSON, else taken as a string)
    Set { preference: String, value: String },
    /// Record a version and save
    AddVersion { version: String },
    /// Forget a version and save
    RemoveVersion { version: String },
    /// Print where the archive for a version is stored
    Archive { version: String },
    /// Keep running and reload whenever the file changes
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let env = Environment::from_env();
    let live_reload = matches!(cli.command, Commands::Watch);
    let manager = ConfigManager::with_options(
        env,
        ManagerOptions {
            live_reload,
            ..ManagerOptions::default()
        },
    )?;

    match cli.command {
        Commands::Path => {
            println!("{}", manager.environment().config_file().display());
        }
        Commands::Versions => {
            for version in manager.versions() {
                println!("{version}");
            }
        }
        Commands::Instances => {
            for instance in manager.instances() {
                println!("{}", instance.name);
            }
        }
        Commands::Instance { name } => match manager.get_instance(&name) {
            Some(instance) => println!("{}", serde_json::to_string_pretty(&instance)?),
            None => return Err(format!("no instance named '{name}'").into()),
        },
        Commands::Snapshot { name } => match manager.get_snapshot(&name) {
            Some(snapshot) => println!("{}", serde_json::to_string_pretty(snapshot.record())?),
            None => return Err(format!("no snapshot named '{name}'").into()),
        },
        Commands::Get { preference } => {
            let key: PreferenceKey = preference.parse()?;
            let value = manager.get(key.as_str()).unwrap_or(Value::Null);
            println!("{value}");
        }
        Commands::Set { preference, value } => {
            manager.set(&preference, parse_value(&value))?;
            manager.persist()?;
        }
        Commands::AddVersion { version } => {
            if manager.add_version(&version)? {
                manager.persist()?;
            } else {
                eprintln!("Version {version} is already known");
            }
        }
        Commands::RemoveVersion { version } => {
            if manager.remove_version(&version) {
                manager.persist()?;
            } else {
                eprintln!("Version {version} is not known");
            }
        }
        Commands::Archive { version } => {
            let path = archive::archive_path(manager.environment(), &version)?;
            println!("{}", path.display());
            if archive::is_snapshot_build(&version) {
                eprintln!("{version} is a snapshot build");
            }
        }
        Commands::Watch => {
            tracing::info!(
                path = %manager.environment().config_file().display(),
                "Watching configuration, press Ctrl-C to stop"
            );
            signals::wait_for_interrupt().await?;
        }
    }

    drop(manager);
    Ok(())
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
