mod common;
mod error;
mod package;
mod source;
mod ui;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use colored::*;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::common::command::SystemRunner;
use crate::common::config::ForgedConfig;
use crate::common::tools::WhichTools;
use crate::error::ForgeError;
use crate::package::{PackageResolver, Resolution, UpgradeOrchestrator, remove_packages};
use crate::source::{BuildOutcome, SourceForge, project_name, remove_forged};
use crate::ui::OutputFormat;
use crate::ui::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// forged - the Archforged package manager
#[derive(Parser, Debug)]
#[command(name = "forged", about, disable_version_flag = true)]
#[command(group(
    ArgGroup::new("operation")
        .args(["bin", "git", "sync_upgrade", "remove", "git_remove", "version"])
        .multiple(false)
))]
struct Cli {
    /// Install from the official repos or the AUR
    #[arg(short = 'B', long = "bin", value_name = "PACKAGE")]
    bin: Option<String>,

    /// Clone and auto-build git projects
    #[arg(short = 'G', long = "git", value_name = "URL", num_args = 1..)]
    git: Option<Vec<String>>,

    /// Full system upgrade (also accepted as -Syu)
    #[arg(long = "sync-upgrade")]
    sync_upgrade: bool,

    /// Remove packages along with unneeded dependencies
    #[arg(short = 'R', long = "remove", value_name = "PACKAGE", num_args = 1..)]
    remove: Option<Vec<String>>,

    /// Delete the forged checkouts of a project (also accepted as -GR)
    #[arg(long = "git-remove", value_name = "PROJECT")]
    git_remove: Option<String>,

    /// Show version
    #[arg(short = 'v', long)]
    version: bool,

    /// Echo every external command
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for progress messages
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Use this config file instead of ~/.config/forged/config.toml
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

/// Rewrite pacman-style compound flags clap cannot express.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-Syu") => OsString::from("--sync-upgrade"),
            Some("-GR") => OsString::from("--git-remove"),
            _ => arg,
        })
        .collect()
}

fn main() {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => std::process::exit(handle_parse_error(err)),
    };

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }

    std::process::exit(run(cli));
}

fn handle_parse_error(err: clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            0
        }
        ErrorKind::UnknownArgument => {
            print_usage();
            0
        }
        _ => {
            let _ = err.print();
            1
        }
    }
}

fn run(cli: Cli) -> i32 {
    if cli.version {
        println!(
            "{} {} (the Archforged package manager)",
            "forged".green(),
            VERSION.cyan()
        );
        return 0;
    }

    let config = match ForgedConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            emit(Level::Error, "config.invalid", &format!("{e:#}"), None);
            return 1;
        }
    };

    let result = if let Some(package) = &cli.bin {
        install_binary(&config, package)
    } else if let Some(urls) = &cli.git {
        forge_sources(&config, urls)
    } else if cli.sync_upgrade {
        full_upgrade(&config)
    } else if let Some(packages) = &cli.remove {
        remove(&config, packages)
    } else if let Some(project) = &cli.git_remove {
        smelt(&config, project)
    } else {
        print_usage();
        return 0;
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            let step = e.downcast_ref::<ForgeError>().and_then(ForgeError::step);
            emit(
                Level::Error,
                "forged.failed",
                &format!("{e:#}"),
                step.map(|step| serde_json::json!({ "step": step })),
            );
            1
        }
    }
}

fn install_binary(config: &ForgedConfig, package: &str) -> Result<()> {
    let runner = SystemRunner::new(&config.privilege_wrapper);
    let resolution = PackageResolver::new(&runner, &WhichTools, config).resolve(package)?;

    let origin = match resolution {
        Resolution::Official => "official repositories".to_string(),
        Resolution::Aur {
            helper,
            bootstrapped: false,
        } => format!("AUR ({helper})"),
        Resolution::Aur {
            helper,
            bootstrapped: true,
        } => format!("AUR ({helper}, freshly bootstrapped)"),
    };
    emit(
        Level::Success,
        "package.install.done",
        &format!("{} installed from {}", highlight(package), origin),
        Some(serde_json::json!({ "package": package, "origin": origin })),
    );
    Ok(())
}

fn forge_sources(config: &ForgedConfig, urls: &[String]) -> Result<()> {
    let runner = SystemRunner::new(&config.privilege_wrapper);
    let forge = SourceForge::new(&runner, config);

    let outcomes = forge.forge_all(urls)?;
    for (url, outcome) in urls.iter().zip(outcomes) {
        match outcome {
            BuildOutcome::Built(system) => emit(
                Level::Success,
                "forge.build.done",
                &format!("{} forged from source ({system})", highlight(url)),
                Some(serde_json::json!({ "url": url, "build_system": system.to_string() })),
            ),
            BuildOutcome::HandedOff => emit(
                Level::Info,
                "forge.build.handed_off",
                &format!("Left the shell for {}", highlight(url)),
                None,
            ),
        }
    }
    Ok(())
}

fn full_upgrade(config: &ForgedConfig) -> Result<()> {
    let runner = SystemRunner::new(&config.privilege_wrapper);
    let report = UpgradeOrchestrator::new(&runner, &WhichTools).upgrade()?;

    let message = match report.helper {
        Some(_) => "System fully upgraded!",
        None => "System upgraded (no AUR helper installed)",
    };
    emit(Level::Success, "upgrade.done", message, None);
    Ok(())
}

fn remove(config: &ForgedConfig, packages: &[String]) -> Result<()> {
    let runner = SystemRunner::new(&config.privilege_wrapper);
    remove_packages(&runner, packages)?;
    emit(
        Level::Success,
        "package.remove.done",
        &format!("Removed {}", highlight(&packages.join(" "))),
        None,
    );
    Ok(())
}

fn smelt(config: &ForgedConfig, project: &str) -> Result<()> {
    let project = project_name(project).unwrap_or_else(|| project.to_string());
    let removed = remove_forged(&config.work_root(), &project)?;
    for dir in &removed {
        emit(
            Level::Debug,
            "forge.remove.dir",
            &format!("Removed {}", dir.display()),
            None,
        );
    }
    emit(
        Level::Success,
        "forge.remove.done",
        &format!(
            "Removed {} forged checkout(s) of {}",
            removed.len(),
            highlight(&project)
        ),
        None,
    );
    Ok(())
}

fn print_usage() {
    let forged = "forged".green();
    println!(
        r#"
{} {}
{}

Usage:
  {} -B <package>           → install from repos or AUR
  {} -G <url>...            → clone & auto-build git projects
  {} -Syu                   → full system upgrade
  {} -R <package>...        → remove packages
  {} -GR <project>          → delete forged checkouts of a project
  {} -v                     → show version

Examples:
  {} hyprland
  {} visual-studio-code-bin
  {} https://github.com/hyprwm/hyprpaper
"#,
        "forged".magenta().bold(),
        VERSION.cyan(),
        "The future of ricing".yellow(),
        forged,
        forged,
        forged,
        forged,
        forged,
        forged,
        "forged -B".green(),
        "forged -B".green(),
        "forged -G".green(),
    );
}
