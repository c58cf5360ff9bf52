mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_UPGRADE_ERROR};
use pru_core::{Engine, PinOptions, PruConfig};
use pru_schema::ManifestSource;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "pru",
    version,
    about = "Upgrade Python requirements and pin them to the installed versions"
)]
struct Cli {
    /// Path to the requirements file. Defaults to requirements.txt in the
    /// current directory; use '.' to run without a requirements file.
    #[arg(short = 'r', long = "requirement", global = true)]
    requirement: Option<String>,

    /// Write the pinned requirements here instead of overwriting the input.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Command the package names are appended to when upgrading.
    /// Defaults to "uv pip install --upgrade" if uv is on PATH, else
    /// "pip install --upgrade".
    #[arg(long = "cmd", global = true)]
    cmd: Option<String>,

    /// Python interpreter whose environment is inspected.
    #[arg(long, global = true)]
    python: Option<String>,

    /// Scan these directories instead of asking the interpreter (repeatable).
    #[arg(long = "site-packages", global = true)]
    site_packages: Vec<PathBuf>,

    /// Pin installed versions even if the upgrade command fails.
    #[arg(long, default_value_t = false, global = true)]
    allow_upgrade_failure: bool,

    /// Configuration file (default: $PRU_CONFIG or ~/.config/pru/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Defaults to upgrade-requirements.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show installed versions of the required packages and of the whole environment.
    #[command(alias = "print_installed")]
    PrintInstalled,
    /// Pin installed versions into the requirements file without upgrading.
    #[command(alias = "replace_versions")]
    ReplaceVersions {
        /// Exit non-zero if the file is not already pinned; write nothing.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Upgrade the required packages, then pin the installed versions.
    #[command(alias = "upgrade_requirements")]
    UpgradeRequirements,
    /// Upgrade the required packages without touching the requirements file.
    #[command(alias = "upgrade_installed")]
    Upgrade,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<PruConfig, String> {
    let mut config = match &cli.config {
        Some(path) => PruConfig::load(path),
        None => PruConfig::load_default(),
    }
    .map_err(|e| e.to_string())?;

    if let Some(cmd) = &cli.cmd {
        config.upgrade_command = Some(cmd.clone());
    }
    if let Some(python) = &cli.python {
        config.python.clone_from(python);
    }
    if !cli.site_packages.is_empty() {
        config.site_packages.clone_from(&cli.site_packages);
    }
    if cli.allow_upgrade_failure {
        config.allow_upgrade_failure = true;
    }
    Ok(config)
}

/// Whether an upgrade would start the package manager at all. An unreadable
/// manifest counts as no, so the workflow reports the manifest error itself.
fn names_packages(source: &ManifestSource) -> bool {
    source
        .load()
        .is_ok_and(|manifest| manifest.requirements().next().is_some())
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PRU_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let source = ManifestSource::from_arg(cli.requirement.as_deref());
    let command = cli.command.unwrap_or(Commands::UpgradeRequirements);
    let needs_upgrade = matches!(command, Commands::UpgradeRequirements | Commands::Upgrade);
    if needs_upgrade {
        let upgrade_command = config.upgrade_command();
        debug!("upgrade command: {upgrade_command}");
        if config.has_explicit_upgrade_command() {
            debug!("upgrade command set explicitly, skipping prerequisite check");
        } else if std::env::var("PRU_SKIP_PREREQS").as_deref() == Ok("1") {
            debug!("PRU_SKIP_PREREQS=1, skipping prerequisite check");
        } else if names_packages(&source) {
            let missing = pru_runtime::check_upgrade_prereqs(&upgrade_command);
            if !missing.is_empty() {
                eprintln!("error: {}", pru_runtime::format_missing(&missing));
                return ExitCode::from(EXIT_FAILURE);
            }
        }
        config.upgrade_command = Some(upgrade_command);
    }

    let engine = Engine::new(config);
    let json_output = cli.json;
    let pin_options = PinOptions {
        output: cli.output,
        check: false,
    };

    let result = match command {
        Commands::PrintInstalled => commands::print_installed::run(&engine, &source, json_output),
        Commands::ReplaceVersions { check } => commands::replace_versions::run(
            &engine,
            &source,
            &PinOptions {
                check,
                ..pin_options
            },
            json_output,
        ),
        Commands::UpgradeRequirements => {
            commands::upgrade_requirements::run(&engine, &source, &pin_options, json_output)
        }
        Commands::Upgrade => commands::upgrade::run(&engine, &source, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("upgrade failed:") {
                EXIT_UPGRADE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
