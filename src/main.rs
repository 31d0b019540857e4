use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, warn};

use wtf_sync::discovery::ACCOUNT_DIR;
use wtf_sync::health::CheckResult;
use wtf_sync::sync::TargetList;
use wtf_sync::{HealthCheck, SyncConfig, SyncEngine, SyncOptions, SyncTarget};

/// Exit status when the run finished but some items could not be copied
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "wtf-sync")]
#[command(about = "Copy a prototype character's WTF settings to every other character and account")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to <wtf-dir>/wtf-sync.conf, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Game WTF directory, the parent of Account/
    #[arg(short, long, default_value = ".", global = true)]
    wtf_dir: String,

    /// Log what would change without touching any file
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Log every file-level decision
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Sync the prototype to every other character and account (default)
    Sync,

    /// List destinations in the order they would be synced
    Plan,

    /// Check config, account tree and prototype without syncing
    Doctor,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = wtf_sync::logging::init_logging(cli.verbose) {
        eprintln!("[sync][error] Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let wtf_dir = expand_path(&cli.wtf_dir)?;
    let config_path = cli.config.as_deref().map(expand_path).transpose()?;
    let config_path = config_path.as_deref();

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => cmd_sync(config_path, &wtf_dir, cli.dry_run),
        Commands::Plan => cmd_plan(config_path, &wtf_dir, cli.verbose),
        Commands::Doctor => Ok(cmd_doctor(config_path, &wtf_dir)),
    }
}

/// Expand `~` and environment variables in a path argument
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Load configuration from the specified path or the default locations
fn load_config(config_path: Option<&Path>, wtf_dir: &Path) -> Result<SyncConfig> {
    let path = SyncConfig::locate(config_path, wtf_dir).context("No usable config file")?;
    debug!("Using config file: {}", path.display());

    SyncConfig::load(&path).with_context(|| format!("Failed to load config file: {}", path.display()))
}

/// Sync the prototype everywhere
fn cmd_sync(config_path: Option<&Path>, wtf_dir: &Path, dry_run: bool) -> Result<ExitCode> {
    let config = load_config(config_path, wtf_dir)?;
    let engine = SyncEngine::new(config, SyncOptions { dry_run });

    let summary = engine.run(&wtf_dir.join(ACCOUNT_DIR))?;

    if summary.is_success() {
        return Ok(ExitCode::SUCCESS);
    }

    warn!(
        "{} items could not be synced; fix the cause and run again",
        summary.failed_operations()
    );
    Ok(ExitCode::from(EXIT_PARTIAL))
}

/// List the destinations a sync would touch
fn cmd_plan(config_path: Option<&Path>, wtf_dir: &Path, details: bool) -> Result<ExitCode> {
    let config = load_config(config_path, wtf_dir)?;
    let engine = SyncEngine::new(config, SyncOptions { dry_run: true });

    let (tree, prototype) = engine.resolve(&wtf_dir.join(ACCOUNT_DIR))?;
    let TargetList {
        targets,
        unreadable,
    } = engine.targets(&tree, &prototype)?;
    for e in &unreadable {
        warn!("Skipping unreadable directory: {}", e);
    }

    println!(
        "Prototype: {}/{}/{}",
        prototype.account, prototype.realm, prototype.character
    );
    println!("   {}", prototype.path.display());
    println!();
    println!("Destinations ({}):", targets.len());

    for target in &targets {
        let (kind, plan) = match target {
            SyncTarget::Character { .. } => (
                "character",
                engine.plan_character(&prototype.path, target.path()),
            ),
            SyncTarget::Account { .. } => (
                "account",
                engine.plan_account(&prototype.account_dir, target.path()),
            ),
        };

        println!("  {:<9} {} ({} items)", kind, target.label(), plan.items.len());
        if details {
            for item in &plan.items {
                println!("     {}", item.destination.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Preflight checks and diagnostics
fn cmd_doctor(config_path: Option<&Path>, wtf_dir: &Path) -> ExitCode {
    let health = HealthCheck::run(config_path, wtf_dir);
    print_health_report(&health);

    if health.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 wtf-sync Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}
