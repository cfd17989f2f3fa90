//! txpush command-line tool.
//!
//! Pushes the Transifex resources whose source file changed since a base
//! revision, then posts a summary to Slack. Also provides subcommands to
//! inspect the parsed Transifex config and the change decision without
//! pushing anything.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

use txpush_core::changes::ChangeDetector;
use txpush_core::config::{self, Settings};
use txpush_core::git::GitClient;
use txpush_core::notify::SlackNotifier;
use txpush_core::pipeline::PushPipeline;
use txpush_core::tx::TxClient;
use txpush_core::tx_config::TxConfig;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Push changed Transifex source files and report them to Slack.
#[derive(Parser, Debug)]
#[command(
    name = "txpush",
    version,
    about = "Push changed Transifex source files and report them to Slack"
)]
struct Cli {
    /// Path to a txpush TOML settings file (default: <repo>/txpush.toml if present).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Repository working tree.
    #[arg(long, global = true)]
    repo: Option<PathBuf>,

    /// Transifex config, relative to the repository unless absolute.
    #[arg(long, global = true)]
    tx_config: Option<PathBuf>,

    /// Base revision to compare the working tree against (default HEAD~1).
    #[arg(long, global = true)]
    since_commit: Option<String>,

    /// Name or path of the Transifex client executable.
    #[arg(long, global = true)]
    tx_binary: Option<String>,

    /// Detect and report changes without pushing or notifying.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Push changed resources and notify Slack (the default).
    Push,

    /// List the resources declared in the Transifex config.
    Resources {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show which resources changed since the base revision.
    Changes,

    /// Validate settings and the Transifex config.
    Validate,

    /// Generate a default settings file.
    Init {
        /// Output path for the generated settings file.
        #[arg(short, long, default_value = "./txpush.toml")]
        output: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Init { output }) = &cli.command {
        return cmd_init(output);
    }

    let settings = build_settings(&cli)?;
    init_tracing(&settings.log_level);

    match cli.command.unwrap_or(Commands::Push) {
        Commands::Push => cmd_push(&settings).await,
        Commands::Resources { json } => cmd_resources(&settings, json),
        Commands::Changes => cmd_changes(&settings),
        Commands::Validate => cmd_validate(&settings),
        Commands::Init { output } => cmd_init(&output),
    }
}

// ---------------------------------------------------------------------------
// Settings helpers
// ---------------------------------------------------------------------------

/// Assemble the run settings: file, then environment, then flags.
fn build_settings(cli: &Cli) -> Result<Settings> {
    let repo = cli.repo.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut settings =
        Settings::discover(cli.settings.as_deref(), &repo).context("failed to load settings")?;
    settings
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;

    if let Some(ref repo) = cli.repo {
        settings.git.repo_path = repo.clone();
    }
    if let Some(ref path) = cli.tx_config {
        settings.tx.config_path = path.clone();
    }
    if let Some(ref since) = cli.since_commit {
        settings.git.since_commit = since.clone();
    }
    if let Some(ref binary) = cli.tx_binary {
        settings.tx.binary = binary.clone();
    }
    if cli.dry_run {
        settings.dry_run = true;
    }
    if let Some(ref level) = cli.log_level {
        settings.log_level = level.clone();
    }

    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn load_tx_config(settings: &Settings) -> Result<TxConfig> {
    TxConfig::load_from_file(settings.tx_config_path())
        .context("failed to load Transifex config")
}

fn open_repo(path: &Path) -> Result<GitClient> {
    GitClient::new(path).context("failed to open git repository")
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_push(settings: &Settings) -> Result<()> {
    config::log_summary(settings);

    let tx_config = load_tx_config(settings)?;
    let git = open_repo(&settings.git.repo_path)?;
    let tx = TxClient::new(
        settings.tx.binary.clone(),
        settings.git.repo_path.clone(),
        Duration::from_secs(settings.tx.timeout_secs),
    );
    let slack = settings
        .slack
        .webhook_url
        .clone()
        .map(|url| {
            SlackNotifier::new(
                url,
                settings.slack.color.clone(),
                Duration::from_secs(settings.slack.timeout_secs),
            )
        })
        .transpose()
        .context("failed to create Slack client")?;

    let summary = PushPipeline::new(&git, &tx, settings.git.since_commit.as_str())
        .with_notifier(slack.as_ref(), settings.slack.title.clone())
        .dry_run(settings.dry_run)
        .run(&tx_config)
        .await
        .context("push failed")?;

    info!(
        pushed = summary.pushed.len(),
        skipped = summary.skipped.len(),
        notified = summary.notified,
        "done"
    );
    Ok(())
}

fn cmd_resources(settings: &Settings, json: bool) -> Result<()> {
    let tx_config = load_tx_config(settings)?;

    if json {
        let out = serde_json::to_string_pretty(tx_config.resources())
            .context("failed to serialize resources")?;
        println!("{}", out);
        return Ok(());
    }

    if tx_config.is_empty() {
        println!("No resources found in {}.", settings.tx_config_path().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Organization", "Project", "Resource", "Source file"]);

    for entry in tx_config.resources() {
        table.add_row(vec![
            entry.parsed.organization.as_str(),
            entry.parsed.project.as_str(),
            entry.parsed.resource.as_str(),
            entry.source_file.as_str(),
        ]);
    }

    println!("{}", table);
    println!();
    println!("{} resource(s)", tx_config.len());
    if let Some(host) = tx_config.main.host() {
        println!("{}", style::dim(&format!("host: {}", host)));
    }

    Ok(())
}

fn cmd_changes(settings: &Settings) -> Result<()> {
    let tx_config = load_tx_config(settings)?;
    let git = open_repo(&settings.git.repo_path)?;
    let detector = ChangeDetector::new(&git, settings.git.since_commit.as_str())
        .context("failed to list changed files")?;

    println!(
        "{}",
        style::header(&format!("Changes since {}", detector.base()))
    );
    println!();

    let mut changed = 0;
    for entry in tx_config.resources() {
        match detector.matched_path(&entry.source_file) {
            Some(path) => {
                changed += 1;
                println!(
                    "  {}  {}  {}",
                    style::changed(),
                    entry.parsed.push_target(),
                    style::dim(path)
                );
            }
            None => {
                println!(
                    "  {}  {}",
                    style::unchanged(),
                    entry.parsed.push_target()
                );
            }
        }
    }

    println!();
    println!("{} of {} resource(s) would be pushed", changed, tx_config.len());
    Ok(())
}

fn cmd_validate(settings: &Settings) -> Result<()> {
    println!("Validating txpush setup in {}", settings.git.repo_path.display());
    println!();
    println!("{}", style::success("Settings are valid"));

    let tx_config = load_tx_config(settings)?;
    println!(
        "{}",
        style::success(&format!(
            "Transifex config parsed ({} resource(s))",
            tx_config.len()
        ))
    );

    let git = open_repo(&settings.git.repo_path)?;
    let detector = ChangeDetector::new(&git, settings.git.since_commit.as_str())
        .context("failed to diff against the base revision")?;
    println!(
        "{}",
        style::success(&format!(
            "Base revision '{}' resolves ({} changed file(s))",
            detector.base(),
            detector.changed_paths().len()
        ))
    );

    println!();
    println!("Summary:");
    println!("  Transifex config : {}", settings.tx_config_path().display());
    println!("  tx binary        : {}", settings.tx.binary);
    println!(
        "  Slack webhook    : {}",
        if settings.notifications_enabled() {
            "set"
        } else {
            "not set (notification disabled)"
        }
    );
    println!("  Dry run          : {}", settings.dry_run);

    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_settings = r#"# txpush settings
# Every key is optional; the values below are the defaults.

log_level = "info"
dry_run = false

[git]
repo_path = "."
since_commit = "HEAD~1"

[tx]
binary = "tx"
config_path = ".tx/config"
timeout_secs = 300

[slack]
# The webhook URL itself is read from this environment variable.
webhook_url_env = "SLACK_WEBHOOK_URL"
title = ":rocket: Updated translations pushed to Transifex"
color = "good"
timeout_secs = 30
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_settings).context("failed to write settings file")?;

    println!("Default settings written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust the settings for your repository");
    println!("  2. Export SLACK_WEBHOOK_URL to enable notifications");
    println!("  3. Check the setup with: txpush validate --settings {}", output.display());

    Ok(())
}
