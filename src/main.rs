use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::io::Read;
use std::path::{Path, PathBuf};
use telenotify::{AlertBatch, Config, Notifier};

/// Command-line arguments for the Telegram notifier
#[derive(Parser)]
#[command(
    name = "telenotify",
    about = "Send monitoring summaries and alerts to a Telegram chat",
    long_about = "Formats the daily commodity/currency monitoring summary and delivers it, \
                  together with warning and emergency digests, files and error alerts, \
                  through the Telegram Bot API. Delivery failures are logged, never fatal."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send the daily summary plus warning/emergency digests
    Report {
        /// JSON file with level1/level2/level3 arrays, or `-` for stdin
        #[arg(value_name = "ALERTS_JSON")]
        alerts: PathBuf,
    },
    /// Send a raw text message
    Message {
        text: String,
        /// Deliver without a notification sound
        #[arg(long)]
        silent: bool,
    },
    /// Upload a file as a document
    File {
        path: PathBuf,
        #[arg(long, default_value = "")]
        caption: String,
    },
    /// Send a system error alert
    Error { message: String },
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to environment-only configuration
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if let Command::Report { ref alerts } = self.command {
            if alerts.as_os_str() != "-" && alerts.is_dir() {
                return Err(format!("Alerts path is a directory: {}", alerts.display()));
            }
        }

        Ok(())
    }
}

/// Read an alert batch from a JSON file, or stdin for `-`
fn read_alerts(path: &Path) -> Result<AlertBatch> {
    let contents = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read alerts from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read alerts file {}", path.display()))?
    };

    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid alerts JSON in {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let notifier = Notifier::from_config(&config).context("Failed to initialize notifier")?;
    info!("Notifier ready for chat {}", notifier.credentials().chat_id());

    match cli.command {
        Command::Report { alerts } => {
            let batch = read_alerts(&alerts)?;
            notifier.send_daily_report(&batch);
        }
        Command::Message { text, silent } => notifier.send_message(&text, silent),
        Command::File { path, caption } => notifier.send_file(&path, &caption),
        Command::Error { message } => notifier.send_error_alert(&message),
    }

    Ok(())
}

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
