//! CLI definition and command execution
//!
//! netapp-deleter has a single action, so there are no subcommands: flags
//! tweak the configuration and `execute` runs the deletion.

use clap::Parser;
use std::sync::Arc;
use tracing::debug;

use crate::auth::AzureSession;
use crate::config::{AzureCredentialType, Config};
use crate::deleter::{DeletionOptions, DeletionReport, DeletionRun, RunOutcome};
use crate::error::{NetappDeleterError, Result};
use crate::netapp::models::{AccountSummary, NetAppAccount};
use crate::netapp::operations::AzureNetAppOperations;
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};
use crate::utils::interactive::{validate_subscription_id, TerminalPrompt};

const DEFAULT_LOG_FILTER: &str = "netapp_deleter=info";
const DEBUG_LOG_FILTER: &str =
    "netapp_deleter=debug,azure_identity=debug,azure_core=debug,reqwest=debug";

/// Default tracing filter when `RUST_LOG` is unset. `debug` comes from the
/// merged configuration, so `-v`, `DEBUG=true` and `debug = true` in the
/// config file all enable it.
pub fn log_filter(debug: bool) -> &'static str {
    if debug {
        DEBUG_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Get the full version string with build information
fn get_version() -> &'static str {
    env!("VERSION_WITH_GIT")
}

fn parse_subscription(value: &str) -> std::result::Result<String, String> {
    validate_subscription_id(value)?;
    Ok(value.trim().to_string())
}

fn parse_workers(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Parser, Debug)]
#[command(name = "netapp-deleter")]
#[command(about = "Delete every Azure NetApp Files account in a subscription, children first")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Enable debug logging, including the Azure SDK and HTTP stack
    #[arg(short, long)]
    pub verbose: bool,

    /// Number of accounts deleted concurrently
    #[arg(short, long, value_name = "N", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Subscription to operate on (defaults to the one the credential can see)
    #[arg(short, long, value_name = "ID", value_parser = parse_subscription)]
    pub subscription: Option<String>,

    /// Azure credential type (default, clientsecret)
    #[arg(long, value_name = "TYPE", env = "AZURE_CREDENTIAL_TYPE")]
    pub credential_type: Option<String>,

    /// Leave emptied resource groups in place
    #[arg(long)]
    pub keep_resource_groups: bool,

    /// List what would be deleted and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for the preview and the final report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Fold command-line flags over file and environment settings
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if self.verbose {
            config.debug = true;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(subscription) = &self.subscription {
            config.subscription_id = subscription.clone();
        }
        if let Some(credential_type) = &self.credential_type {
            config.credential_type = credential_type
                .parse::<AzureCredentialType>()
                .map_err(NetappDeleterError::config)?;
        }
        if self.keep_resource_groups {
            config.delete_resource_groups = false;
        }
        if self.no_color {
            config.no_color = true;
        }
        config.validate()
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        let no_color = config.no_color;
        let display =
            DisplayUtils::new(no_color).with_stderr(self.format == OutputFormat::Json);

        let session = AzureSession::establish(&config).await?;
        let ops = Arc::new(AzureNetAppOperations::new(
            session.client.clone(),
            session.subscription_id.clone(),
        ));

        let options = DeletionOptions::from_config(&config, self.yes, self.dry_run);
        debug!("Deletion options: {:?}", options);

        let run = DeletionRun::new(ops, options);
        let prompt = TerminalPrompt::new();
        let outcome = run
            .run(&prompt, |accounts| {
                print_preview(&display, self.format, self.dry_run, no_color, accounts)
            })
            .await?;

        match outcome {
            RunOutcome::NothingToDelete => {
                display.print_info("No NetApp accounts found in subscription");
                Ok(())
            }
            RunOutcome::DryRun(accounts) => {
                let resources: usize = accounts.iter().map(NetAppAccount::resource_count).sum();
                display.print_info(&format!(
                    "Dry run: {} accounts ({} resources) would be deleted",
                    accounts.len(),
                    resources
                ));
                Ok(())
            }
            RunOutcome::Cancelled => {
                display.print_warning("Operation cancelled");
                Ok(())
            }
            RunOutcome::Completed(report) => {
                print_report(&display, self.format, no_color, &report)?;
                if report.is_success() {
                    Ok(())
                } else {
                    Err(NetappDeleterError::PartialFailure {
                        failed: report.failed(),
                        total: report.outcomes.len(),
                    })
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn write(self, text: &str) {
        match self {
            Stream::Stdout => println!("{}", text),
            Stream::Stderr => eprintln!("{}", text),
        }
    }
}

/// In JSON mode stdout carries a single document: the account list for a
/// dry run, the deletion report otherwise. A real run still shows the
/// operator a table on stderr before the prompt.
fn render_preview(
    format: OutputFormat,
    dry_run: bool,
    no_color: bool,
    accounts: &[NetAppAccount],
) -> Result<(Stream, OutputFormat, String)> {
    let summaries: Vec<AccountSummary> = accounts.iter().map(NetAppAccount::to_summary).collect();
    let (stream, shown) = match (format, dry_run) {
        (OutputFormat::Json, false) => (Stream::Stderr, OutputFormat::Table),
        (format, _) => (Stream::Stdout, format),
    };
    let body = TableFormatter::new(shown, no_color).format_table(&summaries)?;
    Ok((stream, shown, body))
}

fn print_preview(
    display: &DisplayUtils,
    format: OutputFormat,
    dry_run: bool,
    no_color: bool,
    accounts: &[NetAppAccount],
) -> Result<()> {
    let (stream, shown, body) = render_preview(format, dry_run, no_color, accounts)?;
    if shown == OutputFormat::Table {
        display.print_header(&format!("{} NetApp accounts", accounts.len()));
    }
    stream.write(&body);
    Ok(())
}

fn render_report(format: OutputFormat, no_color: bool, report: &DeletionReport) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => TableFormatter::new(format, no_color).format_table(&report.rows()),
    }
}

fn print_report(
    display: &DisplayUtils,
    format: OutputFormat,
    no_color: bool,
    report: &DeletionReport,
) -> Result<()> {
    if format == OutputFormat::Table {
        display.print_header("Deletion report");
    }
    Stream::Stdout.write(&render_report(format, no_color, report)?);

    let elapsed = report.finished_at - report.started_at;
    let summary = display.format_key_value_pairs(&[
        ("Succeeded", report.succeeded().to_string()),
        ("Failed", report.failed().to_string()),
        ("Elapsed", format!("{}s", elapsed.num_seconds())),
    ]);

    if report.is_success() {
        display.print_success(&format!(
            "Deleted all {} NetApp accounts",
            report.outcomes.len()
        ));
    } else {
        display.print_error(&format!(
            "{} of {} NetApp accounts could not be deleted",
            report.failed(),
            report.outcomes.len()
        ));
    }
    display.print_plain(&summary);
    Ok(())
}
