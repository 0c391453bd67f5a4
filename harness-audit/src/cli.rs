///
/// This module implements the CLI interface for harness-audit: command parsing, the
/// user-visible banners and reports, and the mapping of failures to a non-zero exit.
///
/// All API access, listing, extraction and diffing lives in [`harness-audit-core`].
///
/// ## How To Use
/// - For command-line users: run the `harness-audit` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`harness-audit-core`]: ../../harness_audit_core/
/// [`Cli`]: struct.Cli.html
/// [`run`]: fn.run.html
use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harness_audit_core::audit::{
    collect_app_ids, compare_execution_configs, count_pipelines, customer_execution_config,
    AuditError, AuditProgress,
};
use harness_audit_core::client::HarnessClient;
use harness_audit_core::config::{ConfigError, API_KEY_VAR};
use harness_audit_core::contract::HttpTransport;
use harness_audit_core::report::{
    pretty_json, render_app_id_report, render_banner, render_config_comparison,
    render_pipeline_counts, render_progress, RULE, WIDE_RULE,
};
use harness_audit_core::transport::ReqwestTransport;
use std::path::PathBuf;

/// CLI for harness-audit: read-only audits of a Harness account.
#[derive(Debug, Parser)]
#[clap(
    name = "harness-audit",
    version,
    about = "Count pipelines, collect appIDs and compare CI execution configs for a Harness account"
)]
pub struct Cli {
    /// Optional YAML settings file (base_url, timeout_secs, page_size, infra)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Count pipelines per organization
    PipelinesByOrg,
    /// Group pipelines by the appIDs found in their YAML
    AppIds,
    /// Compare the customer CI execution config with the default one
    CompareConfig,
    /// Print the customer CI execution config
    CustomerConfig,
}

impl Commands {
    fn name(self) -> &'static str {
        match self {
            Commands::PipelinesByOrg => "pipelines-by-org",
            Commands::AppIds => "app-ids",
            Commands::CompareConfig => "compare-config",
            Commands::CustomerConfig => "customer-config",
        }
    }
}

fn print_progress(event: AuditProgress<'_>) {
    if let Some(line) = render_progress(&event) {
        println!("{line}");
    }
}

fn report_missing_credentials(error: &anyhow::Error) {
    if let Some(ConfigError::MissingVar(var)) = error.downcast_ref::<ConfigError>() {
        println!("❌ {var} environment variable is not set.");
        if *var == API_KEY_VAR {
            println!("Please set it with: export {var}='your_api_key_here'");
        } else {
            println!("Please set it with: export {var}='your_account_id_here'");
        }
    }
}

fn report_audit_error(error: &AuditError) {
    match error {
        AuditError::NoOrganizations | AuditError::OrganizationsUnavailable => {
            println!("❌ No organizations found or API call failed.");
        }
        AuditError::ConfigUnavailable(kind) => {
            println!("❌ Failed to fetch {kind} configuration");
        }
    }
}

async fn pipelines_by_org<T: HttpTransport>(client: &HarnessClient<'_, T>) -> Result<()> {
    let account_id = &client.config().account_id;
    println!("{}", render_banner("Starting pipeline count analysis...", account_id, RULE));
    println!("📂 Fetching organizations...");
    let report = count_pipelines(client, &print_progress).await?;
    print!("{}", render_pipeline_counts(&report));
    Ok(())
}

async fn app_ids<T: HttpTransport>(client: &HarnessClient<'_, T>) -> Result<()> {
    let account_id = &client.config().account_id;
    println!("{}", render_banner("Starting pipeline appID analysis...", account_id, WIDE_RULE));
    println!("📂 Fetching organizations...");
    let report = collect_app_ids(client, &print_progress).await?;
    print!("{}", render_app_id_report(&report));
    Ok(())
}

async fn compare_config<T: HttpTransport>(client: &HarnessClient<'_, T>) -> Result<()> {
    println!("Fetching default and customer configurations...");
    let comparison = compare_execution_configs(client).await?;
    print!("{}", render_config_comparison(&comparison));
    Ok(())
}

async fn customer_config<T: HttpTransport>(client: &HarnessClient<'_, T>) -> Result<()> {
    println!("Fetching customer configuration...");
    let config = customer_execution_config(client).await?;
    println!("{}", pretty_json(&config));
    Ok(())
}

/// Runs one command against an already-built client.
pub async fn execute<T: HttpTransport>(
    command: Commands,
    client: &HarnessClient<'_, T>,
) -> Result<()> {
    let result = match command {
        Commands::PipelinesByOrg => pipelines_by_org(client).await,
        Commands::AppIds => app_ids(client).await,
        Commands::CompareConfig => compare_config(client).await,
        Commands::CustomerConfig => customer_config(client).await,
    };
    if let Err(e) = &result {
        if let Some(audit_error) = e.downcast_ref::<AuditError>() {
            report_audit_error(audit_error);
        }
    }
    result
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!(command = cli.command.name(), "trace_initialised");

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report_missing_credentials(&e);
            tracing::error!(error = %e, "Configuration failed");
            return Err(e);
        }
    };

    let transport =
        ReqwestTransport::with_timeout(config.timeout).context("Failed to build HTTP client")?;
    let client = HarnessClient::new(&config, transport);

    match execute(cli.command, &client).await {
        Ok(()) => {
            tracing::info!(command = cli.command.name(), "Command complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = cli.command.name(), error = %e, "Command failed");
            Err(e)
        }
    }
}
