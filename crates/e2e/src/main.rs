//! EntityQA runner
//!
//! Runs the API and UI suites and writes Allure result files.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use entityqa_e2e::config::{BrowserKind, HarnessConfig, RunMode};
use entityqa_e2e::report::{
    collect_environment, write_environment_file, AllureReporter, FanoutReporter, SharedReporter,
    TracingReporter,
};
use entityqa_e2e::{EntityApi, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "entityqa")]
#[command(about = "End-to-end tests for the Entity API and the banking demo UI")]
#[command(version)]
struct Cli {
    /// Browser for UI tests (chrome or firefox)
    #[arg(long, default_value = "chrome")]
    browser: String,

    /// Browser mode: local or remote
    #[arg(long, default_value = "local")]
    mode: String,

    /// Base URL of the entity API
    #[arg(long, default_value = "http://localhost:8080")]
    app_url: String,

    /// WebDriver endpoint for local mode
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver_url: String,

    /// Banking demo manager screen
    #[arg(
        long,
        default_value = "https://www.globalsqa.com/angularJs-protractor/BankingProject/#/manager"
    )]
    manager_url: String,

    /// Only run tests carrying this tag (api, ui)
    #[arg(long)]
    tag: Option<String>,

    /// Only run the test with this name
    #[arg(long)]
    name: Option<String>,

    /// Output directory for report files
    #[arg(long, default_value = "allure-results")]
    results_dir: PathBuf,

    /// Bound for element and alert waits
    #[arg(long, default_value = "15")]
    wait_timeout_secs: u64,

    /// Selenium Grid hub host
    #[arg(long, env = "SELENIUM_HUB_HOST", default_value = "selenium-hub")]
    grid_host: String,

    /// Selenium Grid hub port
    #[arg(long, env = "SELENIUM_HUB_PORT", default_value = "4444")]
    grid_port: u16,

    /// Headless browser in remote mode
    #[arg(long, env = "HEADLESS", default_value = "false")]
    headless: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn harness_config(&self) -> anyhow::Result<HarnessConfig> {
        let mode: RunMode = self.mode.parse()?;
        let browser = BrowserKind::resolve(&self.browser, mode)?;
        Ok(HarnessConfig {
            app_url: self.app_url.clone(),
            browser,
            mode,
            local_driver_url: self.webdriver_url.clone(),
            grid_host: self.grid_host.clone(),
            grid_port: self.grid_port,
            headless: self.headless.eq_ignore_ascii_case("true"),
            manager_url: self.manager_url.clone(),
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            results_dir: self.results_dir.clone(),
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(cli.log_json.then(|| fmt::layer().json()))
        .with((!cli.log_json).then(fmt::layer))
        .with(filter)
        .init();

    info!("EntityQA v{}", entityqa_e2e::VERSION);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Run the selected tests; `Ok(false)` when any of them failed
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = cli.harness_config()?;

    let allure = AllureReporter::new(&config.results_dir)
        .with_context(|| format!("creating results dir {}", config.results_dir.display()))?;
    let reporter: SharedReporter = Arc::new(FanoutReporter::new(vec![
        Arc::new(TracingReporter::new()) as SharedReporter,
        Arc::new(allure) as SharedReporter,
    ]));

    let version_api = EntityApi::new(config.app_url.clone(), Arc::new(TracingReporter::new()));
    let environment = collect_environment(&config, &version_api).await;
    if let Err(e) = write_environment_file(&config.results_dir, &environment) {
        warn!("environment file not written: {}", e);
    }

    let runner = TestRunner::new(config, reporter);
    let cases = runner.select(cli.tag.as_deref(), cli.name.as_deref());
    if cases.is_empty() {
        anyhow::bail!("no tests match tag {:?} and name {:?}", cli.tag, cli.name);
    }

    let summary = runner.run_cases(&cases).await;
    runner.write_results(&summary)?;

    Ok(summary.all_passed())
}
