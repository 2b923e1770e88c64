//! Test runner: selects cases, runs them one after another, aggregates results

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::report::{Attachment, SharedReporter, Status};
use crate::suites::{self, BrowserLauncher, TestCase, TestContext, WebDriverLauncher};

/// File the suite summary is written to
pub const RESULTS_FILE: &str = "test-results.json";

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub title: String,
    pub success: bool,
    pub status: Status,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running all selected tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub struct TestRunner {
    context: TestContext,
    cases: Vec<TestCase>,
    output_dir: PathBuf,
}

impl TestRunner {
    /// Runner over every known case, launching browsers over WebDriver
    pub fn new(config: HarnessConfig, reporter: SharedReporter) -> Self {
        Self::with_launcher(config, reporter, Arc::new(WebDriverLauncher))
    }

    pub fn with_launcher(
        config: HarnessConfig,
        reporter: SharedReporter,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        let output_dir = config.results_dir.clone();
        Self {
            context: TestContext::new(config, reporter, launcher),
            cases: suites::all_cases(),
            output_dir,
        }
    }

    /// Replace the case list
    pub fn with_cases(mut self, cases: Vec<TestCase>) -> Self {
        self.cases = cases;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.context.config
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub async fn run_all(&self) -> TestSuiteResult {
        let cases: Vec<&TestCase> = self.cases.iter().collect();
        self.run_cases(&cases).await
    }

    /// Run tests carrying `tag`
    pub async fn run_tagged(&self, tag: &str) -> TestSuiteResult {
        let cases: Vec<&TestCase> = self.cases.iter().filter(|c| c.has_tag(tag)).collect();
        self.run_cases(&cases).await
    }

    /// Run a specific test by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        let case = self
            .cases
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| E2eError::Config(format!("Test not found: {}", name)))?;
        Ok(self.run_case(case).await)
    }

    /// Cases matching the optional tag and name filters
    pub fn select(&self, tag: Option<&str>, name: Option<&str>) -> Vec<&TestCase> {
        self.cases
            .iter()
            .filter(|c| tag.map_or(true, |t| c.has_tag(t)))
            .filter(|c| name.map_or(true, |n| c.name == n))
            .collect()
    }

    pub async fn run_cases(&self, cases: &[&TestCase]) -> TestSuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(cases.len());
        let mut passed = 0;
        let mut failed = 0;
        let skipped = 0;

        info!("Running {} test(s)...", cases.len());

        for case in cases {
            let result = self.run_case(case).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            passed, failed, skipped, duration_ms
        );

        TestSuiteResult {
            total: cases.len(),
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    /// Run one case, reporting its start and outcome
    pub async fn run_case(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();
        let reporter = &self.context.reporter;
        let title = case.display_title(&self.context.config);
        debug!("Running test: {}", case.name);

        reporter.start_test(case.name, &title, &case.labels());
        let outcome = (case.body)(&self.context).await;
        let status = Status::of(&outcome);
        let error = outcome.err().map(|e| e.to_string());
        if let Some(message) = &error {
            reporter.attach("Exception Info", Attachment::text(message.as_str()));
        }
        reporter.finish_test(status, error.as_deref());

        TestResult {
            name: case.name.to_string(),
            title,
            success: status == Status::Passed,
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            error,
        }
    }

    /// Write the suite summary as JSON
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(RESULTS_FILE);
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
