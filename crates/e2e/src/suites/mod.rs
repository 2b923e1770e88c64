//! Test suites
//!
//! A [`TestCase`] is a named async body plus the labels the report needs.
//! Bodies receive a [`TestContext`] and build whatever fixtures they use from
//! it, so every test owns its API client or browser session.

pub mod api;
pub mod ui;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use entityqa_common::datagen::generate_entity_data;
use entityqa_common::EntityData;

use crate::api::EntityApi;
use crate::config::HarnessConfig;
use crate::error::E2eResult;
use crate::fixtures::{self, BrowserSession};
use crate::report::{Attachment, Label, SharedReporter, Status};

pub type CaseFuture<'a> = BoxFuture<'a, E2eResult<()>>;

pub type CaseBody = for<'a> fn(&'a TestContext) -> CaseFuture<'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Normal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Normal => "normal",
        }
    }
}

#[derive(Clone)]
pub struct TestCase {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tags: &'static [&'static str],
    pub epic: &'static str,
    pub feature: &'static str,
    pub story: &'static str,
    pub severity: Severity,
    pub body: CaseBody,
}

impl TestCase {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }

    /// Report title; UI tests carry the browser and mode
    pub fn display_title(&self, config: &HarnessConfig) -> String {
        if self.has_tag(ui::TAG) {
            format!(
                "{} - {} ({})",
                self.name,
                config.effective_browser().display_name(),
                config.mode.as_str()
            )
        } else {
            self.title.to_string()
        }
    }

    pub fn labels(&self) -> Vec<Label> {
        let mut labels = vec![
            Label::new("epic", self.epic),
            Label::new("feature", self.feature),
            Label::new("story", self.story),
            Label::new("severity", self.severity.as_str()),
        ];
        labels.extend(self.tags.iter().map(|t| Label::new("tag", *t)));
        labels
    }
}

/// Every case of every suite
pub fn all_cases() -> Vec<TestCase> {
    let mut cases = api::cases();
    cases.extend(ui::cases());
    cases
}

/// Opens browser sessions for UI tests
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &HarnessConfig, reporter: SharedReporter) -> E2eResult<BrowserSession>;
}

/// Launches real sessions over WebDriver
pub struct WebDriverLauncher;

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, config: &HarnessConfig, reporter: SharedReporter) -> E2eResult<BrowserSession> {
        BrowserSession::open(config, reporter).await
    }
}

/// What a test body gets to work with
pub struct TestContext {
    pub config: HarnessConfig,
    pub reporter: SharedReporter,
    pub launcher: Arc<dyn BrowserLauncher>,
}

impl TestContext {
    pub fn new(config: HarnessConfig, reporter: SharedReporter, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            reporter,
            launcher,
        }
    }

    pub fn api_client(&self) -> EntityApi {
        fixtures::api_client(&self.config, self.reporter.clone())
    }

    /// Fresh entity payload, attached to the report under `step_name`
    pub fn json_data(&self, step_name: &str) -> EntityData {
        self.reporter.start_step(step_name);
        let data = generate_entity_data();
        self.reporter
            .attach("Generated Test Data", Attachment::text(format!("{:?}", data)));
        self.reporter.finish_step(Status::Passed);
        data
    }

    pub async fn launch_browser(&self) -> E2eResult<BrowserSession> {
        self.launcher.launch(&self.config, self.reporter.clone()).await
    }
}
