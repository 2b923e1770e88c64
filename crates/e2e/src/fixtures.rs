//! Test-scoped resources
//!
//! Setup failures fail the test. Teardown is best-effort: failures are
//! attached to the report and logged, never returned.

use std::sync::Arc;

use tracing::{info, warn};

use entityqa_common::EntityData;

use crate::api::EntityApi;
use crate::config::{BrowserKind, HarnessConfig};
use crate::error::E2eResult;
use crate::pages::{BasePage, ManagerPage, WaitConfig};
use crate::report::{step, Attachment, SharedReporter, Status};
use crate::webdriver::{Capabilities, Driver, WebDriverSession};

/// API client bound to the configured base URL
pub fn api_client(config: &HarnessConfig, reporter: SharedReporter) -> EntityApi {
    reporter.start_step("Initialize API client");
    reporter.attach("Base URL", Attachment::text(config.app_url.clone()));
    reporter.finish_step(Status::Passed);
    EntityApi::new(config.app_url.clone(), reporter)
}

/// Entity created for the duration of one test
pub struct CreatedEntity {
    pub id: i64,
    pub data: EntityData,
}

impl CreatedEntity {
    pub async fn setup(api: &EntityApi, data: EntityData) -> E2eResult<Self> {
        let reporter = api.reporter().clone();
        step(&*reporter, "Setup: Create entity for testing", async {
            let id = api.create_entity(&data).await?;
            reporter.attach("Created Entity ID", Attachment::text(id.to_string()));
            Ok(Self { id, data })
        })
        .await
    }

    /// Delete the entity; failures are recorded and swallowed
    pub async fn teardown(self, api: &EntityApi) {
        let reporter = api.reporter();
        reporter.start_step(&format!("Teardown: Delete entity with ID {}", self.id));
        match api.delete_entity(self.id).await {
            Ok(status) => info!(id = self.id, status = status.as_u16(), "entity cleaned up"),
            Err(e) => {
                warn!(id = self.id, "entity cleanup failed: {}", e);
                reporter.attach("Exception during entity cleanup", Attachment::text(e.to_string()));
            }
        }
        reporter.finish_step(Status::Passed);
    }
}

/// Capabilities for the configured browser and mode
pub fn capabilities(config: &HarnessConfig) -> Capabilities {
    match config.effective_browser() {
        BrowserKind::Chrome => match config.mode {
            // local runs are always headless
            crate::config::RunMode::Local => Capabilities::chrome(true),
            crate::config::RunMode::Remote => Capabilities::chrome(config.headless),
        },
        BrowserKind::Firefox => Capabilities::firefox(config.headless),
    }
}

/// Browser session owned by one UI test
pub struct BrowserSession {
    driver: Arc<dyn Driver>,
    reporter: SharedReporter,
    wait: WaitConfig,
    manager_url: String,
}

impl BrowserSession {
    /// Connect to the local driver or the grid and maximize the window
    pub async fn open(config: &HarnessConfig, reporter: SharedReporter) -> E2eResult<Self> {
        let caps = capabilities(config);
        let session = WebDriverSession::connect(&config.driver_url(), &caps).await?;

        let description = format!(
            "Browser: {}\nMode: {}\n{}",
            caps.browser.display_name(),
            config.mode.as_str(),
            caps.describe()
        );
        reporter.attach("Browser Configuration", Attachment::text(description));

        let session = Self::with_driver(Arc::new(session), reporter, config);
        if let Err(e) = session.driver.maximize_window().await {
            // headless browsers may refuse to maximize
            warn!("maximize window failed: {}", e);
        }
        Ok(session)
    }

    /// Wrap an existing driver
    pub fn with_driver(driver: Arc<dyn Driver>, reporter: SharedReporter, config: &HarnessConfig) -> Self {
        Self {
            driver,
            reporter,
            wait: WaitConfig {
                timeout: config.wait_timeout,
                poll_interval: config.poll_interval,
            },
            manager_url: config.manager_url.clone(),
        }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn base_page(&self) -> BasePage {
        BasePage::new(self.driver.clone(), self.reporter.clone(), self.wait)
    }

    /// Manager screen page object, not yet navigated
    pub fn manager_page(&self) -> ManagerPage {
        ManagerPage::new(self.base_page(), self.manager_url.clone())
    }

    /// Attach a failure screenshot if needed and quit; errors are swallowed
    pub async fn close(self, failed: bool) {
        if failed {
            match self.driver.screenshot().await {
                Ok(png) => self.reporter.attach("failure_screenshot", Attachment::png(png)),
                Err(e) => warn!("failure screenshot not captured: {}", e),
            }
        }
        if let Err(e) = self.driver.quit().await {
            warn!("browser teardown failed: {}", e);
            self.reporter
                .attach("Exception during browser teardown", Attachment::text(e.to_string()));
        }
    }
}
