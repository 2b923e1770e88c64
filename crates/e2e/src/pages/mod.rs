//! Page objects for the banking demo manager screens
//!
//! ```text
//! ManagerPage ──click_add_customer()──▶ AddCustomerPage
//!      │
//!      └──────click_customers()───────▶ CustomersPage
//! ```
//!
//! Every page wraps a [`BasePage`] bound to the same browser session.
//! Interactions wait, polling at a fixed interval, until the target element is
//! clickable; running out of time is a hard `Timeout` error.

mod add_customer;
mod customers;
mod manager;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::report::{step, Attachment, SharedReporter};
use crate::webdriver::{Driver, ElementRef, Locator};

pub use add_customer::AddCustomerPage;
pub use customers::{index_nearest_average_length, sorted_descending_ci, CustomersPage};
pub use manager::ManagerPage;

/// Bounds for element and alert waits
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Shared browser plumbing for all pages
#[derive(Clone)]
pub struct BasePage {
    driver: Arc<dyn Driver>,
    reporter: SharedReporter,
    wait: WaitConfig,
}

impl BasePage {
    pub fn new(driver: Arc<dyn Driver>, reporter: SharedReporter, wait: WaitConfig) -> Self {
        Self { driver, reporter, wait }
    }

    pub fn driver(&self) -> &dyn Driver {
        &*self.driver
    }

    pub fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    /// Run `fut` as a reported step
    pub async fn step<T>(&self, name: impl Into<String>, fut: impl Future<Output = E2eResult<T>>) -> E2eResult<T> {
        step(&*self.reporter, name, fut).await
    }

    /// Call `poll` until it yields a value or the wait bound runs out
    pub async fn wait_until<T, F, Fut>(&self, what: impl Into<String>, mut poll: F) -> E2eResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = E2eResult<Option<T>>>,
    {
        let start = Instant::now();
        loop {
            if let Some(value) = poll().await? {
                return Ok(value);
            }
            if start.elapsed() >= self.wait.timeout {
                return Err(E2eError::Timeout(format!(
                    "{} after {:?}",
                    what.into(),
                    self.wait.timeout
                )));
            }
            tokio::time::sleep(self.wait.poll_interval).await;
        }
    }

    /// Wait for the element to be present
    pub async fn find_element(&self, locator: &Locator) -> E2eResult<ElementRef> {
        self.step(format!("Find element with locator: {}", locator), async {
            self.wait_until(format!("element {}", locator), || self.driver.find_element(locator))
                .await
        })
        .await
    }

    pub async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        self.step(format!("Find elements with locator: {}", locator), async {
            self.driver.find_elements(locator).await
        })
        .await
    }

    /// Wait until the element is displayed and enabled
    pub async fn wait_clickable(&self, locator: &Locator) -> E2eResult<ElementRef> {
        self.wait_until(format!("element {} to be clickable", locator), || {
            self.clickable(locator)
        })
        .await
    }

    async fn clickable(&self, locator: &Locator) -> E2eResult<Option<ElementRef>> {
        let Some(element) = self.driver.find_element(locator).await? else {
            return Ok(None);
        };
        let ready = async {
            Ok::<_, E2eError>(
                self.driver.is_displayed(&element).await? && self.driver.is_enabled(&element).await?,
            )
        };
        match ready.await {
            Ok(true) => Ok(Some(element)),
            Ok(false) => Ok(None),
            // the page re-rendered between lookup and check
            Err(E2eError::WebDriver { error, .. }) if error == "stale element reference" => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn click_element(&self, locator: &Locator) -> E2eResult<()> {
        self.step(format!("Click element with locator: {}", locator), async {
            let element = self.wait_clickable(locator).await?;
            self.driver.click(&element).await
        })
        .await
    }

    pub async fn input_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.step(
            format!("Input text: '{}' into element with locator: {}", text, locator),
            async {
                let element = self.wait_clickable(locator).await?;
                self.driver.send_keys(&element, text).await
            },
        )
        .await
    }

    /// Current `value` of an input
    pub async fn get_element_value(&self, locator: &Locator) -> E2eResult<Option<String>> {
        self.step(format!("Get value from element with locator: {}", locator), async {
            let element = self.find_element(locator).await?;
            self.driver.property(&element, "value").await
        })
        .await
    }

    /// Wait for an alert, read its text and accept it
    pub async fn wait_for_alert_and_accept(&self) -> E2eResult<String> {
        self.step("Wait for alert, get text and accept", async {
            let text = self
                .wait_until("alert to be present", || self.driver.alert_text())
                .await?;
            self.driver.accept_alert().await?;
            debug!(alert = %text, "alert accepted");
            Ok(text)
        })
        .await
    }

    pub async fn take_screenshot(&self, name: &str) -> E2eResult<()> {
        self.step("Take screenshot", async {
            let png = self.driver.screenshot().await?;
            self.reporter.attach(name, Attachment::png(png));
            Ok(())
        })
        .await
    }
}
