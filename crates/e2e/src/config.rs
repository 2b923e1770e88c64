//! Harness configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::E2eError;

/// Browser requested for UI tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
        }
    }

    /// Name used in report titles
    pub fn display_name(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "Chrome",
            BrowserKind::Firefox => "Firefox",
        }
    }

    /// Browser for `mode`; only remote mode rejects unknown names
    pub fn resolve(name: &str, mode: RunMode) -> Result<Self, E2eError> {
        match mode {
            RunMode::Local => Ok(name.parse().unwrap_or_default()),
            RunMode::Remote => name.parse(),
        }
    }
}

impl FromStr for BrowserKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(E2eError::Config(format!("Unsupported browser: {}", other))),
        }
    }
}

/// Where the browser runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Local driver process; always headless Chrome
    #[default]
    Local,
    /// Selenium Grid hub
    Remote,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Local => "local",
            RunMode::Remote => "remote",
        }
    }
}

impl FromStr for RunMode {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // anything other than "remote" runs locally
        if s.eq_ignore_ascii_case("remote") {
            Ok(RunMode::Remote)
        } else {
            Ok(RunMode::Local)
        }
    }
}

/// Complete harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the entity API
    pub app_url: String,

    /// Browser for UI tests
    pub browser: BrowserKind,

    /// Local or remote browser
    pub mode: RunMode,

    /// WebDriver endpoint used in local mode
    pub local_driver_url: String,

    /// Selenium Grid hub host (remote mode)
    pub grid_host: String,

    /// Selenium Grid hub port (remote mode)
    pub grid_port: u16,

    /// Headless browser in remote mode
    pub headless: bool,

    /// Banking demo manager screen
    pub manager_url: String,

    /// Bound for element and alert waits
    pub wait_timeout: Duration,

    /// Poll interval for element and alert waits
    pub poll_interval: Duration,

    /// Output directory for report files
    pub results_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:8080".to_string(),
            browser: BrowserKind::Chrome,
            mode: RunMode::Local,
            local_driver_url: "http://localhost:9515".to_string(),
            grid_host: "selenium-hub".to_string(),
            grid_port: 4444,
            headless: false,
            manager_url: "https://www.globalsqa.com/angularJs-protractor/BankingProject/#/manager"
                .to_string(),
            wait_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(1),
            results_dir: PathBuf::from("allure-results"),
        }
    }
}

impl HarnessConfig {
    /// Selenium Grid endpoint
    pub fn grid_url(&self) -> String {
        format!("http://{}:{}/wd/hub", self.grid_host, self.grid_port)
    }

    /// WebDriver endpoint for the configured mode
    pub fn driver_url(&self) -> String {
        match self.mode {
            RunMode::Local => self.local_driver_url.clone(),
            RunMode::Remote => self.grid_url(),
        }
    }

    /// Browser actually launched: local mode always runs Chrome
    pub fn effective_browser(&self) -> BrowserKind {
        match self.mode {
            RunMode::Local => BrowserKind::Chrome,
            RunMode::Remote => self.browser,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_parse() {
        assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!("firefox".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        let err = "safari".parse::<BrowserKind>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: Unsupported browser: safari");
    }

    #[test]
    fn test_browser_resolve_by_mode() {
        assert_eq!(BrowserKind::resolve("safari", RunMode::Local).unwrap(), BrowserKind::Chrome);
        assert_eq!(BrowserKind::resolve("firefox", RunMode::Local).unwrap(), BrowserKind::Firefox);
        assert_eq!(BrowserKind::resolve("FIREFOX", RunMode::Remote).unwrap(), BrowserKind::Firefox);
        assert!(matches!(
            BrowserKind::resolve("safari", RunMode::Remote),
            Err(E2eError::Config(_))
        ));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("REMOTE".parse::<RunMode>().unwrap(), RunMode::Remote);
        assert_eq!("local".parse::<RunMode>().unwrap(), RunMode::Local);
        assert_eq!("other".parse::<RunMode>().unwrap(), RunMode::Local);
    }

    #[test]
    fn test_driver_url_by_mode() {
        let mut config = HarnessConfig {
            grid_host: "hub".into(),
            grid_port: 5555,
            browser: BrowserKind::Firefox,
            ..Default::default()
        };
        assert_eq!(config.driver_url(), "http://localhost:9515");
        assert_eq!(config.effective_browser(), BrowserKind::Chrome);

        config.mode = RunMode::Remote;
        assert_eq!(config.driver_url(), "http://hub:5555/wd/hub");
        assert_eq!(config.effective_browser(), BrowserKind::Firefox);
    }
}
