//! W3C WebDriver client
//!
//! Page objects talk to the browser through the [`Driver`] trait.
//! [`WebDriverSession`] implements it over HTTP against chromedriver,
//! geckodriver or a Selenium Grid hub.

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::BrowserKind;
use crate::error::{E2eError, E2eResult};

/// Key under which W3C drivers return element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Element lookup strategy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(&'static str),
    XPath(&'static str),
    TagName(&'static str),
}

impl Locator {
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Css(_) => "css selector",
            Locator::XPath(_) => "xpath",
            Locator::TagName(_) => "tag name",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Locator::Css(v) | Locator::XPath(v) | Locator::TagName(v) => v,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.strategy(), self.value())
    }
}

/// Opaque reference to an element in the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// Browser operations used by the page objects
#[async_trait]
pub trait Driver: Send + Sync {
    async fn goto(&self, url: &str) -> E2eResult<()>;

    /// First match, or `None` when nothing matches
    async fn find_element(&self, locator: &Locator) -> E2eResult<Option<ElementRef>>;

    async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementRef>>;

    async fn find_child_elements(&self, parent: &ElementRef, locator: &Locator) -> E2eResult<Vec<ElementRef>>;

    async fn is_displayed(&self, element: &ElementRef) -> E2eResult<bool>;

    async fn is_enabled(&self, element: &ElementRef) -> E2eResult<bool>;

    async fn click(&self, element: &ElementRef) -> E2eResult<()>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()>;

    async fn text(&self, element: &ElementRef) -> E2eResult<String>;

    async fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>>;

    /// Text of the open alert, `None` when no alert is open
    async fn alert_text(&self) -> E2eResult<Option<String>>;

    async fn accept_alert(&self) -> E2eResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    async fn maximize_window(&self) -> E2eResult<()>;

    async fn quit(&self) -> E2eResult<()>;
}

/// `capabilities` payload for `POST /session`
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub browser: BrowserKind,
    pub args: Vec<String>,
    pub prefs: serde_json::Map<String, Value>,
    pub page_load_strategy: &'static str,
}

impl Capabilities {
    /// Chrome with the harness' standard flags
    pub fn chrome(headless: bool) -> Self {
        let mut args = Vec::new();
        if headless {
            args.push("--headless=new".to_string());
        }
        args.extend(
            [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-blink-features=AutomationControlled",
                "--ignore-certificate-errors",
                "--allow-insecure-localhost",
            ]
            .map(String::from),
        );
        Self {
            browser: BrowserKind::Chrome,
            args,
            prefs: serde_json::Map::new(),
            page_load_strategy: "eager",
        }
    }

    /// Firefox with downloads kept out of the way
    pub fn firefox(headless: bool) -> Self {
        let mut args = Vec::new();
        if headless {
            args.push("--headless".to_string());
        }
        args.extend(["--no-sandbox", "--disable-dev-shm-usage"].map(String::from));

        let mut prefs = serde_json::Map::new();
        prefs.insert("browser.download.folderList".to_string(), json!(2));
        prefs.insert("browser.download.manager.showWhenStarting".to_string(), json!(false));

        Self {
            browser: BrowserKind::Firefox,
            args,
            prefs,
            page_load_strategy: "eager",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut always_match = serde_json::Map::new();
        always_match.insert("browserName".to_string(), json!(self.browser.as_str()));
        always_match.insert("pageLoadStrategy".to_string(), json!(self.page_load_strategy));

        match self.browser {
            BrowserKind::Chrome => {
                always_match.insert("goog:chromeOptions".to_string(), json!({ "args": self.args }));
            }
            BrowserKind::Firefox => {
                always_match.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({ "args": self.args, "prefs": self.prefs }),
                );
            }
        }

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }

    /// Human-readable summary for the report
    pub fn describe(&self) -> String {
        format!("Options: {:?}", self.args)
    }
}

/// A live WebDriver session
pub struct WebDriverSession {
    http: reqwest::Client,
    session_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Open a new session at `server_url`
    pub async fn connect(server_url: &str, capabilities: &Capabilities) -> E2eResult<Self> {
        let http = reqwest::Client::new();
        let server_url = server_url.trim_end_matches('/');

        info!("Opening {} session at {}", capabilities.browser.as_str(), server_url);
        let value = call(&http, Method::POST, &format!("{}/session", server_url), Some(capabilities.to_json()))
            .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| protocol_error("new session response has no sessionId"))?
            .to_string();

        debug!(session_id = %session_id, "WebDriver session created");
        Ok(Self {
            http,
            session_url: format!("{}/session/{}", server_url, session_id),
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn cmd(&self, method: Method, path: &str, body: Option<Value>) -> E2eResult<Value> {
        call(&self.http, method, &format!("{}{}", self.session_url, path), body).await
    }

    async fn element_cmd(&self, method: Method, element: &ElementRef, path: &str, body: Option<Value>) -> E2eResult<Value> {
        self.cmd(method, &format!("/element/{}{}", element.0, path), body).await
    }
}

/// Perform one WebDriver call and unwrap its `value`
async fn call(http: &reqwest::Client, method: Method, url: &str, body: Option<Value>) -> E2eResult<Value> {
    let mut request = http.request(method, url);
    // POST commands need a JSON body even when they carry no parameters
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let payload: Value = response.json().await?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(E2eError::WebDriver { error, message })
}

fn protocol_error(message: &str) -> E2eError {
    E2eError::WebDriver {
        error: "protocol".to_string(),
        message: message.to_string(),
    }
}

fn is_error(e: &E2eError, kind: &str) -> bool {
    matches!(e, E2eError::WebDriver { error, .. } if error == kind)
}

fn element_ref(value: &Value) -> E2eResult<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| protocol_error("response is not an element reference"))
}

fn element_refs(value: &Value) -> E2eResult<Vec<ElementRef>> {
    value
        .as_array()
        .ok_or_else(|| protocol_error("response is not an element list"))?
        .iter()
        .map(element_ref)
        .collect()
}

fn locator_body(locator: &Locator) -> Value {
    json!({ "using": locator.strategy(), "value": locator.value() })
}

#[async_trait]
impl Driver for WebDriverSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.cmd(Method::POST, "/url", Some(json!({ "url": url }))).await?;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> E2eResult<Option<ElementRef>> {
        match self.cmd(Method::POST, "/element", Some(locator_body(locator))).await {
            Ok(value) => element_ref(&value).map(Some),
            Err(e) if is_error(&e, "no such element") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let value = self.cmd(Method::POST, "/elements", Some(locator_body(locator))).await?;
        element_refs(&value)
    }

    async fn find_child_elements(&self, parent: &ElementRef, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let value = self
            .element_cmd(Method::POST, parent, "/elements", Some(locator_body(locator)))
            .await?;
        element_refs(&value)
    }

    async fn is_displayed(&self, element: &ElementRef) -> E2eResult<bool> {
        let value = self.element_cmd(Method::GET, element, "/displayed", None).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementRef) -> E2eResult<bool> {
        let value = self.element_cmd(Method::GET, element, "/enabled", None).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: &ElementRef) -> E2eResult<()> {
        self.element_cmd(Method::POST, element, "/click", Some(json!({}))).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()> {
        self.element_cmd(Method::POST, element, "/value", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> E2eResult<String> {
        let value = self.element_cmd(Method::GET, element, "/text", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .element_cmd(Method::GET, element, &format!("/property/{}", name), None)
            .await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn alert_text(&self) -> E2eResult<Option<String>> {
        match self.cmd(Method::GET, "/alert/text", None).await {
            Ok(value) => Ok(Some(value.as_str().unwrap_or_default().to_string())),
            Err(e) if is_error(&e, "no such alert") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn accept_alert(&self) -> E2eResult<()> {
        self.cmd(Method::POST, "/alert/accept", Some(json!({}))).await?;
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let value = self.cmd(Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| protocol_error("screenshot is not a string"))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| protocol_error(&format!("screenshot is not base64: {}", e)))
    }

    async fn maximize_window(&self) -> E2eResult<()> {
        self.cmd(Method::POST, "/window/maximize", Some(json!({}))).await?;
        Ok(())
    }

    async fn quit(&self) -> E2eResult<()> {
        match self.cmd(Method::DELETE, "", None).await {
            Ok(_) => Ok(()),
            Err(E2eError::WebDriver { error, .. }) if error == "invalid session id" => {
                warn!(session_id = %self.session_id, "session already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_strategies() {
        assert_eq!(Locator::Css("a").strategy(), "css selector");
        assert_eq!(Locator::XPath("//a").strategy(), "xpath");
        assert_eq!(Locator::TagName("tr").strategy(), "tag name");
        assert_eq!(Locator::TagName("tr").to_string(), "(tag name, tr)");
    }

    #[test]
    fn test_chrome_capabilities() {
        let caps = Capabilities::chrome(true).to_json();
        let always = &caps["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "chrome");
        assert_eq!(always["pageLoadStrategy"], "eager");
        let args = always["goog:chromeOptions"]["args"].as_array().unwrap();
        assert_eq!(args[0], "--headless=new");
        assert!(args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn test_firefox_capabilities() {
        let caps = Capabilities::firefox(false).to_json();
        let options = &caps["capabilities"]["alwaysMatch"]["moz:firefoxOptions"];
        assert!(!options["args"].as_array().unwrap().iter().any(|a| a == "--headless"));
        assert_eq!(options["prefs"]["browser.download.folderList"], 2);
    }

    #[test]
    fn test_element_ref_parsing() {
        let value = json!([{ ELEMENT_KEY: "a" }, { ELEMENT_KEY: "b" }]);
        assert_eq!(
            element_refs(&value).unwrap(),
            vec![ElementRef("a".into()), ElementRef("b".into())]
        );
        assert!(element_ref(&json!({"other": 1})).is_err());
    }
}
