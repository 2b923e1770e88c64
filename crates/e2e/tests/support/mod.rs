//! Fakes for integration tests
//!
//! `FakeEntityService` serves the entity API from memory on a random port.
//! `FakeBank` is a `Driver` that emulates the banking demo manager screens.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use entityqa_e2e::config::HarnessConfig;
use entityqa_e2e::error::{E2eError, E2eResult};
use entityqa_e2e::fixtures::BrowserSession;
use entityqa_e2e::pages::{AddCustomerPage, CustomersPage, ManagerPage};
use entityqa_e2e::report::SharedReporter;
use entityqa_e2e::suites::BrowserLauncher;
use entityqa_e2e::webdriver::{Driver, ElementRef, Locator};

// ---------------------------------------------------------------------------
// Entity service
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ServiceState {
    next_id: i64,
    pub entities: BTreeMap<i64, Value>,
    pub version: Option<String>,
    /// Status returned by create instead of storing the entity
    pub create_status: Option<u16>,
    /// Shift the top-level id of every read by this amount
    pub id_skew: i64,
    /// Ignore updates while still answering 204
    pub drop_updates: bool,
}

type Shared = Arc<Mutex<ServiceState>>;

pub struct FakeEntityService {
    pub base_url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl FakeEntityService {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServiceState {
            next_id: 1,
            version: Some("1.4.2\n".to_string()),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/api/create", post(create))
            .route("/api/get/:id", get(get_one))
            .route("/api/getAll", get(get_all))
            .route("/api/patch/:id", patch(update))
            .route("/api/delete/:id", delete(remove))
            .route("/api/version", get(version))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            app_url: self.base_url.clone(),
            ..fast_config()
        }
    }

    pub fn count(&self) -> usize {
        self.state.lock().entities.len()
    }
}

impl Drop for FakeEntityService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Store a payload the way the service does: ids at every level
fn stored(id: i64, payload: &Value) -> Value {
    let mut entity = payload.clone();
    entity["id"] = json!(id);
    entity["addition"]["id"] = json!(id * 100);
    entity
}

async fn create(State(state): State<Shared>, Json(payload): Json<Value>) -> Response {
    let mut state = state.lock();
    if let Some(code) = state.create_status {
        return (StatusCode::from_u16(code).unwrap(), "create refused").into_response();
    }
    let id = state.next_id;
    state.next_id += 1;
    state.entities.insert(id, stored(id, &payload));
    id.to_string().into_response()
}

async fn get_one(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = state.lock();
    match state.entities.get(&id) {
        Some(entity) => {
            let mut entity = entity.clone();
            entity["id"] = json!(id + state.id_skew);
            Json(entity).into_response()
        }
        None => (StatusCode::NOT_FOUND, "entity not found").into_response(),
    }
}

async fn get_all(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock();
    let entities: Vec<Value> = state.entities.values().cloned().collect();
    Json(json!({ "entity": entities, "page": 1, "perPage": 10 }))
}

async fn update(State(state): State<Shared>, Path(id): Path<i64>, Json(payload): Json<Value>) -> StatusCode {
    let mut state = state.lock();
    if !state.entities.contains_key(&id) {
        return StatusCode::NOT_FOUND;
    }
    if !state.drop_updates {
        state.entities.insert(id, stored(id, &payload));
    }
    StatusCode::NO_CONTENT
}

async fn remove(State(state): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    match state.lock().entities.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn version(State(state): State<Shared>) -> Response {
    match state.lock().version.clone() {
        Some(v) => v.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Config with short waits so failing tests finish quickly
pub fn fast_config() -> HarnessConfig {
    HarnessConfig {
        wait_timeout: Duration::from_millis(300),
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Banking demo
// ---------------------------------------------------------------------------

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Manager,
    AddCustomer,
    Customers,
}

#[derive(Debug, Clone)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub post_code: String,
}

#[derive(Debug)]
pub struct BankState {
    screen: Screen,
    pub visited: Vec<String>,
    first_name: String,
    last_name: String,
    post_code: String,
    pub customers: Vec<Customer>,
    sort_descending: Option<bool>,
    alert: Option<String>,
    next_customer_id: u32,
    /// Alert shown instead of the success message
    pub rejection: Option<String>,
    pub screenshots: usize,
    pub quit: bool,
}

pub struct FakeBank {
    pub state: Mutex<BankState>,
}

impl FakeBank {
    pub fn new() -> Arc<Self> {
        let customers = [
            ("Hermoine", "Granger", "E859AB"),
            ("Harry", "Potter", "E725JB"),
            ("Ron", "Weasly", "E55555"),
            ("Albus", "Dumbledore", "E55656"),
            ("Neville", "Longbottom", "E89898"),
        ]
        .into_iter()
        .map(|(f, l, p)| Customer {
            first_name: f.to_string(),
            last_name: l.to_string(),
            post_code: p.to_string(),
        })
        .collect();

        Arc::new(Self {
            state: Mutex::new(BankState {
                screen: Screen::Blank,
                visited: Vec::new(),
                first_name: String::new(),
                last_name: String::new(),
                post_code: String::new(),
                customers,
                sort_descending: None,
                alert: None,
                next_customer_id: 6,
                rejection: None,
                screenshots: 0,
                quit: false,
            }),
        })
    }

    pub fn customer_names(&self) -> Vec<String> {
        self.state.lock().customers.iter().map(|c| c.first_name.clone()).collect()
    }

    pub fn reject_with(&self, alert: &str) {
        self.state.lock().rejection = Some(alert.to_string());
    }

    pub fn is_quit(&self) -> bool {
        self.state.lock().quit
    }
}

impl BankState {
    /// Customers in table order
    fn displayed(&self) -> Vec<Customer> {
        let mut rows = self.customers.clone();
        match self.sort_descending {
            Some(true) => rows.sort_by_cached_key(|c| std::cmp::Reverse(c.first_name.to_lowercase())),
            Some(false) => rows.sort_by_cached_key(|c| c.first_name.to_lowercase()),
            None => {}
        }
        rows
    }

    fn input(&mut self, element: &str) -> Option<&mut String> {
        match element {
            "input:first" => Some(&mut self.first_name),
            "input:last" => Some(&mut self.last_name),
            "input:post" => Some(&mut self.post_code),
            _ => None,
        }
    }

    fn lookup(&self, locator: &Locator) -> Option<&'static str> {
        let on = |screen: Screen| self.screen == screen;
        let found = if *locator == ManagerPage::ADD_CUSTOMER_BUTTON {
            ("btn:add", self.screen != Screen::Blank)
        } else if *locator == ManagerPage::CUSTOMERS_BUTTON {
            ("btn:customers", self.screen != Screen::Blank)
        } else if *locator == AddCustomerPage::FIRST_NAME_INPUT {
            ("input:first", on(Screen::AddCustomer))
        } else if *locator == AddCustomerPage::LAST_NAME_INPUT {
            ("input:last", on(Screen::AddCustomer))
        } else if *locator == AddCustomerPage::POST_CODE_INPUT {
            ("input:post", on(Screen::AddCustomer))
        } else if *locator == AddCustomerPage::ADD_CUSTOMER_BUTTON {
            ("btn:submit", on(Screen::AddCustomer))
        } else if *locator == CustomersPage::SORT_BY_NAME_BUTTON {
            ("btn:sort", on(Screen::Customers))
        } else if *locator == CustomersPage::CUSTOMERS_TABLE {
            ("table", on(Screen::Customers))
        } else {
            return None;
        };
        found.1.then_some(found.0)
    }

    fn submit(&mut self) {
        if let Some(rejection) = self.rejection.clone() {
            self.alert = Some(rejection);
            return;
        }
        let id = self.next_customer_id;
        self.next_customer_id += 1;
        self.customers.push(Customer {
            first_name: std::mem::take(&mut self.first_name),
            last_name: std::mem::take(&mut self.last_name),
            post_code: std::mem::take(&mut self.post_code),
        });
        self.alert = Some(format!("Customer added successfully with customer id :{}", id));
    }

    fn delete_displayed(&mut self, index: usize) {
        let displayed = self.displayed();
        if let Some(target) = displayed.get(index) {
            if let Some(pos) = self.customers.iter().position(|c| {
                c.first_name == target.first_name && c.post_code == target.post_code
            }) {
                self.customers.remove(pos);
            }
        }
    }
}

fn unknown(element: &ElementRef) -> E2eError {
    E2eError::WebDriver {
        error: "no such element".to_string(),
        message: format!("unknown element {}", element.0),
    }
}

fn index_after(element: &ElementRef, prefix: &str) -> Option<usize> {
    element.0.strip_prefix(prefix)?.parse().ok()
}

#[async_trait]
impl Driver for FakeBank {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        state.visited.push(url.to_string());
        state.screen = Screen::Manager;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> E2eResult<Option<ElementRef>> {
        let state = self.state.lock();
        Ok(state.lookup(locator).map(|id| ElementRef(id.to_string())))
    }

    async fn find_elements(&self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let state = self.state.lock();
        if *locator == CustomersPage::DELETE_BUTTONS {
            if state.screen != Screen::Customers {
                return Ok(Vec::new());
            }
            let count = state.customers.len();
            return Ok((0..count).map(|i| ElementRef(format!("delete:{}", i))).collect());
        }
        Ok(state
            .lookup(locator)
            .map(|id| vec![ElementRef(id.to_string())])
            .unwrap_or_default())
    }

    async fn find_child_elements(&self, parent: &ElementRef, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let state = self.state.lock();
        if parent.0 == "table" && *locator == CustomersPage::TABLE_ROWS {
            // header row plus one row per customer
            let rows = state.customers.len() + 1;
            return Ok((0..rows).map(|i| ElementRef(format!("row:{}", i))).collect());
        }
        if let (Some(row), true) = (index_after(parent, "row:"), *locator == CustomersPage::TABLE_COLUMNS) {
            if row == 0 {
                return Ok(Vec::new());
            }
            return Ok((0..5).map(|c| ElementRef(format!("cell:{}:{}", row - 1, c))).collect());
        }
        Ok(Vec::new())
    }

    async fn is_displayed(&self, _element: &ElementRef) -> E2eResult<bool> {
        Ok(true)
    }

    async fn is_enabled(&self, _element: &ElementRef) -> E2eResult<bool> {
        Ok(true)
    }

    async fn click(&self, element: &ElementRef) -> E2eResult<()> {
        let mut state = self.state.lock();
        match element.0.as_str() {
            "btn:add" => state.screen = Screen::AddCustomer,
            "btn:customers" => {
                state.screen = Screen::Customers;
                state.sort_descending = None;
            }
            "btn:submit" => state.submit(),
            // first click sorts descending, then the order flips
            "btn:sort" => state.sort_descending = Some(!state.sort_descending.unwrap_or(false)),
            other => match index_after(element, "delete:") {
                Some(i) => state.delete_displayed(i),
                None if other.starts_with("input:") => {}
                None => return Err(unknown(element)),
            },
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> E2eResult<()> {
        let mut state = self.state.lock();
        let input = state.input(&element.0).ok_or_else(|| unknown(element))?;
        input.push_str(text);
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> E2eResult<String> {
        let state = self.state.lock();
        let cell = element
            .0
            .strip_prefix("cell:")
            .and_then(|rest| rest.split_once(':'))
            .and_then(|(r, c)| Some((r.parse::<usize>().ok()?, c.parse::<usize>().ok()?)));
        let Some((row, column)) = cell else {
            return Err(unknown(element));
        };
        let displayed = state.displayed();
        let customer = displayed.get(row).ok_or_else(|| unknown(element))?;
        Ok(match column {
            0 => customer.first_name.clone(),
            1 => customer.last_name.clone(),
            2 => customer.post_code.clone(),
            3 => String::new(),
            _ => "Delete".to_string(),
        })
    }

    async fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>> {
        let mut state = self.state.lock();
        if name != "value" {
            return Ok(None);
        }
        Ok(state.input(&element.0).map(|v| v.clone()))
    }

    async fn alert_text(&self) -> E2eResult<Option<String>> {
        Ok(self.state.lock().alert.clone())
    }

    async fn accept_alert(&self) -> E2eResult<()> {
        match self.state.lock().alert.take() {
            Some(_) => Ok(()),
            None => Err(E2eError::WebDriver {
                error: "no such alert".to_string(),
                message: "no alert open".to_string(),
            }),
        }
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        self.state.lock().screenshots += 1;
        Ok(PNG_MAGIC.to_vec())
    }

    async fn maximize_window(&self) -> E2eResult<()> {
        Ok(())
    }

    async fn quit(&self) -> E2eResult<()> {
        self.state.lock().quit = true;
        Ok(())
    }
}

/// Hands every UI test the same fake bank
pub struct FakeLauncher {
    pub bank: Arc<FakeBank>,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, config: &HarnessConfig, reporter: SharedReporter) -> E2eResult<BrowserSession> {
        Ok(BrowserSession::with_driver(self.bank.clone(), reporter, config))
    }
}
