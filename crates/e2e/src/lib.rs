//! EntityQA end-to-end harness
//!
//! Drives an entity CRUD service over HTTP and the banking demo UI over
//! WebDriver, and records everything it does through a pluggable reporter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TestRunner (entityqa bin)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  suites::api  ── fixtures::api_client ──▶ EntityApi         │
//! │     │             fixtures::CreatedEntity                   │
//! │     └── validate / strip_ids (entityqa-common)              │
//! │                                                             │
//! │  suites::ui   ── fixtures::BrowserSession ──▶ dyn Driver    │
//! │     └── ManagerPage ─▶ AddCustomerPage / CustomersPage      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Reporter: tracing | Allure results | memory | fanout       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod pages;
pub mod report;
pub mod runner;
pub mod suites;
pub mod webdriver;

pub use api::{ApiResponse, EntityApi};
pub use config::{BrowserKind, HarnessConfig, RunMode};
pub use error::{E2eError, E2eResult};
pub use report::{Reporter, SharedReporter, Status};
pub use runner::{TestResult, TestRunner, TestSuiteResult};
pub use webdriver::{Driver, WebDriverSession};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
