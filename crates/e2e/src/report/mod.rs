//! Reporting hooks
//!
//! Everything the harness wants to record (steps, request/response bodies,
//! screenshots) goes through a [`Reporter`]. The API client, page objects and
//! fixtures only see the trait, so the same code runs with tracing output,
//! Allure result files, or an in-memory recorder in tests.

mod allure;
mod environment;
mod memory;

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

pub use allure::AllureReporter;
pub use environment::{collect_environment, write_environment_file, ENVIRONMENT_FILE};
pub use memory::{MemoryReporter, ReportEvent};

/// Reporter shared between the components of one test
pub type SharedReporter = Arc<dyn Reporter>;

/// Outcome of a test or step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    /// An assertion did not hold
    Failed,
    /// The harness or the system under test errored
    Broken,
    Skipped,
}

impl Status {
    /// Classify a result the way report viewers expect
    pub fn of<T>(result: &E2eResult<T>) -> Self {
        match result {
            Ok(_) => Status::Passed,
            Err(e) if is_assertion(e) => Status::Failed,
            Err(_) => Status::Broken,
        }
    }
}

fn is_assertion(e: &E2eError) -> bool {
    matches!(
        e,
        E2eError::AssertionFailed(_)
            | E2eError::Common(entityqa_common::Error::IdentityMismatch(_))
            | E2eError::Common(entityqa_common::Error::Validation(_))
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Text,
    Json,
    Png,
}

impl AttachmentKind {
    pub fn mime(&self) -> &'static str {
        match self {
            AttachmentKind::Text => "text/plain",
            AttachmentKind::Json => "application/json",
            AttachmentKind::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AttachmentKind::Text => "txt",
            AttachmentKind::Json => "json",
            AttachmentKind::Png => "png",
        }
    }
}

/// Named payload attached to the current step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub body: Vec<u8>,
}

impl Attachment {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Text,
            body: body.into().into_bytes(),
        }
    }

    /// Pretty-printed JSON
    pub fn json(value: &serde_json::Value) -> Self {
        let body = serde_json::to_vec_pretty(value).unwrap_or_else(|_| value.to_string().into_bytes());
        Self {
            kind: AttachmentKind::Json,
            body,
        }
    }

    pub fn png(body: Vec<u8>) -> Self {
        Self {
            kind: AttachmentKind::Png,
            body,
        }
    }

    /// Body as text, lossy for binary attachments
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Report label (`epic`, `feature`, `story`, `severity`, `tag`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Observer for test progress
pub trait Reporter: Send + Sync {
    fn start_test(&self, _name: &str, _title: &str, _labels: &[Label]) {}

    fn finish_test(&self, _status: Status, _message: Option<&str>) {}

    fn start_step(&self, name: &str);

    fn finish_step(&self, status: Status);

    fn attach(&self, name: &str, attachment: Attachment);
}

/// Run `fut` as a named step
pub async fn step<T, F>(reporter: &dyn Reporter, name: impl Into<String>, fut: F) -> E2eResult<T>
where
    F: Future<Output = E2eResult<T>>,
{
    let name = name.into();
    reporter.start_step(&name);
    let result = fut.await;
    reporter.finish_step(Status::of(&result));
    result
}

/// Logs progress through `tracing`
#[derive(Default)]
pub struct TracingReporter {
    steps: Mutex<Vec<String>>,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for TracingReporter {
    fn start_test(&self, name: &str, title: &str, _labels: &[Label]) {
        info!(test = name, "{}", title);
    }

    fn finish_test(&self, status: Status, message: Option<&str>) {
        match status {
            Status::Passed | Status::Skipped => debug!(?status, "test finished"),
            _ => warn!(?status, message = message.unwrap_or_default(), "test finished"),
        }
    }

    fn start_step(&self, name: &str) {
        let mut steps = self.steps.lock();
        debug!(depth = steps.len(), "step: {}", name);
        steps.push(name.to_string());
    }

    fn finish_step(&self, status: Status) {
        let name = self.steps.lock().pop().unwrap_or_default();
        if status != Status::Passed {
            warn!(?status, "step failed: {}", name);
        }
    }

    fn attach(&self, name: &str, attachment: Attachment) {
        match attachment.kind {
            AttachmentKind::Png => debug!(bytes = attachment.body.len(), "attachment {}", name),
            _ => debug!("attachment {}: {}", name, attachment.as_text()),
        }
    }
}

/// Forwards every event to several reporters
pub struct FanoutReporter {
    reporters: Vec<SharedReporter>,
}

impl FanoutReporter {
    pub fn new(reporters: Vec<SharedReporter>) -> Self {
        Self { reporters }
    }
}

impl Reporter for FanoutReporter {
    fn start_test(&self, name: &str, title: &str, labels: &[Label]) {
        for r in &self.reporters {
            r.start_test(name, title, labels);
        }
    }

    fn finish_test(&self, status: Status, message: Option<&str>) {
        for r in &self.reporters {
            r.finish_test(status, message);
        }
    }

    fn start_step(&self, name: &str) {
        for r in &self.reporters {
            r.start_step(name);
        }
    }

    fn finish_step(&self, status: Status) {
        for r in &self.reporters {
            r.finish_step(status);
        }
    }

    fn attach(&self, name: &str, attachment: Attachment) {
        for r in &self.reporters {
            r.attach(name, attachment.clone());
        }
    }
}
