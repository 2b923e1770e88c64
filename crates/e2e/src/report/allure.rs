//! Allure-compatible result files
//!
//! Each finished test becomes `<uuid>-result.json` in the results directory;
//! each attachment is written immediately as `<uuid>-attachment.<ext>` and
//! referenced from the step that was open when it arrived.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Attachment, Label, Reporter, Status};

#[derive(Debug, Clone, Serialize)]
struct AttachmentRef {
    name: String,
    source: String,
    #[serde(rename = "type")]
    mime: String,
}

#[derive(Debug, Clone, Serialize)]
struct StepNode {
    name: String,
    status: Status,
    stage: &'static str,
    start: i64,
    stop: i64,
    steps: Vec<StepNode>,
    attachments: Vec<AttachmentRef>,
}

impl StepNode {
    fn open(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: Status::Broken,
            stage: "running",
            start: Utc::now().timestamp_millis(),
            stop: 0,
            steps: Vec::new(),
            attachments: Vec::new(),
        }
    }

    fn close(&mut self, status: Status) {
        self.status = status;
        self.stage = "finished";
        self.stop = Utc::now().timestamp_millis();
    }
}

#[derive(Debug, Clone, Serialize)]
struct StatusDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestResultFile {
    uuid: String,
    history_id: String,
    name: String,
    full_name: String,
    status: Status,
    status_details: StatusDetails,
    stage: &'static str,
    start: i64,
    stop: i64,
    labels: Vec<Label>,
    steps: Vec<StepNode>,
    attachments: Vec<AttachmentRef>,
}

struct TestInProgress {
    uuid: Uuid,
    name: String,
    full_name: String,
    labels: Vec<Label>,
    start: i64,
    root: StepNode,
    open_steps: Vec<StepNode>,
}

impl TestInProgress {
    fn current(&mut self) -> &mut StepNode {
        self.open_steps.last_mut().unwrap_or(&mut self.root)
    }
}

/// Writes Allure result and attachment files
pub struct AllureReporter {
    results_dir: PathBuf,
    current: Mutex<Option<TestInProgress>>,
}

impl AllureReporter {
    /// Create the reporter, creating `results_dir` if needed
    pub fn new(results_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let results_dir = results_dir.into();
        std::fs::create_dir_all(&results_dir)?;
        Ok(Self {
            results_dir,
            current: Mutex::new(None),
        })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn write_attachment(&self, attachment: &Attachment) -> std::io::Result<String> {
        let source = format!("{}-attachment.{}", Uuid::new_v4(), attachment.kind.extension());
        std::fs::write(self.results_dir.join(&source), &attachment.body)?;
        Ok(source)
    }

    fn write_result(&self, result: &TestResultFile) -> std::io::Result<PathBuf> {
        let path = self.results_dir.join(format!("{}-result.json", result.uuid));
        let json = serde_json::to_vec_pretty(result)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

fn history_id(full_name: &str) -> String {
    hex::encode(Sha256::digest(full_name.as_bytes()))
}

impl Reporter for AllureReporter {
    fn start_test(&self, name: &str, title: &str, labels: &[Label]) {
        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            warn!(test = %previous.full_name, "test started before previous one finished; dropping it");
        }
        *current = Some(TestInProgress {
            uuid: Uuid::new_v4(),
            name: title.to_string(),
            full_name: name.to_string(),
            labels: labels.to_vec(),
            start: Utc::now().timestamp_millis(),
            root: StepNode::open(title),
            open_steps: Vec::new(),
        });
    }

    fn finish_test(&self, status: Status, message: Option<&str>) {
        let Some(mut test) = self.current.lock().take() else {
            warn!("finish_test without a running test");
            return;
        };

        // steps still open were interrupted by an error
        while let Some(mut step) = test.open_steps.pop() {
            step.close(Status::Broken);
            test.current().steps.push(step);
        }

        let result = TestResultFile {
            uuid: test.uuid.to_string(),
            history_id: history_id(&test.full_name),
            name: test.name,
            full_name: test.full_name,
            status,
            status_details: StatusDetails {
                message: message.map(String::from),
            },
            stage: "finished",
            start: test.start,
            stop: Utc::now().timestamp_millis(),
            labels: test.labels,
            steps: test.root.steps,
            attachments: test.root.attachments,
        };

        match self.write_result(&result) {
            Ok(path) => debug!("Allure result written to {}", path.display()),
            Err(e) => warn!("Failed to write Allure result: {}", e),
        }
    }

    fn start_step(&self, name: &str) {
        if let Some(test) = self.current.lock().as_mut() {
            test.open_steps.push(StepNode::open(name));
        }
    }

    fn finish_step(&self, status: Status) {
        if let Some(test) = self.current.lock().as_mut() {
            if let Some(mut step) = test.open_steps.pop() {
                step.close(status);
                test.current().steps.push(step);
            }
        }
    }

    fn attach(&self, name: &str, attachment: Attachment) {
        let source = match self.write_attachment(&attachment) {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to write attachment {}: {}", name, e);
                return;
            }
        };

        match self.current.lock().as_mut() {
            Some(test) => test.current().attachments.push(AttachmentRef {
                name: name.to_string(),
                source,
                mime: attachment.kind.mime().to_string(),
            }),
            None => debug!("attachment {} written outside a test as {}", name, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_results(dir: &Path) -> Vec<serde_json::Value> {
        let mut results = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.to_string_lossy().ends_with("-result.json") {
                let text = std::fs::read_to_string(&path).unwrap();
                results.push(serde_json::from_str(&text).unwrap());
            }
        }
        results
    }

    #[test]
    fn test_writes_nested_steps_and_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = AllureReporter::new(dir.path()).unwrap();

        reporter.start_test(
            "test_create_entity",
            "Create entity",
            &[Label::new("epic", "Entity API"), Label::new("severity", "critical")],
        );
        reporter.start_step("outer");
        reporter.start_step("inner");
        reporter.attach("Request Body", Attachment::json(&serde_json::json!({"a": 1})));
        reporter.finish_step(Status::Passed);
        reporter.finish_step(Status::Failed);
        reporter.finish_test(Status::Failed, Some("Expected ID 1, but got 2"));

        let results = read_results(dir.path());
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result["name"], "Create entity");
        assert_eq!(result["fullName"], "test_create_entity");
        assert_eq!(result["status"], "failed");
        assert_eq!(result["statusDetails"]["message"], "Expected ID 1, but got 2");
        assert_eq!(result["labels"][0]["name"], "epic");
        assert_eq!(result["historyId"].as_str().unwrap().len(), 64);

        let outer = &result["steps"][0];
        assert_eq!(outer["name"], "outer");
        assert_eq!(outer["status"], "failed");
        let inner = &outer["steps"][0];
        assert_eq!(inner["status"], "passed");
        let attachment = &inner["attachments"][0];
        assert_eq!(attachment["type"], "application/json");
        let source = attachment["source"].as_str().unwrap();
        assert!(dir.path().join(source).exists());
    }

    #[test]
    fn test_unfinished_steps_are_closed_broken() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = AllureReporter::new(dir.path()).unwrap();

        reporter.start_test("t", "t", &[]);
        reporter.start_step("a");
        reporter.start_step("b");
        reporter.finish_test(Status::Broken, None);

        let results = read_results(dir.path());
        let a = &results[0]["steps"][0];
        assert_eq!(a["name"], "a");
        assert_eq!(a["status"], "broken");
        assert_eq!(a["steps"][0]["name"], "b");
        assert!(results[0]["statusDetails"].get("message").is_none());
    }

    #[test]
    fn test_attachment_outside_test_is_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = AllureReporter::new(dir.path()).unwrap();
        reporter.attach("note", Attachment::text("hello"));

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert!(read_results(dir.path()).is_empty());
    }
}
