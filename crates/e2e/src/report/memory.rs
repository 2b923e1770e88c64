//! In-memory reporter

use parking_lot::Mutex;

use super::{Attachment, Label, Reporter, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    TestStarted {
        name: String,
        title: String,
        labels: Vec<Label>,
    },
    TestFinished {
        status: Status,
        message: Option<String>,
    },
    StepStarted(String),
    StepFinished(Status),
    Attached {
        name: String,
        attachment: Attachment,
    },
}

/// Records every event for later inspection
#[derive(Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    /// Names of all started steps, in order
    pub fn step_names(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::StepStarted(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Each step paired with the status it finished with
    pub fn step_outcomes(&self) -> Vec<(String, Status)> {
        let events = self.events.lock();
        let mut open: Vec<usize> = Vec::new();
        let mut outcomes: Vec<(String, Option<Status>)> = Vec::new();

        for event in events.iter() {
            match event {
                ReportEvent::StepStarted(name) => {
                    open.push(outcomes.len());
                    outcomes.push((name.clone(), None));
                }
                ReportEvent::StepFinished(status) => {
                    if let Some(idx) = open.pop() {
                        outcomes[idx].1 = Some(*status);
                    }
                }
                _ => {}
            }
        }

        outcomes
            .into_iter()
            .filter_map(|(name, status)| status.map(|s| (name, s)))
            .collect()
    }

    pub fn attachments_named(&self, name: &str) -> Vec<Attachment> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Attached { name: n, attachment } if n == name => Some(attachment.clone()),
                _ => None,
            })
            .collect()
    }

    /// Status of the most recently finished test
    pub fn last_test_status(&self) -> Option<Status> {
        self.events.lock().iter().rev().find_map(|e| match e {
            ReportEvent::TestFinished { status, .. } => Some(*status),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Reporter for MemoryReporter {
    fn start_test(&self, name: &str, title: &str, labels: &[Label]) {
        self.events.lock().push(ReportEvent::TestStarted {
            name: name.to_string(),
            title: title.to_string(),
            labels: labels.to_vec(),
        });
    }

    fn finish_test(&self, status: Status, message: Option<&str>) {
        self.events.lock().push(ReportEvent::TestFinished {
            status,
            message: message.map(String::from),
        });
    }

    fn start_step(&self, name: &str) {
        self.events.lock().push(ReportEvent::StepStarted(name.to_string()));
    }

    fn finish_step(&self, status: Status) {
        self.events.lock().push(ReportEvent::StepFinished(status));
    }

    fn attach(&self, name: &str, attachment: Attachment) {
        self.events.lock().push(ReportEvent::Attached {
            name: name.to_string(),
            attachment,
        });
    }
}
