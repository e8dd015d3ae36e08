//! In-memory collaborators shared by unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::data::{FetchError, SeriesRecord, SeriesSource};
use crate::throttle::Throttle;

/// Ordered log of collaborator calls, shared between fakes
pub type EventLog = Arc<Mutex<Vec<String>>>;

fn log_event(log: &Option<EventLog>, event: String) {
    if let Some(log) = log {
        log.lock().expect("event log lock").push(event);
    }
}

/// Scripted series source that records which categories were requested
///
/// Categories without a script answer with an empty list. A category set
/// with `stalling_at` never answers; `stalled` fires once it is reached.
#[derive(Default)]
pub struct FakeSource {
    responses: HashMap<u32, Result<Vec<SeriesRecord>, u16>>,
    calls: Mutex<Vec<u32>>,
    events: Option<EventLog>,
    stall_at: Option<u32>,
    stalled: Notify,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(mut self, category_id: u32, records: Vec<SeriesRecord>) -> Self {
        self.responses.insert(category_id, Ok(records));
        self
    }

    /// Makes the category fail with the given API error code
    pub fn failing(mut self, category_id: u32, code: u16) -> Self {
        self.responses.insert(category_id, Err(code));
        self
    }

    pub fn logging_to(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    /// Makes the category hang forever instead of answering
    pub fn stalling_at(mut self, category_id: u32) -> Self {
        self.stall_at = Some(category_id);
        self
    }

    /// Resolves once the stalling category has been requested
    pub async fn stalled(&self) {
        self.stalled.notified().await;
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl SeriesSource for FakeSource {
    async fn fetch_by_category(&self, category_id: u32) -> Result<Vec<SeriesRecord>, FetchError> {
        self.calls.lock().expect("calls lock").push(category_id);
        log_event(&self.events, format!("fetch {}", category_id));
        if self.stall_at == Some(category_id) {
            self.stalled.notify_one();
            std::future::pending::<()>().await;
        }
        match self.responses.get(&category_id) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(code)) => Err(FetchError::Api {
                code: *code,
                message: "scripted failure".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Throttle that counts how often it was asked to pause, optionally
/// logging each pause
#[derive(Debug, Default)]
pub struct CountingThrottle {
    pauses: AtomicUsize,
    events: Option<EventLog>,
}

impl CountingThrottle {
    pub fn logging_to(events: EventLog) -> Self {
        Self {
            pauses: AtomicUsize::new(0),
            events: Some(events),
        }
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        log_event(&self.events, "pause".to_string());
    }
}

/// Minimal CSV reader for checking written output: handles quoted fields,
/// doubled quotes and newlines inside quotes.
pub fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
