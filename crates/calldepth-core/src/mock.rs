//! Recording handler for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::context::Context;
use crate::handler::{Handler, HandlerError};
use crate::level::Level;
use crate::record::{Record, Source};
use crate::value::{Attr, Value};

/// What a [`RecordingHandler`] saw for one `handle` call.
///
/// Attributes are flattened: group members appear as `group.key`, bound
/// attributes first, in the order they were added.
#[derive(Clone, Debug)]
pub struct CapturedRecord {
    /// Record timestamp.
    pub time: DateTime<Utc>,
    /// Record level.
    pub level: Level,
    /// Record message.
    pub message: String,
    /// Captured program counter, 0 when the walk came up short.
    pub pc: usize,
    /// Bound then record attributes, keys flattened.
    pub attrs: Vec<(String, Value)>,
    /// Whether the context handed to `handle` was already cancelled.
    pub context_cancelled: bool,
    /// Whether the context handed to `handle` carried a deadline.
    pub context_deadline: bool,
}

impl CapturedRecord {
    /// First attribute with the flattened `key`.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Flattened keys in order.
    pub fn keys(&self) -> Vec<&str> {
        self.attrs.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Resolves the captured call site.
    pub fn source(&self) -> Option<Source> {
        Source::resolve(self.pc)
    }
}

#[derive(Debug, Default)]
struct Sink {
    enabled_calls: AtomicUsize,
    handle_calls: AtomicUsize,
    records: Mutex<Vec<CapturedRecord>>,
}

/// Handler that counts calls and keeps every record it is given.
///
/// Clones and derived handlers share one sink, so the original handle can be
/// inspected after logging through a derived logger.
#[derive(Clone, Debug)]
pub struct RecordingHandler {
    sink: Arc<Sink>,
    min_level: Level,
    fail: bool,
    bound: Vec<(String, Value)>,
    groups: Vec<String>,
}

impl RecordingHandler {
    /// Enabled from DEBUG up, never fails.
    pub fn new() -> Self {
        Self {
            sink: Arc::new(Sink::default()),
            min_level: Level::DEBUG,
            fail: false,
            bound: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Reports levels below `level` as disabled.
    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Every `handle` call still records, then returns an error.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `enabled` calls across this handler and everything derived from it.
    pub fn enabled_calls(&self) -> usize {
        self.sink.enabled_calls.load(Ordering::Relaxed)
    }

    /// Number of `handle` calls, counted the same way.
    pub fn handle_calls(&self) -> usize {
        self.sink.handle_calls.load(Ordering::Relaxed)
    }

    /// Every record handled so far, oldest first.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.sink.records.lock().clone()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<CapturedRecord> {
        self.sink.records.lock().last().cloned()
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn flatten(prefix: &[String], attrs: &[Attr], out: &mut Vec<(String, Value)>) {
    for attr in attrs {
        match &attr.value {
            // Unnamed groups are inlined into the enclosing scope.
            Value::Group(members) if attr.key.is_empty() => flatten(prefix, members, out),
            Value::Group(members) => {
                let mut nested = prefix.to_vec();
                nested.push(attr.key.clone());
                flatten(&nested, members, out);
            }
            value => {
                let key = if prefix.is_empty() {
                    attr.key.clone()
                } else {
                    format!("{}.{}", prefix.join("."), attr.key)
                };
                out.push((key, value.clone()));
            }
        }
    }
}

impl Handler for RecordingHandler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        self.sink.enabled_calls.fetch_add(1, Ordering::Relaxed);
        level >= self.min_level
    }

    fn handle(&self, ctx: &Context, record: Record) -> Result<(), HandlerError> {
        self.sink.handle_calls.fetch_add(1, Ordering::Relaxed);

        let mut attrs = self.bound.clone();
        flatten(&self.groups, record.attrs(), &mut attrs);

        self.sink.records.lock().push(CapturedRecord {
            time: record.time(),
            level: record.level(),
            message: record.message().to_string(),
            pc: record.pc(),
            attrs,
            context_cancelled: ctx.is_cancelled(),
            context_deadline: ctx.deadline().is_some(),
        });

        if self.fail {
            return Err(HandlerError::Rejected("recording handler set to fail".into()));
        }
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        let mut derived = self.clone();
        flatten(&self.groups, &attrs, &mut derived.bound);
        Arc::new(derived)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut derived = self.clone();
        derived.groups.push(name.to_string());
        Arc::new(derived)
    }
}
