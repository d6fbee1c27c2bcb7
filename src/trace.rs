//! Emitted-event trace
//!
//! The trace is the ground truth compared against compiled execution. Events
//! recorded while a transaction runs are held back until the transaction
//! completes, so a failing transaction never leaves partial entries behind.

use serde_json::{json, Map, Value as JsonValue};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::interpreter::{InterpreterError, Value};

/// Convert an evaluated value to its trace representation
///
/// Integers that fit in 64 bits become JSON numbers, wider ones decimal strings.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Integer(integer) => {
            let raw = integer.value();
            if let Ok(small) = i64::try_from(raw) {
                JsonValue::from(small)
            } else if let Ok(unsigned) = u64::try_from(raw) {
                JsonValue::from(unsigned)
            } else {
                JsonValue::String(raw.to_string())
            }
        }
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Tuple(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
    }
}

/// One observed event with its arguments in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub event: String,
    pub args: Vec<(usize, Value)>,
}

impl EmittedEvent {
    pub fn new<S: Into<String>>(event: S) -> Self {
        Self {
            event: event.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, value: Value) -> Self {
        self.push_arg(value);
        self
    }

    /// Append the value for the next argument slot
    pub fn push_arg(&mut self, value: Value) {
        let slot = self.args.len();
        self.args.push((slot, value));
    }

    pub fn to_json(&self) -> JsonValue {
        let mut args = Map::new();
        for (slot, value) in &self.args {
            args.insert(slot.to_string(), value_to_json(value));
        }
        json!({
            "event": self.event,
            "args": args,
        })
    }
}

/// Ordered collection of emitted events
#[derive(Debug, Clone, Default)]
pub struct TraceSink {
    committed: Vec<EmittedEvent>,
    pending: Option<Vec<EmittedEvent>>,
}

impl TraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start buffering events for a transaction
    pub fn begin_transaction(&mut self) {
        self.pending = Some(Vec::new());
    }

    /// Record an event; buffered if a transaction is open
    pub fn record(&mut self, event: EmittedEvent) {
        match self.pending.as_mut() {
            Some(pending) => pending.push(event),
            None => self.committed.push(event),
        }
    }

    /// Append the open transaction's events to the trace
    pub fn commit_transaction(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.committed.extend(pending);
        }
    }

    /// Drop the open transaction's events; returns how many were dropped
    pub fn rollback_transaction(&mut self) -> usize {
        self.pending.take().map_or(0, |pending| pending.len())
    }

    /// Drop everything recorded so far
    pub fn discard(&mut self) {
        self.committed.clear();
        self.pending = None;
    }

    pub fn events(&self) -> &[EmittedEvent] {
        &self.committed
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.committed.iter().map(EmittedEvent::to_json).collect())
    }

    /// Write the committed events as one pretty-printed JSON document
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), InterpreterError> {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, &self.to_json())?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the trace to `path`, creating parent directories as needed
    pub fn write_to_path(&self, path: &Path) -> Result<(), InterpreterError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}

/// Render the trace to a string
pub fn render(sink: &TraceSink) -> io::Result<String> {
    let mut buffer = Vec::new();
    sink.write_to(&mut buffer)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
