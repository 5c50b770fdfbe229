//! Shared helpers for the deep-extend test suites.
//!
//! Keeps the behavioural tests terse: JSON-literal conversions into engine
//! values and a thread-safe call recorder for instrumenting handler
//! dispatch.

use std::sync::Arc;

use deep_extend::{Object, Value};
use parking_lot::Mutex;

/// Converts a JSON literal into an engine [`Value`].
#[must_use]
pub fn val(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Converts a JSON object literal into an [`Object`].
///
/// Non-object literals yield an empty object; tests that hit this have a
/// broken fixture and will fail on their own assertions.
#[must_use]
pub fn obj(json: serde_json::Value) -> Object {
    match Value::from(json) {
        Value::Object(o) => o,
        _ => Object::new(),
    }
}

/// Thread-safe append-only log for instrumenting handlers.
///
/// Clones share the same buffer, so a handler closure can record firings
/// while the test keeps a handle for assertions.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Fresh empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Snapshot of the recorded entries, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
