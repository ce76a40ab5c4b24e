//! Decision trace types.
//!
//! A [`Trace`] records, in chronological order, every decision step entered
//! during a run and every handler call made from within it. Entries are
//! append-only and only ever read for diagnostics.

use serde::Serialize;

use crate::machine::context::Context;
use crate::status::reason_phrase;

/// Point-in-time view of a context and the user state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub method: String,
    pub path: String,
    pub status: Option<u16>,
    pub finalized: bool,
    /// Metadata entries as `(key, Debug rendering)`.
    pub metadata: Vec<(&'static str, String)>,
    pub response_headers: Vec<(String, String)>,
    /// `Debug` rendering of the user state.
    pub state: String,
}

impl Snapshot {
    pub fn capture<S: std::fmt::Debug>(ctx: &Context, state: &S) -> Self {
        Self {
            method: ctx.request.method.to_string(),
            path: ctx.request.path.clone(),
            status: ctx.status().map(|s| s.as_u16()),
            finalized: ctx.is_finalized(),
            metadata: ctx.metadata.rendered(),
            response_headers: ctx
                .response
                .headers
                .iter()
                .map(|(k, v)| {
                    (
                        k.to_string(),
                        String::from_utf8_lossy(v.as_bytes()).into_owned(),
                    )
                })
                .collect(),
            state: format!("{:?}", state),
        }
    }
}

/// One handler invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Call {
    /// Resource name, or `defaults` when the fallback answered.
    pub implementation: String,
    pub handler: String,
    pub input: Snapshot,
    /// `Debug` rendering of the reply.
    pub reply: String,
    pub output: Snapshot,
}

/// A decision step and the calls it made.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub decision: &'static str,
    pub calls: Vec<Call>,
}

/// Chronological record of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trace {
    entries: Vec<Entry>,
}

impl Trace {
    pub(crate) fn enter(&mut self, decision: &'static str) {
        self.entries.push(Entry {
            decision,
            calls: Vec::new(),
        });
    }

    /// Attach a call to the step currently running.
    pub(crate) fn record(&mut self, call: Call) {
        match self.entries.last_mut() {
            Some(entry) => entry.calls.push(call),
            // Dispatch outside any decision step, e.g. from a test harness.
            None => self.entries.push(Entry {
                decision: "<none>",
                calls: vec![call],
            }),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Decision names in the order they were entered.
    pub fn decisions(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.decision).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A stored trace plus the outcome it led to, as served to diagnostics tools.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: uuid::Uuid,
    /// Client-supplied `x-request-id`, if any. Never used as a store key.
    pub request_id: Option<String>,
    pub status: Option<u16>,
    pub status_text: Option<&'static str>,
    pub trace: Trace,
}

impl RunReport {
    pub fn new(run_id: uuid::Uuid, status: Option<u16>, trace: Trace) -> Self {
        Self {
            run_id,
            request_id: None,
            status,
            status_text: status.and_then(reason_phrase),
            trace,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}
