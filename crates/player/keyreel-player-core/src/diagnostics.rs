//! Diagnostic channel for non-fatal faults (script errors, rejected properties,
//! skipped document entries).

use std::cell::RefCell;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::DiagnosticsCfg;
use crate::ids::ObjectKey;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSource {
    Load,
    Script,
    Property,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: DiagnosticSource,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectKey>,
}

impl Diagnostic {
    pub fn script(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            source: DiagnosticSource::Script,
            message: message.into(),
            frame: None,
            object: None,
        }
    }

    pub fn property(frame: u32, object: ObjectKey, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            source: DiagnosticSource::Property,
            message: message.into(),
            frame: Some(frame),
            object: Some(object),
        }
    }

    pub fn load(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            source: DiagnosticSource::Load,
            message: message.into(),
            frame: None,
            object: None,
        }
    }
}

/// Sink for diagnostics. Takes `&self` so it can be shared with script callbacks.
pub trait Diagnostics {
    fn report(&self, diagnostic: Diagnostic);
}

fn log_diagnostic(d: &Diagnostic) {
    let source = match d.source {
        DiagnosticSource::Load => "load",
        DiagnosticSource::Script => "script",
        DiagnosticSource::Property => "property",
    };
    match d.severity {
        Severity::Error => log::error!(target: "keyreel", "[{source}] {}", d.message),
        Severity::Warning => log::warn!(target: "keyreel", "[{source}] {}", d.message),
    }
}

/// Forwards every diagnostic to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        log_diagnostic(&diagnostic);
    }
}

/// Logs and retains diagnostics in a bounded ring.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    cfg: DiagnosticsCfg,
    records: RefCell<VecDeque<Diagnostic>>,
}

impl DiagnosticLog {
    pub fn new(cfg: DiagnosticsCfg) -> Self {
        Self {
            cfg,
            records: RefCell::new(VecDeque::new()),
        }
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().iter().cloned().collect()
    }

    pub fn count(&self, source: DiagnosticSource) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|d| d.source == source)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        self.records.borrow_mut().drain(..).collect()
    }
}

impl Diagnostics for DiagnosticLog {
    fn report(&self, diagnostic: Diagnostic) {
        log_diagnostic(&diagnostic);
        if !self.cfg.enabled || self.cfg.max_retained == 0 {
            return;
        }
        let mut records = self.records.borrow_mut();
        while records.len() >= self.cfg.max_retained {
            records.pop_front();
        }
        records.push_back(diagnostic);
    }
}
