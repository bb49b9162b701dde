//! Leveled diagnostics sink for a composition run.
//!
//! Recoverable problems (unresolved sprite references, duplicate names,
//! unused sprites) are reported here instead of aborting the run. The
//! reporter remembers the highest severity observed so the caller can pick
//! an exit status, and optionally aborts on the first error.

use std::fmt;

use crate::error::{ComposeError, Result};
use crate::output::Printer;

/// Severity level for a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Collects and prints diagnostic events for one run.
///
/// Events below `min_level` are counted but not printed. With `fail_fast`,
/// the first error-severity event turns into a fatal [`ComposeError::Aborted`]
/// that the caller propagates with `?`.
pub struct Reporter {
    printer: Printer,
    min_level: Severity,
    fail_fast: bool,
    max_seen: Option<Severity>,
    warnings: usize,
    errors: usize,
}

impl Reporter {
    pub fn new(min_level: Severity, fail_fast: bool) -> Self {
        Self {
            printer: Printer::new(),
            min_level,
            fail_fast,
            max_seen: None,
            warnings: 0,
            errors: 0,
        }
    }

    /// Report an informational event.
    pub fn info(&mut self, message: &str) {
        self.observe(Severity::Info);
        if self.min_level <= Severity::Info {
            self.printer.info("Info", message);
        }
    }

    /// Report a warning.
    pub fn warning(&mut self, message: &str) {
        self.observe(Severity::Warning);
        self.warnings += 1;
        if self.min_level <= Severity::Warning {
            self.printer.warning("Warning", message);
        }
    }

    /// Report a recoverable error.
    ///
    /// Returns `Err(Aborted)` in fail-fast mode so the run unwinds before
    /// any output is written.
    pub fn error(&mut self, message: &str) -> Result<()> {
        self.observe(Severity::Error);
        self.errors += 1;
        self.printer.error("Error", message);
        if self.fail_fast {
            return Err(ComposeError::Aborted);
        }
        Ok(())
    }

    /// The highest severity reported so far, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.max_seen
    }

    /// Whether any error-severity event was reported.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    fn observe(&mut self, severity: Severity) {
        self.max_seen = Some(match self.max_seen {
            Some(current) => current.max(severity),
            None => severity,
        });
    }
}
