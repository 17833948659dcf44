//! Health check types.
//!
//! Results of `doctor`: a list of named checks, each with a severity.

use serde::Serialize;

/// Severity of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pass,
    /// Non-fatal; the project still works.
    Warning,
    /// Something is broken or unsafe.
    Error,
}

/// A single check result.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.name, self.message)
    }
}

/// Aggregated check results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    pub fn pass(&mut self, name: &'static str, message: impl Into<String>) {
        self.push(name, Severity::Pass, message, None);
    }

    pub fn warn(&mut self, name: &'static str, message: impl Into<String>, hint: Option<&str>) {
        self.push(name, Severity::Warning, message, hint);
    }

    pub fn error(&mut self, name: &'static str, message: impl Into<String>, hint: Option<&str>) {
        self.push(name, Severity::Error, message, hint);
    }

    fn push(
        &mut self,
        name: &'static str,
        severity: Severity,
        message: impl Into<String>,
        hint: Option<&str>,
    ) {
        self.checks.push(Check {
            name,
            severity,
            message: message.into(),
            hint: hint.map(str::to_string),
        });
    }

    /// Most severe result.
    pub fn worst(&self) -> Severity {
        self.checks
            .iter()
            .map(|c| c.severity)
            .max()
            .unwrap_or(Severity::Pass)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.checks.iter().filter(|c| c.severity == severity).count()
    }

    /// Process exit code: warnings are non-fatal.
    pub fn exit_code(&self) -> i32 {
        match self.worst() {
            Severity::Error => 1,
            Severity::Pass | Severity::Warning => 0,
        }
    }
}
