//! Compiler diagnostics.
//!
//! A failed compile yields [`Diagnostics`] instead of a manifest. The value
//! is broadcast to browsers as-is, so it serializes to the wire format:
//!
//! ```json
//! [{"severity":"error","message":"Unexpected token","sourceLocation":"src/app.js:3:7"}]
//! ```

use std::any::Any;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `path:line` or `path:line:col` at the start of a compiler output line.
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<loc>[^\s:]+(?::\d+){1,2}):?\s*(?P<rest>.*)$")
        .expect("location pattern is valid")
});

/// Leading severity label such as `error:` or `warning[E123]:`.
static SEVERITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:error|warning|warn)(?:\[[^\]]*\])?\s*:\s*")
        .expect("severity pattern is valid")
});

/// Longest message kept by [`Diagnostics::limited`], in characters.
const MAX_MESSAGE_CHARS: usize = 2000;

/// How many diagnostics of each severity reach browsers and the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticLimits {
    pub max_errors: usize,
    pub max_warnings: usize,
}

impl Default for DiagnosticLimits {
    fn default() -> Self {
        Self {
            max_errors: 10,
            max_warnings: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single compiler message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            source_location: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            source_location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.source_location = Some(location.into());
        self
    }

    /// Parse one line of compiler output.
    ///
    /// Lines mentioning `warning` are warnings, everything else is an error.
    fn parse_line(line: &str) -> Self {
        let severity = if line.to_ascii_lowercase().contains("warning") {
            Severity::Warning
        } else {
            Severity::Error
        };

        let (location, rest) = match LOCATION_RE.captures(line) {
            Some(caps) => (
                caps.name("loc").map(|m| m.as_str().to_string()),
                caps.name("rest").map_or("", |m| m.as_str()),
            ),
            None => (None, line.trim()),
        };

        let message = SEVERITY_RE.replace(rest, "").trim().to_string();
        let message = if message.is_empty() {
            line.trim().to_string()
        } else {
            message
        };

        Self {
            severity,
            message,
            source_location: location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.source_location {
            Some(location) => write!(f, "{label}: {} ({location})", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}

/// Ordered diagnostics from one failed compile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error diagnostic.
    pub fn single_error(message: impl Into<String>) -> Self {
        Self(vec![Diagnostic::error(message)])
    }

    /// Describe a compiler panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::single_error(format!("compiler crashed: {detail}"))
    }

    /// Parse raw compiler output, one diagnostic per non-empty line.
    pub fn parse_output(output: &str) -> Self {
        Self(
            output
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(Diagnostic::parse_line)
                .collect(),
        )
    }

    /// Keep the first `max_errors` errors and `max_warnings` warnings, in
    /// order, with over-long messages cut short.
    ///
    /// Anything dropped is summarized by one trailing warning. At least one
    /// error survives whenever there was one.
    pub fn limited(self, limits: DiagnosticLimits) -> Self {
        let max_errors = limits.max_errors.max(1);
        let (mut errors, mut warnings, mut hidden) = (0, 0, 0);

        let mut kept: Vec<Diagnostic> = Vec::new();
        for mut diagnostic in self.0 {
            let count = match diagnostic.severity {
                Severity::Error => &mut errors,
                Severity::Warning => &mut warnings,
            };
            let max = match diagnostic.severity {
                Severity::Error => max_errors,
                Severity::Warning => limits.max_warnings,
            };
            if *count >= max {
                hidden += 1;
                continue;
            }
            *count += 1;
            truncate_message(&mut diagnostic.message);
            kept.push(diagnostic);
        }

        if hidden > 0 {
            kept.push(Diagnostic::warning(format!(
                "{hidden} more diagnostic{} not shown",
                if hidden == 1 { "" } else { "s" }
            )));
        }
        Self(kept)
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Guarantee at least one error, appending `fallback` if there is none.
    ///
    /// A failed compile must never be reported as warnings only.
    pub fn ensure_error(mut self, fallback: impl Into<String>) -> Self {
        if !self.has_errors() {
            self.push(Diagnostic::error(fallback));
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.0.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.0.iter().find(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

fn truncate_message(message: &mut String) {
    if let Some((cut, _)) = message.char_indices().nth(MAX_MESSAGE_CHARS) {
        message.truncate(cut);
        message.push_str("…");
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.error_count();
        write!(
            f,
            "compile failed with {errors} error{}",
            if errors == 1 { "" } else { "s" }
        )?;
        let warnings = self.warning_count();
        if warnings > 0 {
            write!(
                f,
                " and {warnings} warning{}",
                if warnings == 1 { "" } else { "s" }
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}
