use std::fmt::{self, Display, Formatter};
use std::sync::Mutex;

use spdlog::warn;

/// Non-fatal conditions a build reports and then moves past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Source file with missing or malformed front matter; left out of the build.
    IllegalSource,
    /// Post marked `draft: true`; left out of the build.
    Draft,
    /// Source file that could not be read at all.
    UnreadableSource,
    /// Output of a removed source could not be deleted.
    RemovalFailed,
    /// A template needed by the renderer is missing or broken.
    MissingTemplate,
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let desc = match self {
            ReportKind::IllegalSource => "illegal source file",
            ReportKind::Draft => "skipping draft",
            ReportKind::UnreadableSource => "unreadable source file",
            ReportKind::RemovalFailed => "failed to remove output",
            ReportKind::MissingTemplate => "template unavailable",
        };
        write!(f, "{}", desc)
    }
}

/// Sink for non-fatal build failures. Callers never look at a result.
pub trait Reporter: Send + Sync {
    fn report(&self, kind: ReportKind, subject: &str);
}

/// Default reporter: one warning line per report.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, kind: ReportKind, subject: &str) {
        warn!("{}: {}", kind, subject);
    }
}

/// Keeps every report in memory, for callers that want to inspect them
/// after the build.
#[derive(Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<(ReportKind, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(ReportKind, String)> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, kind: ReportKind) -> usize {
        self.reports().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, kind: ReportKind, subject: &str) {
        let mut reports = match self.reports.lock() {
            Ok(reports) => reports,
            Err(poisoned) => poisoned.into_inner(),
        };
        reports.push((kind, subject.to_string()));
    }
}
