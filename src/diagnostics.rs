use crate::registry::ModId;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Registry,
    GuiOrder,
    EnabledOrder,
    Blacklist,
    ImportList,
    ExportList,
    Signature,
    Request,
}

impl Document {
    pub fn label(self) -> &'static str {
        match self {
            Document::Registry => "mod registry",
            Document::GuiOrder => "GUI order",
            Document::EnabledOrder => "enabled order",
            Document::Blacklist => "ignore list",
            Document::ImportList => "import list",
            Document::ExportList => "export list",
            Document::Signature => "cache signature",
            Document::Request => "request",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    #[error("{document}: record `{record}` has no `{field}`")]
    MissingField {
        document: Document,
        record: String,
        field: &'static str,
    },
    #[error("{document}: record `{record}` has an invalid id `{value}`")]
    InvalidIdentifier {
        document: Document,
        record: String,
        value: String,
    },
    #[error("{document}: record `{record}` is malformed: {reason}")]
    MalformedRecord {
        document: Document,
        record: String,
        reason: String,
    },
    #[error("{document}: record `{record}` repeats id {id} (skipped)")]
    DuplicateRecord {
        document: Document,
        record: String,
        id: ModId,
    },
    #[error("{document}: `{reference}` does not match any mod in the registry")]
    UnresolvedReference {
        document: Document,
        reference: String,
    },
    #[error("import list not unique: {id} ({name}) appears more than once")]
    DuplicateInImport { id: ModId, name: String },
    #[error("{document}: {id} appears more than once in the order (skipped)")]
    DuplicateInOrder { document: Document, id: ModId },
    #[error("cannot import list, mod is missing from the current order: {id} ({name})")]
    NotInOrder { id: ModId, name: String },
    #[error("{document}: leaked element {id} ({name})")]
    LeakedElement {
        document: Document,
        id: ModId,
        name: String,
    },
    #[error("{document}: could not load: {reason}")]
    DocumentUnreadable { document: Document, reason: String },
    #[error("{document}: could not write: {reason}")]
    WriteFailed { document: Document, reason: String },
}

impl Issue {
    pub fn level(&self) -> LogLevel {
        match self {
            Issue::MissingField { .. } | Issue::UnresolvedReference { .. } => LogLevel::Warn,
            Issue::DuplicateInOrder { .. } | Issue::DuplicateRecord { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Partial<T> {
    pub value: T,
    pub issues: Vec<Issue>,
}

impl<T> Partial<T> {
    pub fn new(value: T, issues: Vec<Issue>) -> Self {
        Self { value, issues }
    }

    pub fn clean(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub issue: Option<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

pub fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<LogEntry>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_info(&mut self, message: String) {
        tracing::info!("{message}");
        self.entries.push(LogEntry {
            level: LogLevel::Info,
            message,
            issue: None,
        });
    }

    pub fn log_warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.entries.push(LogEntry {
            level: LogLevel::Warn,
            message,
            issue: None,
        });
    }

    pub fn log_error(&mut self, message: String) {
        tracing::error!("{message}");
        self.entries.push(LogEntry {
            level: LogLevel::Error,
            message,
            issue: None,
        });
    }

    pub fn report(&mut self, issue: Issue) {
        let level = issue.level();
        let message = issue.to_string();
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        self.entries.push(LogEntry {
            level,
            message,
            issue: Some(issue),
        });
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.report(issue);
        }
    }

    pub fn absorb<T>(&mut self, partial: Partial<T>) -> T {
        self.extend(partial.issues);
        partial.value
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.entries.iter().filter_map(|entry| entry.issue.as_ref())
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    pub fn text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("[{}] {}", log_level_label(entry.level), entry.message))
            .collect::<Vec<String>>()
            .join("\n")
    }
}
