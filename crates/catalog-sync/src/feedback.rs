use std::sync::Arc;

/// A leveled progress message emitted by the orchestrator and the import pipeline.
///
/// Messages go through a [`FeedbackSink`] rather than straight to a logger,
/// so callers decide how to present them (the CLI forwards to `tracing`,
/// tests record them, an execution journal may persist them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Informational message (progress, checkpoints).
    Info(String),
    /// Warning - the operation continued but something noteworthy occurred.
    Warning(String),
    /// Error - something failed (may or may not be fatal depending on context).
    Error(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info(_))
    }

    /// Lowercase level name, as stored in the execution journal.
    pub fn level(&self) -> &'static str {
        match self {
            Self::Info(_) => "info",
            Self::Warning(_) => "warning",
            Self::Error(_) => "error",
        }
    }

    /// Rebuild a message from a stored level name. Unknown levels read as info.
    pub fn from_level(level: &str, msg: impl Into<String>) -> Self {
        match level {
            "warning" => Self::warning(msg),
            "error" => Self::error(msg),
            _ => Self::info(msg),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) | Self::Error(msg) => msg,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Destination for [`Feedback`] messages.
pub trait FeedbackSink: Send + Sync {
    fn emit(&self, feedback: Feedback);
}

impl<T: FeedbackSink + ?Sized> FeedbackSink for Arc<T> {
    fn emit(&self, feedback: Feedback) {
        (**self).emit(feedback)
    }
}

/// Forwards feedback to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FeedbackSink for TracingSink {
    fn emit(&self, feedback: Feedback) {
        match &feedback {
            Feedback::Info(msg) => tracing::info!(target: "catalog_sync", "{msg}"),
            Feedback::Warning(msg) => tracing::warn!(target: "catalog_sync", "{msg}"),
            Feedback::Error(msg) => tracing::error!(target: "catalog_sync", "{msg}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn emit(&self, _feedback: Feedback) {}
}
