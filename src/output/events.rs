//! Host event records
//!
//! Every observable step of an invocation becomes one [`Record`]. Records are sent
//! in the order they happen over an unbounded channel, so emitting never blocks
//! and never drops; the transport encoding (JSON lines) lives in `writer`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Log severity, named the way the host expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One record on the host event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Log {
        level: LogLevel,
        message: String,
    },
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    ValidationResult {
        valid: bool,
        message: String,
        #[serde(rename = "userInfo")]
        user_info: Option<serde_json::Value>,
    },
    Done {
        success: bool,
        count: usize,
        api_success: bool,
        api_message: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl Record {
    /// Returns true for records that end an invocation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Log { .. } => "log",
            Self::Progress { .. } => "progress",
            Self::ValidationResult { .. } => "validation_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Creates an emitter and the receiving end of its record stream
pub fn channel() -> (EventEmitter, mpsc::UnboundedReceiver<Record>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventEmitter {
            tx,
            terminated: Arc::new(Mutex::new(false)),
        },
        rx,
    )
}

/// Ordered, append-only producer of host records
///
/// Clones share one stream. Once a terminal record (`done` or `error`) has been
/// emitted, every later record is refused so the terminal record stays last.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<Record>,
    terminated: Arc<Mutex<bool>>,
}

impl EventEmitter {
    /// Appends a record, returning false if it was refused
    pub fn emit(&self, record: Record) -> bool {
        // Held across the send so no record can slip in behind a terminal one.
        let mut terminated = self.terminated.lock().unwrap_or_else(|e| e.into_inner());
        if *terminated {
            tracing::error!(
                "Refusing {} record after the terminal record: {:?}",
                record.kind(),
                record
            );
            return false;
        }

        *terminated = record.is_terminal();
        if self.tx.send(record).is_err() {
            tracing::warn!("Record stream receiver is closed");
            return false;
        }
        true
    }

    /// Returns true once a terminal record was emitted
    pub fn is_terminated(&self) -> bool {
        *self.terminated.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Emits a log record and mirrors it to tracing
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
        self.emit(Record::Log { level, message });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn progress(&self, current: usize, total: usize, message: impl Into<String>) {
        self.emit(Record::Progress {
            current,
            total,
            message: message.into(),
        });
    }

    pub fn validation_result(&self, valid: bool, message: impl Into<String>) {
        self.emit(Record::ValidationResult {
            valid,
            message: message.into(),
            user_info: None,
        });
    }

    /// Emits the terminal `error` record
    pub fn fail(&self, code: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        tracing::error!("{}: {}", code, message);
        self.emit(Record::Error {
            code: code.to_string(),
            message,
        })
    }
}
