use std::fmt;
use std::sync::Arc;

use crate::core::{BoxError, Core, NopCore, Record, Tee};
use crate::field::Field;
use crate::level::Level;

/// A handle for writing records to a [`Core`].
///
/// Loggers are cheap to clone. [`with`](Logger::with) and
/// [`named`](Logger::named) return new loggers and leave `self` as it was.
#[derive(Clone)]
pub struct Logger {
    core: Arc<dyn Core>,
    name: Option<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(Arc::new(NopCore))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

impl Logger {
    /// Creates an unnamed logger writing to `core`.
    pub fn new(core: Arc<dyn Core>) -> Self {
        Logger { core, name: None }
    }

    /// The core this logger writes to.
    pub fn core(&self) -> &Arc<dyn Core> {
        &self.core
    }

    /// The logger name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns a logger writing to both the current core and `core`.
    ///
    /// This is how a Sentry core is attached to an existing logger without
    /// replacing its regular output.
    #[must_use]
    pub fn attach(&self, core: Arc<dyn Core>) -> Logger {
        Logger {
            core: Arc::new(Tee::new([self.core.clone(), core])),
            name: self.name.clone(),
        }
    }

    /// Returns a logger that adds `fields` to every record.
    #[must_use]
    pub fn with(&self, fields: &[Field]) -> Logger {
        Logger {
            core: self.core.clone().with(fields),
            name: self.name.clone(),
        }
    }

    /// Returns a logger with `name` appended to the current name.
    ///
    /// Names are joined with dots, so `named("db")` followed by
    /// `named("pool")` gives `db.pool`.
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let name = match &self.name {
            _ if name.is_empty() => self.name.clone(),
            Some(parent) => Some(format!("{}.{}", parent, name)),
            None => Some(name.to_owned()),
        };
        Logger {
            core: self.core.clone(),
            name,
        }
    }

    /// Whether records at `level` would be written anywhere.
    pub fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    /// Writes a record at `level`.
    ///
    /// Write errors are logged and otherwise ignored.
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if !self.core.enabled(level) {
            return;
        }
        let mut record = Record::new(level, message);
        record.logger_name = self.name.clone();
        if let Err(err) = self.core.write(&record, fields) {
            log::warn!(target: "sentry", "failed to write log record: {}", err);
        }
    }

    /// Writes a record at [`Level::Debug`].
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    /// Writes a record at [`Level::Info`].
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    /// Writes a record at [`Level::Warn`].
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    /// Writes a record at [`Level::Error`].
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    /// Writes a record at [`Level::Fatal`].
    ///
    /// Unlike other logging libraries this does not exit the process; it only
    /// waits for the Sentry core to flush.
    pub fn fatal(&self, message: &str, fields: &[Field]) {
        self.log(Level::Fatal, message, fields);
    }

    /// Flushes the underlying core.
    pub fn sync(&self) -> Result<(), BoxError> {
        self.core.sync()
    }
}
