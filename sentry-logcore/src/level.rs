use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Arc;

/// The severity of a log record.
///
/// Everything above [`Level::Error`] is considered fatal-class: reporting
/// such a record flushes the sink before the log call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum Level {
    /// Verbose output, usually disabled in production.
    Debug = -1,
    /// The default level.
    #[default]
    Info = 0,
    /// More important than info, but no human needs to look at it.
    Warn = 1,
    /// High priority. An application running smoothly shouldn't log these.
    Error = 2,
    /// Particularly important errors.
    DPanic = 3,
    /// A record logged right before panicking.
    Panic = 4,
    /// A record logged right before the process exits.
    Fatal = 5,
}

impl Level {
    /// Returns the lowercase name of the level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::DPanic => "dpanic",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Whether a record at this level may be followed by process termination.
    pub fn is_fatal(self) -> bool {
        self > Level::Error
    }

    fn from_i8(value: i8) -> Level {
        match value {
            i8::MIN..=-1 => Level::Debug,
            0 => Level::Info,
            1 => Level::Warn,
            2 => Level::Error,
            3 => Level::DPanic,
            4 => Level::Panic,
            _ => Level::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized level: {0:?}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warn" | "warning" => Level::Warn,
            "error" => Level::Error,
            "dpanic" => Level::DPanic,
            "panic" => Level::Panic,
            "fatal" => Level::Fatal,
            _ => return Err(ParseLevelError(s.to_owned())),
        })
    }
}

/// Decides whether records of a given level are enabled.
pub trait LevelEnabler: Send + Sync {
    /// The current minimum enabled level.
    fn level(&self) -> Level;

    /// Checks if a record at `level` passes this threshold.
    fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }
}

impl LevelEnabler for Level {
    fn level(&self) -> Level {
        *self
    }
}

/// A threshold that can be changed at runtime.
///
/// Clones share the same underlying level, so calling
/// [`set_level`](Self::set_level) on one immediately affects every core
/// configured with another clone.
#[derive(Clone)]
pub struct AtomicLevel(Arc<AtomicI8>);

impl AtomicLevel {
    /// Creates a new atomic level starting at `level`.
    pub fn new(level: Level) -> Self {
        AtomicLevel(Arc::new(AtomicI8::new(level as i8)))
    }

    /// Changes the threshold for all clones.
    pub fn set_level(&self, level: Level) {
        self.0.store(level as i8, Ordering::Relaxed);
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        AtomicLevel::new(Level::default())
    }
}

impl fmt::Debug for AtomicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicLevel").field(&self.level()).finish()
    }
}

impl LevelEnabler for AtomicLevel {
    fn level(&self) -> Level {
        Level::from_i8(self.0.load(Ordering::Relaxed))
    }
}

/// Converts a [`Level`] to a Sentry [`Level`](sentry_core::Level).
pub fn convert_level(level: Level) -> sentry_core::Level {
    match level {
        Level::Debug => sentry_core::Level::Debug,
        Level::Info => sentry_core::Level::Info,
        Level::Warn => sentry_core::Level::Warning,
        Level::Error => sentry_core::Level::Error,
        Level::DPanic | Level::Panic | Level::Fatal => sentry_core::Level::Fatal,
    }
}

/// Admission check done before any payload is built.
///
/// The report and breadcrumb legs are exposed separately so the writer can
/// evaluate them on their own once a record made it through.
#[derive(Clone)]
pub(crate) struct LevelGate {
    level: Arc<dyn LevelEnabler>,
    breadcrumb_level: Option<Arc<dyn LevelEnabler>>,
}

impl LevelGate {
    pub fn new(level: Arc<dyn LevelEnabler>, breadcrumb_level: Option<Arc<dyn LevelEnabler>>) -> Self {
        LevelGate {
            level,
            breadcrumb_level,
        }
    }

    pub fn should_handle(&self, level: Level) -> bool {
        self.reports(level) || self.records_breadcrumb(level)
    }

    pub fn reports(&self, level: Level) -> bool {
        self.level.enabled(level)
    }

    pub fn records_breadcrumb(&self, level: Level) -> bool {
        self.breadcrumb_level
            .as_ref()
            .is_some_and(|breadcrumbs| breadcrumbs.enabled(level))
    }
}
