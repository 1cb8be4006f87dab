use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sentry_core::protocol::Thread;

use crate::accumulator::Accumulated;
use crate::config::Configuration;
use crate::converters::{breadcrumb_from_record, event_from_record};
use crate::error::Error;
use crate::exceptions::exceptions_from_errors;
use crate::field::Field;
use crate::frames::FrameFilter;
use crate::level::{Level, LevelGate};
use crate::scope::{resolve_scope, Scope};
use crate::sink::{Hint, Sink};

/// The error type cores report from writes and syncs.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// One log call: its level, message and time.
///
/// The fields of the call are passed next to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// The severity.
    pub level: Level,
    /// The log message.
    pub message: String,
    /// When the call happened.
    pub timestamp: SystemTime,
    /// The dot separated name of the logger, if it has one.
    pub logger_name: Option<String>,
}

impl Record {
    /// Creates a record stamped with the current time.
    pub fn new<M: Into<String>>(level: Level, message: M) -> Self {
        Record {
            level,
            message: message.into(),
            timestamp: SystemTime::now(),
            logger_name: None,
        }
    }

    /// Sets the logger name.
    #[must_use]
    pub fn with_logger_name<N: Into<String>>(mut self, name: N) -> Self {
        self.logger_name = Some(name.into());
        self
    }
}

/// A destination for log records.
///
/// Cores are immutable: [`with`](Core::with) returns a new core carrying the
/// additional fields and leaves the original untouched, so a core can be
/// shared by any number of threads and derived loggers.
pub trait Core: Send + Sync {
    /// Whether records at `level` are of interest at all.
    fn enabled(&self, level: Level) -> bool;

    /// Returns a core that attaches `fields` to everything it writes.
    fn with(self: Arc<Self>, fields: &[Field]) -> Arc<dyn Core>;

    /// Writes a record with the fields of this call.
    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), BoxError>;

    /// Flushes anything buffered.
    fn sync(&self) -> Result<(), BoxError>;
}

/// A core that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NopCore;

impl Core for NopCore {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn with(self: Arc<Self>, _fields: &[Field]) -> Arc<dyn Core> {
        self
    }

    fn write(&self, _record: &Record, _fields: &[Field]) -> Result<(), BoxError> {
        Ok(())
    }

    fn sync(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Fans records out to several cores.
///
/// Each core only sees the records it has enabled. Errors do not stop the
/// fan-out; the first one is returned after every core ran.
#[derive(Clone, Default)]
pub struct Tee(Vec<Arc<dyn Core>>);

impl Tee {
    /// Creates a tee over `cores`.
    pub fn new<I: IntoIterator<Item = Arc<dyn Core>>>(cores: I) -> Self {
        Tee(cores.into_iter().collect())
    }
}

impl fmt::Debug for Tee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tee").field(&self.0.len()).finish()
    }
}

impl Core for Tee {
    fn enabled(&self, level: Level) -> bool {
        self.0.iter().any(|core| core.enabled(level))
    }

    fn with(self: Arc<Self>, fields: &[Field]) -> Arc<dyn Core> {
        if fields.is_empty() {
            return self;
        }
        Arc::new(Tee(self.0.iter().map(|core| core.clone().with(fields)).collect()))
    }

    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), BoxError> {
        let mut result = Ok(());
        for core in self.0.iter().filter(|core| core.enabled(record.level)) {
            if let Err(err) = core.write(record, fields) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    fn sync(&self) -> Result<(), BoxError> {
        let mut result = Ok(());
        for core in &self.0 {
            if let Err(err) = core.sync() {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}

/// State shared by a core and everything derived from it.
struct Shared {
    cfg: Configuration,
    gate: LevelGate,
    frames: FrameFilter,
    max_breadcrumbs: usize,
    flush_timeout: Duration,
}

/// A core that reports records to Sentry.
///
/// Records at or above the configured level become events; with breadcrumbs
/// enabled, records at or above the breadcrumb level are added to the
/// resolved [`Scope`]. Fatal-class records flush the sink before the write
/// returns.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sentry_core::test::TestTransport;
/// use sentry_logcore::{client_from_client, new_scope, tag, Configuration, Field, Level, Logger, SentryCore};
///
/// let transport = TestTransport::new();
/// let client = sentry_core::Client::from(sentry_core::ClientOptions {
///     dsn: Some("https://public@sentry.invalid/1".parse().unwrap()),
///     transport: Some(Arc::new(transport.clone())),
///     ..Default::default()
/// });
/// let core = SentryCore::new(
///     Configuration::new(Level::Error).breadcrumbs(Level::Info),
///     client_from_client(client),
/// )
/// .unwrap();
///
/// let logger = Logger::new(core.into_core()).with(&[new_scope()]);
/// logger.info("loading config", &[]);
/// logger.error("something went wrong", &[Field::new("method", "unknown"), tag("service", "app")]);
///
/// let events = transport.fetch_and_clear_events();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].tags["service"], "app");
/// // the error record is a breadcrumb as well
/// assert_eq!(events[0].breadcrumbs.len(), 2);
/// ```
#[derive(Clone)]
pub struct SentryCore {
    sink: Arc<dyn Sink>,
    shared: Arc<Shared>,
    acc: Accumulated,
}

impl SentryCore {
    /// Creates a core, obtaining its sink from `factory`.
    pub fn new<F, S, E>(cfg: Configuration, factory: F) -> Result<Self, Error>
    where
        F: FnOnce() -> Result<S, E>,
        S: Sink + 'static,
        E: Into<BoxError>,
    {
        cfg.validate()?;
        let sink = factory().map_err(|err| Error::ClientFactory(err.into()))?;

        let breadcrumb_level = cfg.enable_breadcrumbs.then(|| cfg.breadcrumb_level.clone());
        let shared = Shared {
            gate: LevelGate::new(cfg.level.clone(), breadcrumb_level),
            frames: FrameFilter::new(cfg.frame_matcher.clone()),
            max_breadcrumbs: cfg.effective_max_breadcrumbs(),
            flush_timeout: cfg.effective_flush_timeout(),
            cfg,
        };
        sentry_debug!("[SentryCore] created with {:?}", shared.cfg);

        Ok(SentryCore {
            sink: Arc::new(sink),
            shared: Arc::new(shared),
            acc: Accumulated::default(),
        })
    }

    /// The sink events are captured with.
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// The configuration this core was created with.
    pub fn configuration(&self) -> &Configuration {
        &self.shared.cfg
    }

    /// Converts this core into a shareable trait object.
    pub fn into_core(self) -> Arc<dyn Core> {
        Arc::new(self)
    }

    /// Returns the core with `fields` folded in, unless there is nothing to fold.
    fn derive(&self, fields: &[Field]) -> Option<SentryCore> {
        let acc = self
            .acc
            .extend(fields, self.shared.cfg.effective_logger_name_key())?;
        Some(SentryCore {
            sink: self.sink.clone(),
            shared: self.shared.clone(),
            acc,
        })
    }

    /// The scope that receives this core's breadcrumbs and events.
    fn scope(&self) -> Arc<Scope> {
        resolve_scope(self.acc.scope.as_ref(), self.shared.cfg.scope.as_ref())
    }

    fn record_breadcrumb(&self, record: &Record) {
        if !self.shared.gate.records_breadcrumb(record.level) {
            return;
        }
        if self.shared.cfg.breadcrumbs_require_scope && self.acc.scope.is_none() {
            sentry_debug!("[SentryCore] no scope attached, dropping breadcrumb");
            return;
        }
        let breadcrumb = breadcrumb_from_record(record, self.acc.fields.to_map());
        self.scope().add_breadcrumb(breadcrumb, self.shared.max_breadcrumbs);
    }

    fn emit(&self, record: &Record) {
        let shared = &self.shared;
        let attach_stacktraces = !shared.cfg.disable_stacktrace;

        let mut event = event_from_record(record);
        event.extra = self.acc.fields.to_map();
        event.tags = shared.cfg.tags.clone();
        event
            .tags
            .extend(self.acc.tags.iter().map(|(key, value)| (key.clone(), value.clone())));
        event.exception = exceptions_from_errors(&self.acc.errors, attach_stacktraces, &shared.frames).into();

        if event.exception.is_empty() && attach_stacktraces && self.sink.attach_stacktrace() {
            if let Some(stacktrace) = shared.frames.current_stacktrace() {
                event.threads = vec![Thread {
                    stacktrace: Some(stacktrace),
                    current: true,
                    ..Default::default()
                }]
                .into();
            }
        }

        let hint = (!self.acc.contexts.is_empty()).then(|| Hint {
            contexts: self.acc.contexts.to_map(),
        });

        let event_id = self.sink.capture(event, hint.as_ref(), &self.scope());
        sentry_debug!("[SentryCore] captured event {}", event_id);
    }
}

impl fmt::Debug for SentryCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentryCore")
            .field("cfg", &self.shared.cfg)
            .field("fields", &self.acc.fields)
            .field("errors", &self.acc.errors.len())
            .field("scope", &self.acc.scope.is_some())
            .finish()
    }
}

impl Core for SentryCore {
    fn enabled(&self, level: Level) -> bool {
        self.shared.gate.should_handle(level)
    }

    fn with(self: Arc<Self>, fields: &[Field]) -> Arc<dyn Core> {
        match self.derive(fields) {
            Some(derived) => Arc::new(derived),
            None => self,
        }
    }

    fn write(&self, record: &Record, fields: &[Field]) -> Result<(), BoxError> {
        if !self.shared.gate.should_handle(record.level) {
            return Ok(());
        }

        let fields = match &record.logger_name {
            Some(name) if self.shared.cfg.effective_logger_name_key().is_some() => {
                let mut fields = fields.to_vec();
                fields.push(Field::logger_name(name.clone()));
                Cow::Owned(fields)
            }
            _ => Cow::Borrowed(fields),
        };
        let derived = self.derive(&fields);
        let snapshot = derived.as_ref().unwrap_or(self);

        snapshot.record_breadcrumb(record);
        if self.shared.gate.reports(record.level) {
            snapshot.emit(record);
        }

        if record.level.is_fatal() {
            return self.sync();
        }
        Ok(())
    }

    fn sync(&self) -> Result<(), BoxError> {
        if !self.sink.flush(self.shared.flush_timeout) {
            sentry_debug!(
                "[SentryCore] flush did not finish within {:?}",
                self.shared.flush_timeout
            );
        }
        Ok(())
    }
}

/// Creates a Sentry core as a trait object.
pub fn new_core<F, S, E>(cfg: Configuration, factory: F) -> Result<Arc<dyn Core>, Error>
where
    F: FnOnce() -> Result<S, E>,
    S: Sink + 'static,
    E: Into<BoxError>,
{
    SentryCore::new(cfg, factory).map(SentryCore::into_core)
}

/// Creates a Sentry core, falling back to a [`NopCore`] on failure.
///
/// The failure is logged, so the host can always build its logger pipeline.
pub fn new_core_or_nop<F, S, E>(cfg: Configuration, factory: F) -> Arc<dyn Core>
where
    F: FnOnce() -> Result<S, E>,
    S: Sink + 'static,
    E: Into<BoxError>,
{
    match new_core(cfg, factory) {
        Ok(core) => core,
        Err(err) => {
            log::warn!(target: "sentry", "events will not be reported: {}", err);
            Arc::new(NopCore)
        }
    }
}
