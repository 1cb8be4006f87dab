use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use sentry_core::protocol::{Context, Stacktrace, Value};
use serde::Serialize;

use crate::scope::Scope;

/// The key under which [`Field::error`] records its error.
pub const ERROR_KEY: &str = "error";

/// The key of scope-override fields created by [`with_scope`].
pub const SCOPE_KEY: &str = "_sentry_scope_";

/// An error attached to a log record.
///
/// Cloning is cheap; the error itself is shared.
#[derive(Clone)]
pub struct ErrorValue(Arc<dyn StdError + Send + Sync + 'static>);

impl ErrorValue {
    /// Wraps a boxed error.
    pub fn from_boxed(err: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        ErrorValue(Arc::from(err))
    }

    /// Wraps an [`anyhow::Error`], keeping its backtrace if one was captured.
    #[cfg(feature = "anyhow")]
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        use std::backtrace::BacktraceStatus;

        let stacktrace = match err.backtrace().status() {
            BacktraceStatus::Captured => {
                sentry_backtrace::parse_stacktrace(&format!("{:#}", err.backtrace()))
            }
            _ => None,
        };
        let boxed: Box<dyn StdError + Send + Sync + 'static> = err.into();
        ErrorValue::new(TracedError::with_stacktrace(boxed, stacktrace))
    }

    /// Wraps any error.
    pub fn new<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        ErrorValue(Arc::new(err))
    }

    /// The wrapped error, ready to walk its `source()` chain.
    pub fn as_error(&self) -> &(dyn StdError + 'static) {
        &*self.0
    }
}

impl<E: StdError + Send + Sync + 'static> From<E> for ErrorValue {
    fn from(err: E) -> Self {
        ErrorValue::new(err)
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// An error that carries the stack trace of the place it was created.
///
/// `Display`, `Debug` and `source()` are those of the wrapped error, so the
/// wrapper is invisible in reported exception chains except for the trace it
/// contributes.
///
/// # Examples
///
/// ```
/// use sentry_logcore::{Field, TracedError};
///
/// let field = Field::error(TracedError::new("connection reset"));
/// # let _ = field;
/// ```
pub struct TracedError {
    inner: Box<dyn StdError + Send + Sync + 'static>,
    stacktrace: Option<Stacktrace>,
}

impl TracedError {
    /// Wraps `err` and captures the current stack trace.
    pub fn new<E: Into<Box<dyn StdError + Send + Sync + 'static>>>(err: E) -> Self {
        TracedError::with_stacktrace(err, sentry_backtrace::current_stacktrace())
    }

    /// Wraps `err` with an already known stack trace.
    pub fn with_stacktrace<E: Into<Box<dyn StdError + Send + Sync + 'static>>>(
        err: E,
        stacktrace: Option<Stacktrace>,
    ) -> Self {
        TracedError {
            inner: err.into(),
            stacktrace,
        }
    }

    /// The trace captured for this error, if any.
    pub fn stacktrace(&self) -> Option<&Stacktrace> {
        self.stacktrace.as_ref()
    }

    /// The wrapped error.
    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }
}

impl fmt::Debug for TracedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for TracedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl StdError for TracedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// The payload of a [`Field`].
#[derive(Clone, Debug)]
pub enum FieldValue {
    /// Plain data, reported as extra data.
    Value(Value),
    /// An error; walked into the exception list.
    Error(ErrorValue),
    /// Several errors at once.
    Errors(Vec<ErrorValue>),
    /// Routes breadcrumbs and events of the logger to this scope.
    Scope(Arc<Scope>),
    /// Promoted into the event tags instead of extra data.
    Tag(String),
    /// Structured context handed to the sink as a [`Hint`](crate::Hint).
    Context(Context),
    /// The name of the logger, recorded when a name key is configured.
    LoggerName(String),
    /// Ignored.
    Skip,
}

/// A typed key/value pair attached to a log call or a logger.
#[derive(Clone, Debug)]
pub struct Field {
    /// The key of the field.
    pub key: String,
    /// What the field carries.
    pub value: FieldValue,
}

impl Field {
    /// Creates a plain data field.
    pub fn new<K: Into<String>, V: Into<Value>>(key: K, value: V) -> Self {
        Field {
            key: key.into(),
            value: FieldValue::Value(value.into()),
        }
    }

    /// Creates a data field from anything serializable.
    ///
    /// Serialization failures are recorded as the error message.
    pub fn serialize<K: Into<String>, T: Serialize + ?Sized>(key: K, value: &T) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|err| Value::String(err.to_string()));
        Field::new(key, value)
    }

    /// Creates an error field under the `error` key.
    pub fn error<E: Into<ErrorValue>>(err: E) -> Self {
        Field::named_error(ERROR_KEY, err)
    }

    /// Creates an error field under a custom key.
    pub fn named_error<K: Into<String>, E: Into<ErrorValue>>(key: K, err: E) -> Self {
        Field {
            key: key.into(),
            value: FieldValue::Error(err.into()),
        }
    }

    /// Creates a field carrying several errors.
    pub fn errors<K, I>(key: K, errs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator,
        I::Item: Into<ErrorValue>,
    {
        Field {
            key: key.into(),
            value: FieldValue::Errors(errs.into_iter().map(Into::into).collect()),
        }
    }

    /// Creates a logger name annotation.
    pub fn logger_name<N: Into<String>>(name: N) -> Self {
        Field {
            key: String::new(),
            value: FieldValue::LoggerName(name.into()),
        }
    }

    /// A field that does nothing.
    pub fn skip() -> Self {
        Field {
            key: String::new(),
            value: FieldValue::Skip,
        }
    }
}

/// Creates a field that becomes an event tag.
pub fn tag<K: Into<String>, V: Into<String>>(key: K, value: V) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Tag(value.into()),
    }
}

/// Creates a field carrying structured context for the sink.
pub fn context<K: Into<String>, C: Into<Context>>(key: K, context: C) -> Field {
    Field {
        key: key.into(),
        value: FieldValue::Context(context.into()),
    }
}

/// Creates a field that routes the logger to `scope`.
pub fn with_scope(scope: Arc<Scope>) -> Field {
    Field {
        key: SCOPE_KEY.into(),
        value: FieldValue::Scope(scope),
    }
}

/// Creates a field that routes the logger to a brand new scope.
///
/// Breadcrumbs recorded by the derived logger then stay local to it.
pub fn new_scope() -> Field {
    with_scope(Arc::new(Scope::new()))
}

/// An immutable map of accumulated values.
///
/// Extending a set returns a new one; the original keeps seeing exactly what
/// it saw before, no matter how many children derive from it.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSet<V> {
    map: Arc<BTreeMap<String, V>>,
}

impl<V> Default for FieldSet<V> {
    fn default() -> Self {
        FieldSet {
            map: Arc::new(BTreeMap::new()),
        }
    }
}

impl<V: Clone> FieldSet<V> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.map.iter()
    }

    /// Returns a new set with `entries` laid over this one.
    pub fn extend<I: IntoIterator<Item = (String, V)>>(&self, entries: I) -> FieldSet<V> {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return self.clone();
        }
        let mut map = self.map.clone();
        Arc::make_mut(&mut map).extend(entries);
        FieldSet { map }
    }

    /// Copies the entries into an owned map.
    pub fn to_map(&self) -> BTreeMap<String, V> {
        (*self.map).clone()
    }
}
