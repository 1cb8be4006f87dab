use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use sentry_core::protocol::{Context, Event, Map};
use sentry_core::types::Uuid;
use sentry_core::{Client, ClientOptions};

use crate::scope::Scope;

/// Per-call data handed to the sink next to the event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hint {
    /// Structured context collected from [`context`](crate::context) fields.
    pub contexts: Map<String, Context>,
}

/// Where assembled events end up.
///
/// This is implemented for the Sentry [`Client`]. Delivery problems are the
/// sink's business: `capture` returns the event id (nil when the event was
/// dropped) and `flush` only reports whether it finished in time.
pub trait Sink: Send + Sync {
    /// Captures an event together with the scope it belongs to.
    fn capture(&self, event: Event<'static>, hint: Option<&Hint>, scope: &Scope) -> Uuid;

    /// Blocks until buffered events are sent or `timeout` passes.
    fn flush(&self, timeout: Duration) -> bool;

    /// Whether events without exceptions should carry the current stack trace.
    fn attach_stacktrace(&self) -> bool {
        true
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn capture(&self, event: Event<'static>, hint: Option<&Hint>, scope: &Scope) -> Uuid {
        (**self).capture(event, hint, scope)
    }

    fn flush(&self, timeout: Duration) -> bool {
        (**self).flush(timeout)
    }

    fn attach_stacktrace(&self) -> bool {
        (**self).attach_stacktrace()
    }
}

impl Sink for Client {
    fn capture(&self, event: Event<'static>, hint: Option<&Hint>, scope: &Scope) -> Uuid {
        let mut event = scope.apply_to_event(event);
        if let Some(hint) = hint {
            for (key, context) in &hint.contexts {
                event
                    .contexts
                    .entry(key.clone())
                    .or_insert_with(|| context.clone());
            }
        }
        self.capture_event(event, None)
    }

    fn flush(&self, timeout: Duration) -> bool {
        Client::flush(self, Some(timeout))
    }

    fn attach_stacktrace(&self) -> bool {
        self.options().attach_stacktrace
    }
}

/// A factory that hands out an already existing sink.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sentry_logcore::{client_from_client, Configuration, SentryCore};
///
/// let client = Arc::new(sentry_core::Client::from(sentry_core::ClientOptions::default()));
/// let core = SentryCore::new(Configuration::default(), client_from_client(client)).unwrap();
/// # let _ = core;
/// ```
pub fn client_from_client<S: Sink>(sink: S) -> impl FnOnce() -> Result<S, Infallible> {
    move || Ok(sink)
}

/// A factory that creates a [`Client`] from options.
///
/// The options need a transport for events to go anywhere; see
/// [`client_from_dsn`](crate::client_from_dsn) for one that sets up the
/// default HTTP transport.
pub fn client_from_options<O: Into<ClientOptions>>(options: O) -> impl FnOnce() -> Result<Client, Infallible> {
    move || Ok(Client::from(options.into()))
}

/// A factory that creates a [`Client`] sending to `dsn` over HTTP.
#[cfg(feature = "transport")]
pub fn client_from_dsn<D: sentry_core::IntoDsn>(
    dsn: D,
) -> impl FnOnce() -> Result<Client, sentry_core::types::ParseDsnError> {
    move || {
        let dsn = dsn.into_dsn()?;
        Ok(Client::from(ClientOptions {
            dsn,
            transport: Some(Arc::new(sentry::transports::DefaultTransportFactory)),
            ..Default::default()
        }))
    }
}
