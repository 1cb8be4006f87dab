use std::collections::HashSet;
use std::error::Error as StdError;

use sentry_core::parse_type_from_debug;
use sentry_core::protocol::{Exception, Stacktrace};

use crate::field::{ErrorValue, TracedError};
use crate::frames::FrameFilter;

/// How many errors of a single `source()` chain are reported at most.
pub const MAX_ERROR_DEPTH: usize = 10;

/// Turns accumulated errors into the exception list of an event.
///
/// The result is sorted oldest to newest: the root cause of the first logged
/// error comes first and the most recently logged error comes last. Errors
/// with the same message and type are only reported once, which together with
/// [`MAX_ERROR_DEPTH`] bounds the walk over self-referential chains.
pub(crate) fn exceptions_from_errors(
    errors: &[ErrorValue],
    attach_stacktraces: bool,
    filter: &FrameFilter,
) -> Vec<Exception> {
    if errors.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut exceptions = Vec::with_capacity(errors.len());

    for err in errors.iter().rev() {
        add_exceptions_from_error(&mut exceptions, &mut seen, err.as_error(), attach_stacktraces, filter);
    }

    if attach_stacktraces {
        if let Some(latest) = exceptions.first_mut() {
            if latest.stacktrace.is_none() {
                latest.stacktrace = filter.current_stacktrace();
            }
        }
    }

    exceptions.reverse();
    exceptions
}

fn add_exceptions_from_error(
    exceptions: &mut Vec<Exception>,
    seen: &mut HashSet<(String, String)>,
    err: &(dyn StdError + 'static),
    attach_stacktraces: bool,
    filter: &FrameFilter,
) {
    let mut current = Some(err);
    for _ in 0..MAX_ERROR_DEPTH {
        let Some(err) = current else {
            return;
        };

        let value = err.to_string();
        let ty = type_label(err, &value);
        if !seen.insert((value.clone(), ty.clone())) {
            return;
        }

        let stacktrace = if attach_stacktraces {
            extract_stacktrace(err).and_then(|stacktrace| filter.filter_stacktrace(stacktrace))
        } else {
            None
        };

        exceptions.push(Exception {
            ty,
            value: Some(value),
            stacktrace,
            ..Default::default()
        });

        current = err.source();
    }
}

/// The type name of an error as parsed from its `Debug` output.
///
/// The alternate form is used since `anyhow` only forwards to the wrapped
/// error there. Errors made from plain strings debug-print as their quoted
/// message and get the generic `Error` label.
fn type_label(err: &(dyn StdError + 'static), value: &str) -> String {
    let dbg = format!("{err:#?}");
    if dbg == format!("{value:?}") {
        "Error".to_owned()
    } else {
        parse_type_from_debug(&dbg).to_owned()
    }
}

fn extract_stacktrace(err: &(dyn StdError + 'static)) -> Option<Stacktrace> {
    err.downcast_ref::<TracedError>()
        .and_then(TracedError::stacktrace)
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use sentry_core::protocol::Frame;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectError;

    #[derive(Debug, thiserror::Error)]
    #[error("query failed")]
    struct QueryError(#[source] ConnectError);

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestError(#[source] QueryError);

    /// An error that names itself as its own cause.
    #[derive(Debug)]
    struct Ouroboros;

    impl fmt::Display for Ouroboros {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("eats its tail")
        }
    }

    impl StdError for Ouroboros {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(self)
        }
    }

    /// Two errors naming each other as their cause.
    #[derive(Debug)]
    struct Flip(bool);

    static PING: Flip = Flip(true);
    static PONG: Flip = Flip(false);

    impl fmt::Display for Flip {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(if self.0 { "ping" } else { "pong" })
        }
    }

    impl StdError for Flip {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(if self.0 { &PONG } else { &PING })
        }
    }

    /// A chain of `depth` distinct errors.
    #[derive(Debug)]
    struct Nested {
        depth: usize,
        inner: Option<Box<Nested>>,
    }

    impl Nested {
        fn new(depth: usize) -> Self {
            Nested {
                depth,
                inner: (depth > 0).then(|| Box::new(Nested::new(depth - 1))),
            }
        }
    }

    impl fmt::Display for Nested {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "level {}", self.depth)
        }
    }

    impl StdError for Nested {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.inner.as_deref().map(|inner| inner as &(dyn StdError + 'static))
        }
    }

    fn values(exceptions: &[Exception]) -> Vec<&str> {
        exceptions.iter().filter_map(|e| e.value.as_deref()).collect()
    }

    #[test]
    fn test_no_errors() {
        let filter = FrameFilter::new(None);
        assert!(exceptions_from_errors(&[], true, &filter).is_empty());
    }

    #[test]
    fn test_chain_is_sorted_oldest_first() {
        let filter = FrameFilter::new(None);
        let errors = [ErrorValue::new(RequestError(QueryError(ConnectError)))];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(values(&exceptions), ["connection refused", "query failed", "request failed"]);
        assert_eq!(exceptions[0].ty, "ConnectError");
        assert_eq!(exceptions[2].ty, "RequestError");
        assert!(exceptions.iter().all(|e| e.stacktrace.is_none()));
    }

    #[test]
    fn test_latest_logged_error_comes_last() {
        let filter = FrameFilter::new(None);
        let errors = [
            ErrorValue::new(QueryError(ConnectError)),
            ErrorValue::new(Nested::new(0)),
        ];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(values(&exceptions), ["connection refused", "query failed", "level 0"]);
    }

    #[test]
    fn test_shared_causes_are_reported_once() {
        let filter = FrameFilter::new(None);
        let errors = [
            ErrorValue::new(QueryError(ConnectError)),
            ErrorValue::new(RequestError(QueryError(ConnectError))),
        ];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(values(&exceptions), ["connection refused", "query failed", "request failed"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let filter = FrameFilter::new(None);
        let errors = [ErrorValue::new(Ouroboros), ErrorValue::new(Ouroboros)];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(values(&exceptions), ["eats its tail"]);
    }

    #[test]
    fn test_mutual_cycles_terminate() {
        let filter = FrameFilter::new(None);
        let errors = [ErrorValue::new(Flip(true))];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(values(&exceptions), ["pong", "ping"]);
        assert!(exceptions.iter().all(|e| e.ty == "Flip"));
    }

    #[test]
    fn test_string_errors_are_labelled_error() {
        let filter = FrameFilter::new(None);
        let errors = [
            ErrorValue::from_boxed("connection reset".into()),
            ErrorValue::new(TracedError::new("read timed out")),
        ];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(values(&exceptions), ["connection reset", "read timed out"]);
        assert!(exceptions.iter().all(|e| e.ty == "Error"));
    }

    #[cfg(feature = "anyhow")]
    #[test]
    fn test_anyhow_errors_keep_type_and_backtrace() {
        use std::backtrace::BacktraceStatus;

        std::env::set_var("RUST_LIB_BACKTRACE", "1");
        let filter = FrameFilter::new(None);
        let err = anyhow::Error::new(QueryError(ConnectError));
        assert_eq!(err.backtrace().status(), BacktraceStatus::Captured);

        let errors = [
            ErrorValue::from_anyhow(err),
            ErrorValue::from_anyhow(anyhow::anyhow!("plain message")),
        ];
        let exceptions = exceptions_from_errors(&errors, true, &filter);

        let types: Vec<_> = exceptions.iter().map(|e| e.ty.as_str()).collect();
        assert_eq!(types, ["ConnectError", "QueryError", "Error"]);
        assert_eq!(values(&exceptions), ["connection refused", "query failed", "plain message"]);

        let frames = &exceptions[1].stacktrace.as_ref().unwrap().frames;
        assert!(!frames.is_empty());
        assert!(frames
            .iter()
            .filter_map(|frame| frame.function.as_deref())
            .all(|function| !function.starts_with("backtrace::")));
    }

    #[test]
    fn test_depth_is_capped() {
        let filter = FrameFilter::new(None);
        let errors = [ErrorValue::new(Nested::new(25))];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert_eq!(exceptions.len(), MAX_ERROR_DEPTH);
        assert_eq!(exceptions.last().unwrap().value.as_deref(), Some("level 25"));

        let mut pairs: Vec<_> = exceptions.iter().map(|e| (&e.ty, &e.value)).collect();
        pairs.dedup();
        assert_eq!(pairs.len(), MAX_ERROR_DEPTH);
    }

    #[test]
    fn test_traced_errors_keep_their_trace() {
        let filter = FrameFilter::new(None);
        let stacktrace = Stacktrace {
            frames: vec![
                Frame {
                    function: Some("myapp::db::connect".into()),
                    ..Default::default()
                },
                Frame {
                    function: Some("sentry_logcore::field::TracedError::new".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let errors = [ErrorValue::new(TracedError::with_stacktrace(
            QueryError(ConnectError),
            Some(stacktrace),
        ))];

        let exceptions = exceptions_from_errors(&errors, true, &filter);
        assert_eq!(exceptions.len(), 2);
        assert_eq!(exceptions[1].ty, "QueryError");

        let frames = &exceptions[1].stacktrace.as_ref().unwrap().frames;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function.as_deref(), Some("myapp::db::connect"));
    }

    #[test]
    fn test_disabled_stacktraces_skip_embedded_traces() {
        let filter = FrameFilter::new(None);
        let stacktrace = Stacktrace {
            frames: vec![Frame {
                function: Some("myapp::main".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let errors = [ErrorValue::new(TracedError::with_stacktrace(ConnectError, Some(stacktrace)))];

        let exceptions = exceptions_from_errors(&errors, false, &filter);
        assert!(exceptions[0].stacktrace.is_none());
    }
}
