//! Reports structured log records to Sentry.
//!
//! A [`SentryCore`] is a logging [`Core`]: records at or above a
//! configurable level are turned into Sentry events carrying the record's
//! fields as extra data, its tags and the exceptions of every error attached
//! to it. With breadcrumbs enabled, lower-level records are kept on a
//! [`Scope`] and show up on the next event captured with that scope.
//!
//! Fields attached to a logger with [`Logger::with`] accumulate immutably,
//! so sibling loggers derived from the same parent never see each other's
//! data. A few field constructors carry special meaning:
//!
//! - [`tag`] becomes an event tag instead of extra data.
//! - [`context`] becomes a structured event context.
//! - [`Field::error`] becomes an exception, including its `source()` chain.
//! - [`new_scope`] and [`with_scope`] direct breadcrumbs to a scope of their own.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use sentry_core::test::TestTransport;
//! use sentry_logcore::{client_from_client, new_scope, Configuration, Field, Level, Logger, SentryCore};
//!
//! let transport = TestTransport::new();
//! let client = sentry_core::Client::from(sentry_core::ClientOptions {
//!     dsn: Some("https://public@sentry.invalid/1".parse().unwrap()),
//!     transport: Some(Arc::new(transport.clone())),
//!     ..Default::default()
//! });
//!
//! let cfg = Configuration::new(Level::Error)
//!     .breadcrumbs(Level::Info)
//!     .tag("component", "system");
//! let core = SentryCore::new(cfg, client_from_client(client)).unwrap();
//!
//! // keep the regular output and report to Sentry as well
//! let logger = Logger::default().attach(core.into_core()).with(&[new_scope()]);
//! logger.info("starting request", &[Field::new("path", "/")]);
//! logger.error("request failed", &[Field::new("status", 500)]);
//!
//! let events = transport.fetch_and_clear_events();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].tags["component"], "system");
//! ```
//!
//! # Features
//!
//! - `transport`: enables [`client_from_dsn`], which sends events over HTTP.
//! - `anyhow`: enables [`ErrorValue::from_anyhow`], which keeps the
//!   backtrace captured by `anyhow`.
//! - `test`: enables the [`test`] module.

#![warn(missing_docs)]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

mod accumulator;
mod config;
mod converters;
mod core;
mod error;
mod exceptions;
mod field;
mod frames;
mod level;
mod logger;
mod scope;
mod sink;

pub use crate::config::{Configuration, DEFAULT_FLUSH_TIMEOUT, DEFAULT_MAX_BREADCRUMBS};
pub use crate::converters::{breadcrumb_from_record, event_from_record};
pub use crate::core::{new_core, new_core_or_nop, BoxError, Core, NopCore, Record, SentryCore, Tee};
pub use crate::error::Error;
pub use crate::exceptions::MAX_ERROR_DEPTH;
pub use crate::field::{
    context, new_scope, tag, with_scope, ErrorValue, Field, FieldSet, FieldValue, TracedError, ERROR_KEY,
    SCOPE_KEY,
};
pub use crate::frames::{
    combine_frame_matchers, skip_function_prefix, skip_module_prefix, FrameMatcher, FrameMatchers,
    SkipFunctionPrefix, SkipModulePrefix,
};
pub use crate::level::{convert_level, AtomicLevel, Level, LevelEnabler, ParseLevelError};
pub use crate::logger::Logger;
pub use crate::scope::Scope;
#[cfg(feature = "transport")]
pub use crate::sink::client_from_dsn;
pub use crate::sink::{client_from_client, client_from_options, Hint, Sink};
