use crate::level::Level;

/// Errors returned while setting up a [`SentryCore`](crate::SentryCore).
///
/// Nothing on the logging path itself returns these; capture and flush
/// problems stay inside the sink.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Breadcrumbs were enabled with a threshold above the report threshold.
    #[error("breadcrumb level ({breadcrumb}) must not be above the report level ({report})")]
    InvalidBreadcrumbLevel {
        /// The configured breadcrumb threshold.
        breadcrumb: Level,
        /// The configured report threshold.
        report: Level,
    },
    /// The client factory failed.
    #[error("failed to create the sentry client")]
    ClientFactory(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}
