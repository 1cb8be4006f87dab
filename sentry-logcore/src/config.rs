use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::frames::FrameMatcher;
use crate::level::{Level, LevelEnabler};
use crate::scope::Scope;

/// Breadcrumbs kept per scope when [`Configuration::max_breadcrumbs`] is zero.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 1000;

/// Flush timeout used when [`Configuration::flush_timeout`] is unset or zero.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration of a [`SentryCore`](crate::SentryCore).
///
/// # Examples
///
/// ```
/// use sentry_logcore::{Configuration, Level};
///
/// let config = Configuration::new(Level::Error)
///     .breadcrumbs(Level::Info)
///     .tag("component", "system");
/// # let _ = config;
/// ```
#[derive(Clone)]
pub struct Configuration {
    /// Records at or above this level are reported as events. (defaults to `Error`)
    pub level: Arc<dyn LevelEnabler>,
    /// Records at or above this level are recorded as breadcrumbs when
    /// `enable_breadcrumbs` is set. (defaults to `Info`)
    pub breadcrumb_level: Arc<dyn LevelEnabler>,
    /// Whether breadcrumbs are recorded at all. (defaults to `false`)
    pub enable_breadcrumbs: bool,
    /// Only record breadcrumbs when a scope was attached through a field
    /// such as [`new_scope`](crate::new_scope). The configured `scope` does
    /// not count. (defaults to `true`)
    pub breadcrumbs_require_scope: bool,
    /// Maximum number of breadcrumbs per scope; zero selects
    /// [`DEFAULT_MAX_BREADCRUMBS`].
    pub max_breadcrumbs: usize,
    /// Never capture or attach stack traces.
    pub disable_stacktrace: bool,
    /// Tags added to every event.
    pub tags: BTreeMap<String, String>,
    /// Extra frames to remove from stack traces, on top of the adapter's own.
    pub frame_matcher: Option<Arc<dyn FrameMatcher>>,
    /// How long a fatal-class record may block while flushing.
    pub flush_timeout: Option<Duration>,
    /// The scope used when the logger has none of its own.
    pub scope: Option<Arc<Scope>>,
    /// Records the logger name as extra data under this key.
    pub logger_name_key: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            level: Arc::new(Level::Error),
            breadcrumb_level: Arc::new(Level::Info),
            enable_breadcrumbs: false,
            breadcrumbs_require_scope: true,
            max_breadcrumbs: 0,
            disable_stacktrace: false,
            tags: BTreeMap::new(),
            frame_matcher: None,
            flush_timeout: None,
            scope: None,
            logger_name_key: None,
        }
    }
}

impl Configuration {
    /// Creates a configuration reporting records at or above `level`.
    pub fn new<L: LevelEnabler + 'static>(level: L) -> Self {
        Configuration {
            level: Arc::new(level),
            ..Default::default()
        }
    }

    /// Enables breadcrumbs for records at or above `level`.
    #[must_use]
    pub fn breadcrumbs<L: LevelEnabler + 'static>(mut self, level: L) -> Self {
        self.breadcrumb_level = Arc::new(level);
        self.enable_breadcrumbs = true;
        self
    }

    /// Adds a static tag.
    #[must_use]
    pub fn tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the extra frame matcher.
    #[must_use]
    pub fn frame_matcher<M: FrameMatcher + 'static>(mut self, matcher: M) -> Self {
        self.frame_matcher = Some(Arc::new(matcher));
        self
    }

    /// The effective breadcrumb limit.
    pub fn effective_max_breadcrumbs(&self) -> usize {
        match self.max_breadcrumbs {
            0 => DEFAULT_MAX_BREADCRUMBS,
            max => max,
        }
    }

    /// The effective flush timeout.
    pub fn effective_flush_timeout(&self) -> Duration {
        match self.flush_timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => DEFAULT_FLUSH_TIMEOUT,
        }
    }

    /// The logger name key, if one is set and not empty.
    pub fn effective_logger_name_key(&self) -> Option<&str> {
        self.logger_name_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Checks that breadcrumbs can actually be recorded below the report level.
    pub fn validate(&self) -> Result<(), Error> {
        let breadcrumb = self.breadcrumb_level.level();
        let report = self.level.level();
        if self.enable_breadcrumbs && breadcrumb > report {
            return Err(Error::InvalidBreadcrumbLevel { breadcrumb, report });
        }
        Ok(())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct FrameMatcher;
        let frame_matcher = self.frame_matcher.as_ref().map(|_| FrameMatcher);

        f.debug_struct("Configuration")
            .field("level", &self.level.level())
            .field("breadcrumb_level", &self.breadcrumb_level.level())
            .field("enable_breadcrumbs", &self.enable_breadcrumbs)
            .field("breadcrumbs_require_scope", &self.breadcrumbs_require_scope)
            .field("max_breadcrumbs", &self.max_breadcrumbs)
            .field("disable_stacktrace", &self.disable_stacktrace)
            .field("tags", &self.tags)
            .field("frame_matcher", &frame_matcher)
            .field("flush_timeout", &self.flush_timeout)
            .field("scope", &self.scope.is_some())
            .field("logger_name_key", &self.logger_name_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::AtomicLevel;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();
        assert_eq!(config.level.level(), Level::Error);
        assert_eq!(config.effective_max_breadcrumbs(), DEFAULT_MAX_BREADCRUMBS);
        assert_eq!(config.effective_flush_timeout(), DEFAULT_FLUSH_TIMEOUT);
        assert_eq!(config.effective_logger_name_key(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Configuration {
            max_breadcrumbs: 5,
            flush_timeout: Some(Duration::from_millis(250)),
            logger_name_key: Some("logger".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_max_breadcrumbs(), 5);
        assert_eq!(config.effective_flush_timeout(), Duration::from_millis(250));
        assert_eq!(config.effective_logger_name_key(), Some("logger"));

        let config = Configuration {
            flush_timeout: Some(Duration::ZERO),
            logger_name_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.effective_flush_timeout(), DEFAULT_FLUSH_TIMEOUT);
        assert_eq!(config.effective_logger_name_key(), None);
    }

    #[test]
    fn test_breadcrumb_level_above_report_level() {
        let config = Configuration::new(AtomicLevel::new(Level::Error)).breadcrumbs(AtomicLevel::new(Level::Panic));
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidBreadcrumbLevel {
                breadcrumb: Level::Panic,
                report: Level::Error,
            })
        ));

        // only checked when breadcrumbs are enabled
        let config = Configuration {
            breadcrumb_level: Arc::new(Level::Panic),
            ..Configuration::new(Level::Error)
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_output() {
        let config = Configuration::new(Level::Warn).tag("component", "system");
        let debug = format!("{:?}", config);
        assert!(debug.contains("level: Warn"));
        assert!(debug.contains("component"));
    }
}
