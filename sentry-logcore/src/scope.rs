use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use once_cell::sync::Lazy;
use sentry_core::protocol::{Breadcrumb, Event};

static GLOBAL_SCOPE: Lazy<Arc<Scope>> = Lazy::new(|| Arc::new(Scope::new()));

/// Holds breadcrumbs and tags for a unit of work.
///
/// A scope is owned by the caller and shared with loggers through
/// [`with_scope`](crate::with_scope) or
/// [`Configuration::scope`](crate::Configuration::scope). Breadcrumbs are kept
/// in a bounded buffer: once the limit passed to
/// [`add_breadcrumb`](Self::add_breadcrumb) is exceeded the oldest entries are
/// evicted first.
///
/// All methods take `&self`; appends from concurrent log calls are serialized
/// by an internal lock.
#[derive(Debug, Default)]
pub struct Scope {
    breadcrumbs: Mutex<VecDeque<Breadcrumb>>,
    tags: RwLock<BTreeMap<String, String>>,
}

impl Scope {
    /// Creates a new, empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide ambient scope.
    ///
    /// It is created on first use and lives until the process exits. Loggers
    /// fall back to it when neither a field nor the configuration supplied a
    /// scope.
    pub fn global() -> Arc<Scope> {
        GLOBAL_SCOPE.clone()
    }

    /// Appends a breadcrumb, keeping at most `limit` entries.
    pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb, limit: usize) {
        let mut breadcrumbs = self.breadcrumbs.lock().unwrap_or_else(PoisonError::into_inner);
        breadcrumbs.push_back(breadcrumb);
        while breadcrumbs.len() > limit {
            breadcrumbs.pop_front();
        }
    }

    /// Returns a copy of the recorded breadcrumbs, oldest first.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let breadcrumbs = self.breadcrumbs.lock().unwrap_or_else(PoisonError::into_inner);
        breadcrumbs.iter().cloned().collect()
    }

    /// Deletes all recorded breadcrumbs.
    pub fn clear_breadcrumbs(&self) {
        self.breadcrumbs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Sets a tag to a specific value.
    pub fn set_tag<V: ToString>(&self, key: &str, value: V) {
        self.tags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_string());
    }

    /// Removes a tag.
    ///
    /// If the tag is not set, does nothing.
    pub fn remove_tag(&self, key: &str) {
        self.tags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Returns a copy of the tags.
    pub fn tags(&self) -> BTreeMap<String, String> {
        self.tags.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Applies the contained scoped data to fill an event.
    ///
    /// Breadcrumbs are appended; tags only fill keys the event does not
    /// already carry.
    pub fn apply_to_event(&self, mut event: Event<'static>) -> Event<'static> {
        event.breadcrumbs.extend(self.breadcrumbs());

        let tags = self.tags.read().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in tags.iter() {
            event
                .tags
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        event
    }
}

/// Picks the scope that receives breadcrumbs and events.
///
/// A scope attached through a field wins over the configured one, which wins
/// over the process-wide default.
pub(crate) fn resolve_scope(local: Option<&Arc<Scope>>, configured: Option<&Arc<Scope>>) -> Arc<Scope> {
    match local.or(configured) {
        Some(scope) => scope.clone(),
        None => Scope::global(),
    }
}
