use sentry_core::protocol::{Breadcrumb, Event, Map, Value};

use crate::core::Record;
use crate::level::convert_level;

/// Creates a [`Breadcrumb`] from a [`Record`] and its field snapshot.
pub fn breadcrumb_from_record(record: &Record, data: Map<String, Value>) -> Breadcrumb {
    Breadcrumb {
        timestamp: record.timestamp,
        ty: "log".into(),
        category: record.logger_name.clone(),
        level: convert_level(record.level),
        message: Some(record.message.clone()),
        data,
    }
}

/// Creates a plain message [`Event`] from a [`Record`].
///
/// Extra data, tags and exceptions are filled in by the
/// [`SentryCore`](crate::SentryCore) writing the record.
pub fn event_from_record(record: &Record) -> Event<'static> {
    Event {
        logger: record.logger_name.clone(),
        level: convert_level(record.level),
        message: Some(record.message.clone()),
        timestamp: record.timestamp,
        ..Default::default()
    }
}
